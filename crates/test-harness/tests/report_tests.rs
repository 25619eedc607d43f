//! Tests for text and JSON model reports.

use test_harness::tutorials::{tutorial_1, tutorial_2};
use test_harness::ModelReport;

#[test]
fn report_for_tutorial_1() {
    let m = tutorial_1().unwrap();
    let report = ModelReport::generate(m.model()).unwrap();
    let text = report.to_text();
    assert!(text.contains("=== Model Report: \"t1\" ==="));
    assert!(text.contains("Entities: 4 points, 4 curves, 1 surfaces, 0 volumes"));
    assert!(text.contains("(2, 1) \"My surface\": [1]"));
    assert!(text.contains("(1, 5): [1, 2, 4]"));
    assert!(text.contains("Bounding Box: (0.000, 0.000, 0.000) -> (0.100, 0.500, 0.000)"));
    assert!(!text.contains("[FAIL]"));
}

#[test]
fn report_for_tutorial_2_lists_volumes() {
    let (m, _) = tutorial_2().unwrap();
    let report = ModelReport::generate(m.model()).unwrap();
    assert_eq!(report.volumes.len(), 2);
    assert!(report.volumes.iter().all(|v| v.shells == vec![(8, 12, 6)]));
    let text = format!("{report}");
    assert!(text.contains("[129] shell 0: V=8 E=12 F=6 | Euler V-E+F=2 (OK)"));
    assert!(text.contains("\"The volume\""));
}

#[test]
fn report_json_round_trips_counts() {
    let m = tutorial_1().unwrap();
    let json = ModelReport::generate(m.model()).unwrap().to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["counts"], serde_json::json!([4, 4, 1, 0]));
    assert_eq!(value["model_name"], "t1");
}
