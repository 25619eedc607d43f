//! Structured text model reports.
//!
//! Reports are plain text first; [`ModelReport::to_json`] exists for tools
//! that want to diff them.

use std::fmt;

use brep_kernel::{Dim, Model};
use serde::Serialize;

use crate::helpers::HarnessError;
use crate::oracle::{self, OracleVerdict};

/// A complete model report with all sections.
#[derive(Debug, Clone, Serialize)]
pub struct ModelReport {
    pub model_name: String,
    /// Entity counts for points, curves, surfaces and volumes.
    pub counts: [usize; 4],
    pub groups: Vec<GroupEntry>,
    pub volumes: Vec<VolumeEntry>,
    pub bounding_box: Option<([f64; 3], [f64; 3])>,
    #[serde(skip)]
    pub oracle_results: Vec<OracleVerdict>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupEntry {
    pub dim: i32,
    pub tag: i32,
    pub name: Option<String>,
    pub members: Vec<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VolumeEntry {
    pub tag: i32,
    /// (V, E, F) per shell, outer shell first.
    pub shells: Vec<(usize, usize, usize)>,
}

impl ModelReport {
    /// Build a report of `model`. The bounding box needs a synchronized
    /// model and is left out otherwise.
    pub fn generate(model: &Model) -> Result<Self, HarnessError> {
        let reg = model.registry();
        let counts = Dim::ALL.map(|d| reg.count(d));

        let groups = model
            .physical_groups(None)
            .into_iter()
            .map(|id| {
                Ok(GroupEntry {
                    dim: id.dim.index(),
                    tag: id.tag,
                    name: model.physical_name(id.dim, id.tag)?.map(str::to_string),
                    members: model.physical_group_members(id.dim, id.tag)?,
                })
            })
            .collect::<Result<Vec<_>, HarnessError>>()?;

        let volumes = reg
            .tags(Dim::Volume)
            .into_iter()
            .map(|t| {
                let audit = model.audit_volume(t)?;
                Ok(VolumeEntry {
                    tag: t,
                    shells: audit
                        .shells
                        .iter()
                        .map(|s| (s.vertices, s.edges, s.faces))
                        .collect(),
                })
            })
            .collect::<Result<Vec<_>, HarnessError>>()?;

        let bounding_box = match model.geo() {
            Ok(geo) => {
                let mut bb = brep_kernel::BoundingBox::empty();
                for e in geo.get_entities(Some(Dim::Point)) {
                    let b = geo.get_bounding_box(e)?;
                    bb.expand_to_include(&b.min);
                    bb.expand_to_include(&b.max);
                }
                for e in geo.get_entities(Some(Dim::Curve)) {
                    let b = geo.get_bounding_box(e)?;
                    bb.expand_to_include(&b.min);
                    bb.expand_to_include(&b.max);
                }
                bb.is_valid().then(|| (bb.min.to_array(), bb.max.to_array()))
            }
            Err(_) => None,
        };

        Ok(Self {
            model_name: model.name().to_string(),
            counts,
            groups,
            volumes,
            bounding_box,
            oracle_results: oracle::run_all_oracles(model),
        })
    }

    /// Format the report as text.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("=== Model Report: \"{}\" ===\n\n", self.model_name));

        let [p, c, s, v] = self.counts;
        out.push_str(&format!(
            "Entities: {p} points, {c} curves, {s} surfaces, {v} volumes\n"
        ));

        if !self.volumes.is_empty() {
            out.push_str("\nVolumes:\n");
            for vol in &self.volumes {
                for (i, (v, e, f)) in vol.shells.iter().enumerate() {
                    let euler = *v as i64 - *e as i64 + *f as i64;
                    let status = if euler == 2 { "OK" } else { "WARN" };
                    out.push_str(&format!(
                        "  [{}] shell {}: V={} E={} F={} | Euler V-E+F={} ({})\n",
                        vol.tag, i, v, e, f, euler, status,
                    ));
                }
            }
        }

        if !self.groups.is_empty() {
            out.push_str("\nPhysical Groups:\n");
            for g in &self.groups {
                let name = g.name.as_deref().map(|n| format!(" \"{n}\"")).unwrap_or_default();
                out.push_str(&format!(
                    "  ({}, {}){}: {:?}\n",
                    g.dim, g.tag, name, g.members
                ));
            }
        }

        if let Some((min, max)) = self.bounding_box {
            out.push_str(&format!(
                "\nBounding Box: ({:.3}, {:.3}, {:.3}) -> ({:.3}, {:.3}, {:.3})\n",
                min[0], min[1], min[2], max[0], max[1], max[2],
            ));
        }

        if !self.oracle_results.is_empty() {
            out.push_str(&format!(
                "\nOracle Results ({} checks):\n",
                self.oracle_results.len()
            ));
            for v in &self.oracle_results {
                let status = if v.passed { "PASS" } else { "FAIL" };
                out.push_str(&format!("  [{}] {}: {}\n", status, v.oracle_name, v.detail));
            }
        }

        out
    }

    pub fn to_json(&self) -> Result<String, HarnessError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for ModelReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_text())
    }
}
