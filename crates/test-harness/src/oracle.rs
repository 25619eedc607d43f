//! Verification oracles: pure functions returning pass/fail verdicts.
//!
//! Each oracle returns an `OracleVerdict` with diagnostic detail, not panics.
//! This lets a scenario collect all failures in one pass.

use std::collections::{BTreeMap, HashSet};

use brep_kernel::{Dim, EntityRef, Model, Tag};

/// The result of a single oracle check.
#[derive(Debug, Clone)]
pub struct OracleVerdict {
    pub oracle_name: String,
    pub passed: bool,
    pub detail: String,
    pub value: Option<f64>,
}

impl OracleVerdict {
    fn pass(name: &str, detail: String) -> Self {
        Self {
            oracle_name: name.to_string(),
            passed: true,
            detail,
            value: None,
        }
    }

    fn pass_val(name: &str, detail: String, value: f64) -> Self {
        Self {
            oracle_name: name.to_string(),
            passed: true,
            detail,
            value: Some(value),
        }
    }

    fn fail(name: &str, detail: String) -> Self {
        Self {
            oracle_name: name.to_string(),
            passed: false,
            detail,
            value: None,
        }
    }

    fn fail_val(name: &str, detail: String, value: f64) -> Self {
        Self {
            oracle_name: name.to_string(),
            passed: false,
            detail,
            value: Some(value),
        }
    }
}

// ── Registry Oracles ────────────────────────────────────────────────────────

/// Every tag is strictly positive and unique within its dimension.
pub fn check_unique_tags(model: &Model) -> OracleVerdict {
    let mut problems = Vec::new();
    for dim in Dim::ALL {
        let tags = model.registry().tags(dim);
        let unique: HashSet<Tag> = tags.iter().copied().collect();
        if unique.len() != tags.len() {
            problems.push(format!("dim {} has duplicate tags", dim.index()));
        }
        if let Some(bad) = tags.iter().find(|t| **t <= 0) {
            problems.push(format!("dim {} has non-positive tag {bad}", dim.index()));
        }
    }
    if problems.is_empty() {
        OracleVerdict::pass("unique_tags", "all tags unique and positive".into())
    } else {
        OracleVerdict::fail("unique_tags", problems.join("; "))
    }
}

/// Every point mesh size is finite and positive.
pub fn check_mesh_sizes(model: &Model) -> OracleVerdict {
    let reg = model.registry();
    let bad: Vec<String> = reg
        .tags(Dim::Point)
        .into_iter()
        .filter_map(|t| {
            let size = reg.point(reg.point_id(t).ok()?).mesh_size?;
            (!(size.is_finite() && size > 0.0)).then(|| format!("point {t}: {size}"))
        })
        .collect();
    if bad.is_empty() {
        OracleVerdict::pass("mesh_sizes", "all mesh sizes positive".into())
    } else {
        OracleVerdict::fail("mesh_sizes", bad.join(", "))
    }
}

/// Every physical group member still exists at the group's dimension.
pub fn check_groups_resolve(model: &Model) -> OracleVerdict {
    let mut missing = Vec::new();
    for id in model.physical_groups(None) {
        let members = model.physical_group_members(id.dim, id.tag).unwrap_or_default();
        for m in members {
            if !model.registry().contains(EntityRef::new(id.dim, m)) {
                missing.push(format!("group ({}, {}) member {m}", id.dim.index(), id.tag));
            }
        }
    }
    if missing.is_empty() {
        OracleVerdict::pass("groups_resolve", "all group members exist".into())
    } else {
        OracleVerdict::fail("groups_resolve", missing.join(", "))
    }
}

// ── Topology Oracles ────────────────────────────────────────────────────────

/// Every curve loop ends where it starts, curve by curve.
pub fn check_loops_closed(model: &Model) -> OracleVerdict {
    let reg = model.registry();
    let mut open = Vec::new();
    for (tag, id) in reg.curve_loops() {
        let curves = &reg.curve_loop(id).curves;
        let n = curves.len();
        let closed = (0..n).all(|i| {
            let (_, end) = reg.oriented_endpoints(curves[i]);
            let (start, _) = reg.oriented_endpoints(curves[(i + 1) % n]);
            end == start
        });
        if !closed {
            open.push(tag.to_string());
        }
    }
    if open.is_empty() {
        OracleVerdict::pass("loops_closed", "all curve loops closed".into())
    } else {
        OracleVerdict::fail("loops_closed", format!("open curve loops: {}", open.join(", ")))
    }
}

/// Every bounding curve of every surface loop is used exactly twice.
pub fn check_shells_closed(model: &Model) -> OracleVerdict {
    let reg = model.registry();
    let mut leaks = Vec::new();
    for (tag, id) in reg.surface_loops() {
        let mut uses: BTreeMap<Tag, usize> = BTreeMap::new();
        for s in &reg.surface_loop(id).surfaces {
            for l in reg.surface(*s).loops() {
                for oc in &reg.curve_loop(l).curves {
                    *uses.entry(reg.curve(oc.curve).tag).or_default() += 1;
                }
            }
        }
        for (curve, n) in uses {
            if n != 2 {
                leaks.push(format!("surface loop {tag}: curve {curve} used {n}x"));
            }
        }
    }
    if leaks.is_empty() {
        OracleVerdict::pass("shells_closed", "all surface loops watertight".into())
    } else {
        OracleVerdict::fail("shells_closed", leaks.join("; "))
    }
}

/// Check Euler's formula V - E + F = 2 on every shell of a volume.
pub fn check_euler_formula(model: &Model, volume: Tag) -> OracleVerdict {
    let audit = match model.audit_volume(volume) {
        Ok(a) => a,
        Err(e) => return OracleVerdict::fail("euler_formula", e.to_string()),
    };
    let summary: Vec<String> = audit
        .shells
        .iter()
        .map(|s| {
            format!(
                "shell {}: V({}) - E({}) + F({}) = {}",
                s.surface_loop,
                s.vertices,
                s.edges,
                s.faces,
                s.euler_characteristic()
            )
        })
        .collect();
    let chi = audit
        .shells
        .first()
        .map_or(0.0, |s| s.euler_characteristic() as f64);
    if audit.all_spherical() {
        OracleVerdict::pass_val("euler_formula", summary.join("; "), chi)
    } else {
        OracleVerdict::fail_val("euler_formula", summary.join("; "), chi)
    }
}

// ── Composite ───────────────────────────────────────────────────────────────

/// Run every model-wide oracle plus the Euler check on each volume.
pub fn run_all_oracles(model: &Model) -> Vec<OracleVerdict> {
    let mut verdicts = vec![
        check_unique_tags(model),
        check_loops_closed(model),
        check_shells_closed(model),
        check_mesh_sizes(model),
        check_groups_resolve(model),
    ];
    for v in model.registry().tags(Dim::Volume) {
        verdicts.push(check_euler_formula(model, v));
    }
    verdicts
}
