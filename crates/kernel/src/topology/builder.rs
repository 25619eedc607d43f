//! Construction of elementary entities and loops, with the structural checks
//! that must pass before anything is registered.

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, instrument, warn};

use super::entity::{Sense, Tag, TagSpace};
use super::registry::*;
use crate::config::ModelConfig;
use crate::error::{ModelError, Result};
use crate::geometry::curves::arc_sweep;
use crate::geometry::point::Point3d;
use crate::geometry::surfaces::{PlaneFrame, newell_normal};

/// Curve families accepted by [`add_curve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveType {
    /// Two points: start, end.
    Line,
    /// Three points: start, center, end.
    CircleArc,
    /// Two or more points interpolated in order.
    Spline,
}

pub(crate) fn check_mesh_size(size: f64) -> Result<()> {
    if size.is_finite() && size > 0.0 {
        Ok(())
    } else {
        Err(ModelError::invalid(format!(
            "mesh size must be finite and positive, got {size}"
        )))
    }
}

fn unsigned(tag: Tag) -> Result<Tag> {
    match tag.checked_abs() {
        Some(t) if t > 0 => Ok(t),
        _ => Err(ModelError::InvalidTag { tag }),
    }
}

// ─── Points & Curves ─────────────────────────────────────────────────────────

#[instrument(skip(reg))]
pub fn add_point(
    reg: &mut EntityRegistry,
    position: Point3d,
    mesh_size: Option<f64>,
    tag: Option<Tag>,
) -> Result<PointId> {
    if !position.is_finite() {
        return Err(ModelError::invalid("point coordinates must be finite"));
    }
    if let Some(size) = mesh_size {
        check_mesh_size(size)?;
    }
    let tag = reg.claim_tag(TagSpace::Point, tag)?;
    let id = reg.insert_point(Point {
        tag,
        position,
        mesh_size,
    });
    debug!(tag, "added point");
    Ok(id)
}

/// Add a curve of `kind` through the points tagged `points`.
#[instrument(skip(reg, config))]
pub fn add_curve(
    reg: &mut EntityRegistry,
    kind: CurveType,
    points: &[Tag],
    tag: Option<Tag>,
    config: &ModelConfig,
) -> Result<CurveId> {
    let ids = points
        .iter()
        .map(|t| reg.point_id(*t))
        .collect::<Result<Vec<_>>>()?;
    let arity_error = |expected: &str| {
        ModelError::invalid(format!(
            "{kind:?} needs {expected} points, got {}",
            ids.len()
        ))
    };
    let (curve_kind, start, end) = match kind {
        CurveType::Line => match ids.as_slice() {
            [a, b] => (CurveKind::Line, *a, *b),
            _ => return Err(arity_error("2")),
        },
        CurveType::CircleArc => match ids.as_slice() {
            [a, c, b] => (CurveKind::CircleArc { center: *c }, *a, *b),
            _ => return Err(arity_error("3")),
        },
        CurveType::Spline => match ids.as_slice() {
            [a, interior @ .., b] => (
                CurveKind::Spline {
                    interior: interior.to_vec(),
                },
                *a,
                *b,
            ),
            _ => return Err(arity_error("at least 2")),
        },
    };
    create_curve(reg, curve_kind, start, end, tag, config)
}

pub(crate) fn create_curve(
    reg: &mut EntityRegistry,
    kind: CurveKind,
    start: PointId,
    end: PointId,
    requested: Option<Tag>,
    config: &ModelConfig,
) -> Result<CurveId> {
    match &kind {
        CurveKind::Line if start == end => {
            return Err(ModelError::invalid("line start and end are the same point"));
        }
        CurveKind::CircleArc { center } => {
            let sweep = arc_sweep(
                &reg.position(start),
                &reg.position(*center),
                &reg.position(end),
                config.tolerance.coincidence,
            );
            if sweep.is_none() {
                return Err(ModelError::invalid(
                    "circle arc must sweep strictly between 0 and pi around a distinct center",
                ));
            }
        }
        _ => {}
    }
    let tag = reg.claim_tag(TagSpace::Curve, requested)?;
    let id = reg.insert_curve(Curve {
        tag,
        kind,
        start,
        end,
    });
    debug!(tag, "added curve");
    Ok(id)
}

// ─── Curve Loops & Surfaces ──────────────────────────────────────────────────

/// Add a closed loop of signed curve tags; a negative tag traverses the
/// curve from its end to its start.
#[instrument(skip(reg))]
pub fn add_curve_loop(
    reg: &mut EntityRegistry,
    signed_curves: &[Tag],
    tag: Option<Tag>,
) -> Result<CurveLoopId> {
    let curves = signed_curves
        .iter()
        .map(|&t| {
            Ok(OrientedCurve {
                curve: reg.curve_id(unsigned(t)?)?,
                sense: Sense::of(t),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    create_curve_loop(reg, curves, tag)
}

pub(crate) fn create_curve_loop(
    reg: &mut EntityRegistry,
    curves: Vec<OrientedCurve>,
    requested: Option<Tag>,
) -> Result<CurveLoopId> {
    check_loop_closed(reg, &curves)?;
    let tag = reg.claim_tag(TagSpace::CurveLoop, requested)?;
    let id = reg.insert_curve_loop(CurveLoop { tag, curves });
    debug!(tag, "added curve loop");
    Ok(id)
}

fn check_loop_closed(reg: &EntityRegistry, curves: &[OrientedCurve]) -> Result<()> {
    if curves.is_empty() {
        return Err(ModelError::invalid("curve loop needs at least one curve"));
    }
    let n = curves.len();
    for i in 0..n {
        let (_, end) = reg.oriented_endpoints(curves[i]);
        let (start, _) = reg.oriented_endpoints(curves[(i + 1) % n]);
        if end != start {
            return Err(ModelError::OpenLoop {
                from: reg.signed_tag(curves[i]),
                to: reg.signed_tag(curves[(i + 1) % n]),
            });
        }
    }
    Ok(())
}

/// Add a plane surface: the first loop is the outer boundary, the rest are
/// holes.
#[instrument(skip(reg, config))]
pub fn add_plane_surface(
    reg: &mut EntityRegistry,
    loops: &[Tag],
    tag: Option<Tag>,
    config: &ModelConfig,
) -> Result<SurfaceId> {
    let ids = loops
        .iter()
        .map(|t| reg.curve_loop_id(unsigned(*t)?))
        .collect::<Result<Vec<_>>>()?;
    let Some((outer, holes)) = ids.split_first() else {
        return Err(ModelError::invalid("plane surface needs an outer curve loop"));
    };
    create_surface(reg, SurfaceKind::Plane, *outer, holes.to_vec(), tag, config)
}

/// Add a transfinite surface over a three- or four-sided loop.
#[instrument(skip(reg, config))]
pub fn add_surface_filling(
    reg: &mut EntityRegistry,
    curve_loop: Tag,
    tag: Option<Tag>,
    config: &ModelConfig,
) -> Result<SurfaceId> {
    let outer = reg.curve_loop_id(unsigned(curve_loop)?)?;
    create_surface(reg, SurfaceKind::Filling, outer, Vec::new(), tag, config)
}

pub(crate) fn create_surface(
    reg: &mut EntityRegistry,
    kind: SurfaceKind,
    outer: CurveLoopId,
    holes: Vec<CurveLoopId>,
    requested: Option<Tag>,
    config: &ModelConfig,
) -> Result<SurfaceId> {
    match kind {
        SurfaceKind::Plane => check_plane_boundary(reg, outer, &holes, config)?,
        SurfaceKind::Filling => {
            let sides = reg.curve_loop(outer).curves.len();
            if !holes.is_empty() || !(3..=4).contains(&sides) {
                return Err(ModelError::invalid(format!(
                    "surface filling needs one loop of 3 or 4 curves, got {sides} curves and {} holes",
                    holes.len()
                )));
            }
        }
    }
    let tag = reg.claim_tag(TagSpace::Surface, requested)?;
    let id = reg.insert_surface(Surface {
        tag,
        kind,
        outer,
        holes,
    });
    debug!(tag, ?kind, "added surface");
    Ok(id)
}

fn check_plane_boundary(
    reg: &EntityRegistry,
    outer: CurveLoopId,
    holes: &[CurveLoopId],
    config: &ModelConfig,
) -> Result<()> {
    let tol = config.tolerance.coincidence;
    let outer_poly = reg.loop_polyline(outer, config.curve_samples);
    let outer_tag = reg.curve_loop(outer).tag;

    if config.warn_non_planar {
        if let Some(frame) = PlaneFrame::from_boundary(&outer_poly, tol) {
            let deviation = std::iter::once(outer)
                .chain(holes.iter().copied())
                .map(|l| frame.max_deviation(&reg.loop_polyline(l, config.curve_samples)))
                .fold(0.0, f64::max);
            if deviation > tol {
                warn!(curve_loop = outer_tag, deviation, "plane surface boundary is not planar");
            }
        }
    }

    if config.check_hole_orientation {
        // Degenerate loops have no winding to compare.
        let Some(outer_normal) = newell_normal(&outer_poly).normalized(tol) else {
            return Ok(());
        };
        for hole in holes {
            let poly = reg.loop_polyline(*hole, config.curve_samples);
            if let Some(n) = newell_normal(&poly).normalized(tol) {
                if n.dot(&outer_normal) > 0.0 {
                    return Err(ModelError::OrientationMismatch {
                        outer: outer_tag,
                        hole: reg.curve_loop(*hole).tag,
                    });
                }
            }
        }
    }
    Ok(())
}

// ─── Surface Loops & Volumes ─────────────────────────────────────────────────

/// Add a closed shell of surfaces.
#[instrument(skip(reg))]
pub fn add_surface_loop(
    reg: &mut EntityRegistry,
    surfaces: &[Tag],
    tag: Option<Tag>,
) -> Result<SurfaceLoopId> {
    let ids = surfaces
        .iter()
        .map(|t| reg.surface_id(unsigned(*t)?))
        .collect::<Result<Vec<_>>>()?;
    create_surface_loop(reg, ids, tag)
}

pub(crate) fn create_surface_loop(
    reg: &mut EntityRegistry,
    surfaces: Vec<SurfaceId>,
    requested: Option<Tag>,
) -> Result<SurfaceLoopId> {
    check_shell_closed(reg, &surfaces)?;
    let tag = reg.claim_tag(TagSpace::SurfaceLoop, requested)?;
    let id = reg.insert_surface_loop(SurfaceLoop { tag, surfaces });
    debug!(tag, "added surface loop");
    Ok(id)
}

/// Every curve bounding a member surface must be used exactly twice across
/// the shell's curve loops.
fn check_shell_closed(reg: &EntityRegistry, surfaces: &[SurfaceId]) -> Result<()> {
    if surfaces.is_empty() {
        return Err(ModelError::invalid("surface loop needs at least one surface"));
    }
    let mut seen = HashSet::new();
    let mut uses: BTreeMap<Tag, usize> = BTreeMap::new();
    for s in surfaces {
        if !seen.insert(*s) {
            return Err(ModelError::invalid(format!(
                "surface {} listed twice in surface loop",
                reg.surface(*s).tag
            )));
        }
        for l in reg.surface(*s).loops() {
            for oc in &reg.curve_loop(l).curves {
                *uses.entry(reg.curve(oc.curve).tag).or_default() += 1;
            }
        }
    }
    match uses.into_iter().find(|(_, n)| *n != 2) {
        Some((curve, n)) => Err(ModelError::UnclosedShell { curve, uses: n }),
        None => Ok(()),
    }
}

/// Add a volume: the first surface loop is the outer shell, the rest are
/// cavities.
#[instrument(skip(reg))]
pub fn add_volume(
    reg: &mut EntityRegistry,
    shells: &[Tag],
    tag: Option<Tag>,
) -> Result<VolumeId> {
    let ids = shells
        .iter()
        .map(|t| reg.surface_loop_id(unsigned(*t)?))
        .collect::<Result<Vec<_>>>()?;
    let Some((outer, cavities)) = ids.split_first() else {
        return Err(ModelError::invalid("volume needs an outer surface loop"));
    };
    create_volume(reg, *outer, cavities.to_vec(), tag)
}

pub(crate) fn create_volume(
    reg: &mut EntityRegistry,
    outer: SurfaceLoopId,
    cavities: Vec<SurfaceLoopId>,
    requested: Option<Tag>,
) -> Result<VolumeId> {
    let mut seen = HashSet::new();
    for shell in std::iter::once(outer).chain(cavities.iter().copied()) {
        for s in &reg.surface_loop(shell).surfaces {
            if !seen.insert(*s) {
                return Err(ModelError::invalid(format!(
                    "surface {} bounds more than one shell of the volume",
                    reg.surface(*s).tag
                )));
            }
        }
    }
    let tag = reg.claim_tag(TagSpace::Volume, requested)?;
    let id = reg.insert_volume(Volume {
        tag,
        outer,
        cavities,
    });
    debug!(tag, "added volume");
    Ok(id)
}
