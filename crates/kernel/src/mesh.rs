//! Hand-off to an external mesh generator.
//!
//! The kernel does not mesh. It flattens the synchronized model into a
//! [`MeshInput`] that a [`MeshGenerator`] consumes.

use serde::Serialize;

use crate::error::{ModelError, Result};
use crate::geometry::point::Point3d;
use crate::sync::GeoModel;
use crate::topology::entity::{Dim, Tag};
use crate::topology::registry::{CurveKind, SurfaceKind};

/// A mesher that consumes the finalized boundary representation.
pub trait MeshGenerator {
    type Output;

    /// Mesh up to dimension `dim`. Inconsistent input is reported as
    /// [`ModelError::MeshingFailed`]; the model is never repaired.
    fn generate(&mut self, input: &MeshInput, dim: Dim) -> Result<Self::Output>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeshPoint {
    pub tag: Tag,
    pub position: Point3d,
    pub mesh_size: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeshCurve {
    pub tag: Tag,
    pub kind: &'static str,
    /// Defining points: start, then arc center or spline interior, then end.
    pub points: Vec<Tag>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeshCurveLoop {
    pub tag: Tag,
    /// Signed curve tags in traversal order.
    pub curves: Vec<Tag>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeshSurface {
    pub tag: Tag,
    pub kind: &'static str,
    /// Outer loop first, then holes.
    pub curve_loops: Vec<Tag>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeshSurfaceLoop {
    pub tag: Tag,
    pub surfaces: Vec<Tag>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeshVolume {
    pub tag: Tag,
    /// Outer shell first, then cavities.
    pub surface_loops: Vec<Tag>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeshPhysicalGroup {
    pub dim: i32,
    pub tag: Tag,
    pub name: Option<String>,
    pub members: Vec<Tag>,
}

/// Flattened, tag-addressed snapshot of everything a mesher needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeshInput {
    pub points: Vec<MeshPoint>,
    pub curves: Vec<MeshCurve>,
    pub curve_loops: Vec<MeshCurveLoop>,
    pub surfaces: Vec<MeshSurface>,
    pub surface_loops: Vec<MeshSurfaceLoop>,
    pub volumes: Vec<MeshVolume>,
    pub physical_groups: Vec<MeshPhysicalGroup>,
}

impl MeshInput {
    pub fn from_geo(geo: &GeoModel) -> Result<Self> {
        let reg = geo.registry();

        let points = reg
            .tags(Dim::Point)
            .into_iter()
            .map(|t| {
                let p = reg.point(reg.point_id(t)?);
                Ok(MeshPoint {
                    tag: t,
                    position: p.position,
                    mesh_size: p.mesh_size,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let curves = reg
            .tags(Dim::Curve)
            .into_iter()
            .map(|t| {
                let c = reg.curve(reg.curve_id(t)?);
                Ok(MeshCurve {
                    tag: t,
                    kind: match c.kind {
                        CurveKind::Line => "Line",
                        CurveKind::CircleArc { .. } => "CircleArc",
                        CurveKind::Spline { .. } => "Spline",
                    },
                    points: c.defining_points().iter().map(|p| reg.point(*p).tag).collect(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let curve_loops = reg
            .curve_loops()
            .map(|(tag, id)| MeshCurveLoop {
                tag,
                curves: reg
                    .curve_loop(id)
                    .curves
                    .iter()
                    .map(|oc| reg.signed_tag(*oc))
                    .collect(),
            })
            .collect();

        let surfaces = reg
            .tags(Dim::Surface)
            .into_iter()
            .map(|t| {
                let s = reg.surface(reg.surface_id(t)?);
                Ok(MeshSurface {
                    tag: t,
                    kind: match s.kind {
                        SurfaceKind::Plane => "Plane",
                        SurfaceKind::Filling => "Filling",
                    },
                    curve_loops: s.loops().map(|l| reg.curve_loop(l).tag).collect(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let surface_loops = reg
            .surface_loops()
            .map(|(tag, id)| MeshSurfaceLoop {
                tag,
                surfaces: reg
                    .surface_loop(id)
                    .surfaces
                    .iter()
                    .map(|s| reg.surface(*s).tag)
                    .collect(),
            })
            .collect();

        let volumes = reg
            .tags(Dim::Volume)
            .into_iter()
            .map(|t| {
                let v = reg.volume(reg.volume_id(t)?);
                Ok(MeshVolume {
                    tag: t,
                    surface_loops: v.shells().map(|s| reg.surface_loop(s).tag).collect(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let physical_groups = geo
            .groups()
            .iter()
            .map(|(id, group)| MeshPhysicalGroup {
                dim: id.dim.index(),
                tag: id.tag,
                name: group.name.clone(),
                members: group
                    .member_keys()
                    .iter()
                    .map(|k| reg.entity_ref(*k).tag())
                    .collect(),
            })
            .collect();

        Ok(Self {
            points,
            curves,
            curve_loops,
            surfaces,
            surface_loops,
            volumes,
            physical_groups,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| ModelError::Serialization {
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelConfig;
    use crate::physical::PhysicalGroups;
    use crate::topology::EntityRegistry;
    use crate::topology::builder::*;

    fn triangle() -> (EntityRegistry, PhysicalGroups) {
        let cfg = ModelConfig::default();
        let mut reg = EntityRegistry::new();
        for (i, (x, y)) in [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)].iter().enumerate() {
            add_point(&mut reg, Point3d::new(*x, *y, 0.0), Some(0.2), Some(i as Tag + 1)).unwrap();
        }
        for i in 0..3 {
            let ends = [i + 1, (i + 1) % 3 + 1];
            add_curve(&mut reg, CurveType::Line, &ends, Some(i + 1), &cfg).unwrap();
        }
        add_curve_loop(&mut reg, &[1, 2, 3], Some(1)).unwrap();
        add_plane_surface(&mut reg, &[1], Some(1), &cfg).unwrap();
        let mut groups = PhysicalGroups::new();
        groups.add(&reg, Dim::Surface, &[1], Some(7), Some("plate")).unwrap();
        (reg, groups)
    }

    #[test]
    fn test_mesh_input_collects_everything() {
        let (reg, groups) = triangle();
        let geo = GeoModel::synchronize(&reg, &groups, &ModelConfig::default());
        let input = MeshInput::from_geo(&geo).unwrap();
        assert_eq!(input.points.len(), 3);
        assert_eq!(input.curves[0].points, vec![1, 2]);
        assert_eq!(input.curve_loops[0].curves, vec![1, 2, 3]);
        assert_eq!(input.surfaces[0].curve_loops, vec![1]);
        assert_eq!(
            input.physical_groups,
            vec![MeshPhysicalGroup {
                dim: 2,
                tag: 7,
                name: Some("plate".into()),
                members: vec![1],
            }]
        );
    }

    #[test]
    fn test_mesh_input_json() {
        let (reg, groups) = triangle();
        let geo = GeoModel::synchronize(&reg, &groups, &ModelConfig::default());
        let json = MeshInput::from_geo(&geo).unwrap().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["points"][1]["mesh_size"], 0.2);
        assert_eq!(value["surfaces"][0]["kind"], "Plane");
        assert_eq!(value["physical_groups"][0]["name"], "plate");
    }
}
