//! Queryable geometric snapshot of the builder model.

use std::collections::BTreeMap;

use tracing::{info, instrument};

use crate::config::ModelConfig;
use crate::error::{ModelError, Result};
use crate::geometry::curves::CurveShape;
use crate::geometry::point::Point3d;
use crate::geometry::surfaces::SurfaceShape;
use crate::geometry::transform::BoundingBox;
use crate::physical::PhysicalGroups;
use crate::topology::entity::{Dim, EntityRef, Tag};
use crate::topology::registry::{EntityKey, EntityRegistry, PointId};

// Parameters this far outside [0, 1] are still accepted as round-off.
const PARAM_SLACK: f64 = 1e-9;

/// The geometry captured by the last synchronize. Later builder calls are
/// invisible here until the next synchronize.
#[derive(Debug, Clone)]
pub struct GeoModel {
    registry: EntityRegistry,
    groups: PhysicalGroups,
    curves: BTreeMap<Tag, CurveShape>,
    surfaces: BTreeMap<Tag, Option<SurfaceShape>>,
    curve_samples: usize,
}

impl GeoModel {
    #[instrument(skip_all)]
    pub fn synchronize(
        registry: &EntityRegistry,
        groups: &PhysicalGroups,
        config: &ModelConfig,
    ) -> Self {
        let registry = registry.clone();
        let curves = registry
            .tags(Dim::Curve)
            .into_iter()
            .filter_map(|t| {
                let id = registry.curve_id(t).ok()?;
                Some((t, registry.curve_shape(id)))
            })
            .collect();
        let surfaces: BTreeMap<Tag, Option<SurfaceShape>> = registry
            .tags(Dim::Surface)
            .into_iter()
            .filter_map(|t| {
                let id = registry.surface_id(t).ok()?;
                Some((
                    t,
                    registry.surface_shape(id, config.curve_samples, config.tolerance.coincidence),
                ))
            })
            .collect();
        info!(
            points = registry.count(Dim::Point),
            curves = registry.count(Dim::Curve),
            surfaces = surfaces.len(),
            volumes = registry.count(Dim::Volume),
            "synchronized geometry"
        );
        Self {
            registry,
            groups: groups.clone(),
            curves,
            surfaces,
            curve_samples: config.curve_samples,
        }
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn groups(&self) -> &PhysicalGroups {
        &self.groups
    }

    /// Evaluate an entity: a point takes no parameters, a curve one in
    /// [0, 1] and a surface two.
    pub fn get_value(&self, dim: Dim, tag: Tag, params: &[f64]) -> Result<Point3d> {
        let arity = |n: usize| {
            if params.len() == n {
                Ok(())
            } else {
                Err(ModelError::invalid(format!(
                    "{} {tag} takes {n} parametric coordinates, got {}",
                    dim_name(dim),
                    params.len()
                )))
            }
        };
        match dim {
            Dim::Point => {
                arity(0)?;
                Ok(self.registry.position(self.registry.point_id(tag)?))
            }
            Dim::Curve => {
                arity(1)?;
                self.registry.curve_id(tag)?;
                let u = unit_param(params[0])?;
                self.curves
                    .get(&tag)
                    .map(|c| c.evaluate(u))
                    .ok_or_else(|| ModelError::invalid(format!("curve {tag} has no geometry")))
            }
            Dim::Surface => {
                arity(2)?;
                self.registry.surface_id(tag)?;
                match self.surfaces.get(&tag) {
                    Some(Some(shape @ SurfaceShape::Plane(_))) => {
                        Ok(shape.evaluate(params[0], params[1]))
                    }
                    Some(Some(shape @ SurfaceShape::Coons(_))) => {
                        Ok(shape.evaluate(unit_param(params[0])?, unit_param(params[1])?))
                    }
                    _ => Err(ModelError::invalid(format!(
                        "surface {tag} boundary is degenerate and has no parametrization"
                    ))),
                }
            }
            Dim::Volume => Err(ModelError::invalid("volumes have no parametrization")),
        }
    }

    /// All entities, or those of one dimension, ordered by dimension then tag.
    pub fn get_entities(&self, dim: Option<Dim>) -> Vec<EntityRef> {
        match dim {
            Some(d) => self.registry.entities(d),
            None => Dim::ALL
                .iter()
                .flat_map(|d| self.registry.entities(*d))
                .collect(),
        }
    }

    /// One-level boundary. Curve boundaries are end points (one for a closed
    /// curve); surface boundaries are curves carrying their loop orientation
    /// in the sign of the tag; volume boundaries are the surfaces of every
    /// shell.
    pub fn get_boundary(&self, entity: EntityRef) -> Result<Vec<EntityRef>> {
        let reg = &self.registry;
        Ok(match reg.resolve(entity)? {
            EntityKey::Point(_) => Vec::new(),
            EntityKey::Curve(id) => {
                let c = reg.curve(id);
                let mut out = vec![EntityRef::Point(reg.point(c.start).tag)];
                if !c.is_closed() {
                    out.push(EntityRef::Point(reg.point(c.end).tag));
                }
                out
            }
            EntityKey::Surface(id) => reg
                .surface(id)
                .loops()
                .flat_map(|l| reg.curve_loop(l).curves.iter())
                .map(|oc| EntityRef::Curve(reg.signed_tag(*oc)))
                .collect(),
            EntityKey::Volume(id) => reg
                .volume(id)
                .shells()
                .flat_map(|s| reg.surface_loop(s).surfaces.iter())
                .map(|s| EntityRef::Surface(reg.surface(*s).tag))
                .collect(),
        })
    }

    /// Axis-aligned box around the entity's points and sampled curves.
    pub fn get_bounding_box(&self, entity: EntityRef) -> Result<BoundingBox> {
        let reg = &self.registry;
        let key = reg.resolve(entity)?;
        let mut bb = BoundingBox::from_points(
            &reg.reachable_points(&[key])
                .into_iter()
                .filter(|p| !is_arc_center(reg, key, *p))
                .map(|p| reg.position(p))
                .collect::<Vec<_>>(),
        );
        for c in reg.reachable_curves(key) {
            for p in reg.curve_shape(c).sample(self.curve_samples) {
                bb.expand_to_include(&p);
            }
        }
        Ok(bb)
    }
}

fn is_arc_center(reg: &EntityRegistry, key: EntityKey, point: PointId) -> bool {
    use crate::topology::registry::CurveKind;
    reg.reachable_curves(key)
        .iter()
        .any(|c| matches!(reg.curve(*c).kind, CurveKind::CircleArc { center } if center == point))
}

fn unit_param(u: f64) -> Result<f64> {
    if (-PARAM_SLACK..=1.0 + PARAM_SLACK).contains(&u) {
        Ok(u.clamp(0.0, 1.0))
    } else {
        Err(ModelError::invalid(format!("parameter {u} outside [0, 1]")))
    }
}

fn dim_name(dim: Dim) -> &'static str {
    match dim {
        Dim::Point => "point",
        Dim::Curve => "curve",
        Dim::Surface => "surface",
        Dim::Volume => "volume",
    }
}
