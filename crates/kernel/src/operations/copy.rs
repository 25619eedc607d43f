use std::collections::HashMap;

use tracing::{info, instrument};

use crate::config::ModelConfig;
use crate::error::Result;
use crate::geometry::transform::Transform;
use crate::topology::builder::{
    create_curve, create_curve_loop, create_surface, create_surface_loop, create_volume,
};
use crate::topology::entity::{EntityRef, TagSpace};
use crate::topology::registry::*;

/// Deep duplicator shared by copy and extrude.
///
/// Every source entity is duplicated at most once per duplicator; later
/// requests return the first duplicate, so entities reachable from several
/// inputs stay shared among the copies. New point positions pass through
/// `placement`.
pub(crate) struct Duplicator<'a> {
    pub(crate) reg: &'a mut EntityRegistry,
    pub(crate) config: &'a ModelConfig,
    placement: Transform,
    points: HashMap<PointId, PointId>,
    curves: HashMap<CurveId, CurveId>,
    curve_loops: HashMap<CurveLoopId, CurveLoopId>,
    surfaces: HashMap<SurfaceId, SurfaceId>,
    surface_loops: HashMap<SurfaceLoopId, SurfaceLoopId>,
    volumes: HashMap<VolumeId, VolumeId>,
    /// Elementary entities created so far, in creation order.
    pub(crate) created: Vec<EntityKey>,
}

impl<'a> Duplicator<'a> {
    pub(crate) fn new(
        reg: &'a mut EntityRegistry,
        config: &'a ModelConfig,
        placement: Transform,
    ) -> Self {
        Self {
            reg,
            config,
            placement,
            points: HashMap::new(),
            curves: HashMap::new(),
            curve_loops: HashMap::new(),
            surfaces: HashMap::new(),
            surface_loops: HashMap::new(),
            volumes: HashMap::new(),
            created: Vec::new(),
        }
    }

    pub(crate) fn entity(&mut self, key: EntityKey) -> Result<EntityKey> {
        Ok(match key {
            EntityKey::Point(id) => EntityKey::Point(self.point(id)?),
            EntityKey::Curve(id) => EntityKey::Curve(self.curve(id)?),
            EntityKey::Surface(id) => EntityKey::Surface(self.surface(id)?),
            EntityKey::Volume(id) => EntityKey::Volume(self.volume(id)?),
        })
    }

    pub(crate) fn point(&mut self, id: PointId) -> Result<PointId> {
        if let Some(copy) = self.points.get(&id) {
            return Ok(*copy);
        }
        let source = self.reg.point(id).clone();
        let tag = self.reg.claim_tag(TagSpace::Point, None)?;
        let copy = self.reg.insert_point(Point {
            tag,
            position: self.placement.apply(&source.position),
            mesh_size: source.mesh_size,
        });
        self.points.insert(id, copy);
        self.created.push(EntityKey::Point(copy));
        Ok(copy)
    }

    pub(crate) fn curve(&mut self, id: CurveId) -> Result<CurveId> {
        if let Some(copy) = self.curves.get(&id) {
            return Ok(*copy);
        }
        let source = self.reg.curve(id).clone();
        let start = self.point(source.start)?;
        let end = self.point(source.end)?;
        let kind = match &source.kind {
            CurveKind::Line => CurveKind::Line,
            CurveKind::CircleArc { center } => CurveKind::CircleArc {
                center: self.point(*center)?,
            },
            CurveKind::Spline { interior } => CurveKind::Spline {
                interior: interior
                    .iter()
                    .map(|p| self.point(*p))
                    .collect::<Result<Vec<_>>>()?,
            },
        };
        let copy = create_curve(self.reg, kind, start, end, None, self.config)?;
        self.curves.insert(id, copy);
        self.created.push(EntityKey::Curve(copy));
        Ok(copy)
    }

    fn curve_loop(&mut self, id: CurveLoopId) -> Result<CurveLoopId> {
        if let Some(copy) = self.curve_loops.get(&id) {
            return Ok(*copy);
        }
        let source = self.reg.curve_loop(id).curves.clone();
        let curves = source
            .iter()
            .map(|oc| {
                Ok(OrientedCurve {
                    curve: self.curve(oc.curve)?,
                    sense: oc.sense,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let copy = create_curve_loop(self.reg, curves, None)?;
        self.curve_loops.insert(id, copy);
        Ok(copy)
    }

    pub(crate) fn surface(&mut self, id: SurfaceId) -> Result<SurfaceId> {
        if let Some(copy) = self.surfaces.get(&id) {
            return Ok(*copy);
        }
        let source = self.reg.surface(id).clone();
        let outer = self.curve_loop(source.outer)?;
        let holes = source
            .holes
            .iter()
            .map(|l| self.curve_loop(*l))
            .collect::<Result<Vec<_>>>()?;
        let copy = create_surface(self.reg, source.kind, outer, holes, None, self.config)?;
        self.surfaces.insert(id, copy);
        self.created.push(EntityKey::Surface(copy));
        Ok(copy)
    }

    fn surface_loop(&mut self, id: SurfaceLoopId) -> Result<SurfaceLoopId> {
        if let Some(copy) = self.surface_loops.get(&id) {
            return Ok(*copy);
        }
        let source = self.reg.surface_loop(id).surfaces.clone();
        let surfaces = source
            .iter()
            .map(|s| self.surface(*s))
            .collect::<Result<Vec<_>>>()?;
        let copy = create_surface_loop(self.reg, surfaces, None)?;
        self.surface_loops.insert(id, copy);
        Ok(copy)
    }

    fn volume(&mut self, id: VolumeId) -> Result<VolumeId> {
        if let Some(copy) = self.volumes.get(&id) {
            return Ok(*copy);
        }
        let source = self.reg.volume(id).clone();
        let outer = self.surface_loop(source.outer)?;
        let cavities = source
            .cavities
            .iter()
            .map(|s| self.surface_loop(*s))
            .collect::<Result<Vec<_>>>()?;
        let copy = create_volume(self.reg, outer, cavities, None)?;
        self.volumes.insert(id, copy);
        self.created.push(EntityKey::Volume(copy));
        Ok(copy)
    }
}

/// Duplicate `entities` and everything they depend on. Returns the copies in
/// input order; the sources are left untouched.
#[instrument(skip(reg, config))]
pub fn copy(
    reg: &mut EntityRegistry,
    entities: &[EntityRef],
    config: &ModelConfig,
) -> Result<Vec<EntityRef>> {
    let keys = reg.resolve_all(entities)?;
    let mut dup = Duplicator::new(reg, config, Transform::identity());
    let copies = keys
        .iter()
        .map(|k| dup.entity(*k))
        .collect::<Result<Vec<_>>>()?;
    info!(inputs = keys.len(), created = dup.created.len(), "copied entities");
    Ok(copies.into_iter().map(|k| reg.entity_ref(k)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::point::Point3d;
    use crate::geometry::vector::Vec3;
    use crate::operations::translate;
    use crate::topology::builder::*;
    use approx::assert_abs_diff_eq;

    fn cfg() -> ModelConfig {
        ModelConfig::default()
    }

    fn square_surface(reg: &mut EntityRegistry) {
        for (i, (x, y)) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)].iter().enumerate() {
            add_point(reg, Point3d::new(*x, *y, 0.0), Some(0.1), Some(i as i32 + 1)).unwrap();
        }
        for i in 0..4 {
            let ends = [i + 1, (i + 1) % 4 + 1];
            add_curve(reg, CurveType::Line, &ends, Some(i + 1), &cfg()).unwrap();
        }
        add_curve_loop(reg, &[1, 2, 3, 4], Some(1)).unwrap();
        add_plane_surface(reg, &[1], Some(1), &cfg()).unwrap();
    }

    #[test]
    fn test_copy_then_translate_leaves_source() {
        let mut reg = EntityRegistry::new();
        add_point(&mut reg, Point3d::new(0.1, 0.3, 0.0), None, Some(3)).unwrap();
        let copies = copy(&mut reg, &[EntityRef::Point(3)], &cfg()).unwrap();
        assert_eq!(copies, vec![EntityRef::Point(4)]);

        translate(&mut reg, &copies, Vec3::new(0.0, 0.05, 0.0)).unwrap();
        let p = reg.point_id(3).unwrap();
        let q = reg.point_id(4).unwrap();
        assert_abs_diff_eq!(reg.position(p), Point3d::new(0.1, 0.3, 0.0), epsilon = 1e-12);
        assert_abs_diff_eq!(reg.position(q), Point3d::new(0.1, 0.35, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_copy_surface_duplicates_dependencies() {
        let mut reg = EntityRegistry::new();
        square_surface(&mut reg);
        let copies = copy(&mut reg, &[EntityRef::Surface(1)], &cfg()).unwrap();
        assert_eq!(copies, vec![EntityRef::Surface(2)]);
        assert_eq!(reg.tags(crate::topology::Dim::Point), vec![1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(reg.tags(crate::topology::Dim::Curve).len(), 8);
        assert_eq!(reg.next_free_tag(TagSpace::CurveLoop), 3);

        // Mesh sizes travel with copied points.
        let p5 = reg.point_id(5).unwrap();
        assert_eq!(reg.point(p5).mesh_size, Some(0.1));
    }

    #[test]
    fn test_copy_shares_points_among_inputs() {
        let mut reg = EntityRegistry::new();
        square_surface(&mut reg);
        let copies = copy(
            &mut reg,
            &[EntityRef::Curve(1), EntityRef::Point(2), EntityRef::Curve(2)],
            &cfg(),
        )
        .unwrap();
        // Curve 1 copies points 1 and 2; point 2's copy is reused.
        assert_eq!(
            copies,
            vec![EntityRef::Curve(5), EntityRef::Point(6), EntityRef::Curve(6)]
        );
        assert_eq!(reg.count(crate::topology::Dim::Point), 7);
        let c5 = reg.curve(reg.curve_id(5).unwrap()).end;
        let c6 = reg.curve(reg.curve_id(6).unwrap()).start;
        assert_eq!(c5, c6);
    }

    #[test]
    fn test_copy_of_missing_entity_fails() {
        let mut reg = EntityRegistry::new();
        assert_eq!(
            copy(&mut reg, &[EntityRef::Volume(1)], &cfg()),
            Err(crate::error::ModelError::DanglingReference {
                space: TagSpace::Volume,
                tag: 1
            })
        );
    }
}
