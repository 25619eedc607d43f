use std::collections::HashMap;

use tracing::{info, instrument};

use super::copy::Duplicator;
use crate::config::ModelConfig;
use crate::error::{ModelError, Result};
use crate::geometry::transform::Transform;
use crate::geometry::vector::Vec3;
use crate::topology::builder::{
    create_curve, create_curve_loop, create_surface, create_surface_loop, create_volume,
};
use crate::topology::entity::{EntityRef, Sense};
use crate::topology::registry::*;

/// Sweeps entities along a fixed vector. The swept copy of each source
/// entity and the lateral entity grown from it are created once per sweep.
struct Sweep<'a> {
    dup: Duplicator<'a>,
    laterals: HashMap<PointId, CurveId>,
    sides: HashMap<CurveId, SurfaceId>,
    solids: HashMap<SurfaceId, VolumeId>,
}

impl<'a> Sweep<'a> {
    /// Straight line from `p` to its swept copy.
    fn lateral(&mut self, p: PointId) -> Result<CurveId> {
        if let Some(c) = self.laterals.get(&p) {
            return Ok(*c);
        }
        let top = self.dup.point(p)?;
        let c = create_curve(self.dup.reg, CurveKind::Line, p, top, None, self.dup.config)?;
        self.dup.created.push(EntityKey::Curve(c));
        self.laterals.insert(p, c);
        Ok(c)
    }

    /// Face swept by curve `c`, bounded by `c`, the lateral from its end,
    /// its swept copy reversed and the lateral from its start reversed.
    fn side(&mut self, c: CurveId) -> Result<SurfaceId> {
        if let Some(s) = self.sides.get(&c) {
            return Ok(*s);
        }
        let (start, end, straight) = {
            let curve = self.dup.reg.curve(c);
            (curve.start, curve.end, curve.kind == CurveKind::Line)
        };
        let top = self.dup.curve(c)?;
        let lat_end = self.lateral(end)?;
        let lat_start = self.lateral(start)?;
        let boundary = vec![
            OrientedCurve { curve: c, sense: Sense::Forward },
            OrientedCurve { curve: lat_end, sense: Sense::Forward },
            OrientedCurve { curve: top, sense: Sense::Reversed },
            OrientedCurve { curve: lat_start, sense: Sense::Reversed },
        ];
        let outer = create_curve_loop(self.dup.reg, boundary, None)?;
        let kind = if straight {
            SurfaceKind::Plane
        } else {
            SurfaceKind::Filling
        };
        let s = create_surface(self.dup.reg, kind, outer, Vec::new(), None, self.dup.config)?;
        self.dup.created.push(EntityKey::Surface(s));
        self.sides.insert(c, s);
        Ok(s)
    }

    /// Volume enclosed by `s`, its swept copy and the sides of every
    /// boundary curve.
    fn solid(&mut self, s: SurfaceId) -> Result<VolumeId> {
        if let Some(v) = self.solids.get(&s) {
            return Ok(*v);
        }
        let curves: Vec<CurveId> = {
            let reg = &*self.dup.reg;
            reg.surface(s)
                .loops()
                .flat_map(|l| reg.curve_loop(l).curves.iter().map(|oc| oc.curve))
                .collect()
        };
        let top = self.dup.surface(s)?;
        let mut shell = vec![s, top];
        for c in curves {
            let side = self.side(c)?;
            if !shell.contains(&side) {
                shell.push(side);
            }
        }
        let shell = create_surface_loop(self.dup.reg, shell, None)?;
        let v = create_volume(self.dup.reg, shell, Vec::new(), None)?;
        self.dup.created.push(EntityKey::Volume(v));
        self.solids.insert(s, v);
        Ok(v)
    }
}

/// Extrude points into lines, curves into faces and surfaces into volumes
/// along `offset`. Returns every entity created, ordered by dimension and
/// then by creation.
#[instrument(skip(reg, config))]
pub fn extrude(
    reg: &mut EntityRegistry,
    entities: &[EntityRef],
    offset: Vec3,
    config: &ModelConfig,
) -> Result<Vec<EntityRef>> {
    if !offset.is_finite() {
        return Err(ModelError::invalid("extrusion vector must be finite"));
    }
    if config.tolerance.is_zero_length(offset.length()) {
        return Err(ModelError::DegenerateSweep);
    }
    let keys = reg.resolve_all(entities)?;
    if let Some(v) = entities.iter().find(|e| e.as_volume().is_some()) {
        return Err(ModelError::invalid(format!("cannot extrude volume {}", v.tag())));
    }

    let mut sweep = Sweep {
        dup: Duplicator::new(reg, config, Transform::translation(offset)),
        laterals: HashMap::new(),
        sides: HashMap::new(),
        solids: HashMap::new(),
    };
    for key in &keys {
        match *key {
            EntityKey::Point(p) => {
                sweep.lateral(p)?;
            }
            EntityKey::Curve(c) => {
                sweep.side(c)?;
            }
            EntityKey::Surface(s) => {
                sweep.solid(s)?;
            }
            EntityKey::Volume(_) => {}
        }
    }
    let created = sweep.dup.created;

    let mut result: Vec<EntityRef> = created.into_iter().map(|k| reg.entity_ref(k)).collect();
    result.sort_by_key(|e| e.dim());
    info!(inputs = keys.len(), created = result.len(), "extruded entities");
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::point::Point3d;
    use crate::topology::Dim;
    use crate::topology::audit::audit_volume;
    use crate::topology::builder::*;
    use approx::assert_abs_diff_eq;

    fn cfg() -> ModelConfig {
        ModelConfig::default()
    }

    fn square(reg: &mut EntityRegistry) {
        for (i, (x, y)) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)].iter().enumerate() {
            add_point(reg, Point3d::new(*x, *y, 0.0), None, Some(i as i32 + 1)).unwrap();
        }
        for i in 0..4 {
            let ends = [i + 1, (i + 1) % 4 + 1];
            add_curve(reg, CurveType::Line, &ends, Some(i + 1), &cfg()).unwrap();
        }
        add_curve_loop(reg, &[1, 2, 3, 4], Some(1)).unwrap();
        add_plane_surface(reg, &[1], Some(1), &cfg()).unwrap();
    }

    fn count(result: &[EntityRef], dim: Dim) -> usize {
        result.iter().filter(|e| e.dim() == dim).count()
    }

    #[test]
    fn test_extrude_point_makes_line() {
        let mut reg = EntityRegistry::new();
        add_point(&mut reg, Point3d::ORIGIN, None, Some(1)).unwrap();
        let result = extrude(&mut reg, &[EntityRef::Point(1)], Vec3::Z, &cfg()).unwrap();
        assert_eq!(result, vec![EntityRef::Point(2), EntityRef::Curve(1)]);
        let top = reg.point_id(2).unwrap();
        assert_abs_diff_eq!(reg.position(top), Point3d::new(0.0, 0.0, 1.0), epsilon = 1e-12);
    }

    #[test]
    fn test_extrude_curve_makes_face() {
        let mut reg = EntityRegistry::new();
        square(&mut reg);
        let result = extrude(&mut reg, &[EntityRef::Curve(1)], Vec3::Z, &cfg()).unwrap();
        assert_eq!(count(&result, Dim::Point), 2);
        assert_eq!(count(&result, Dim::Curve), 3);
        assert_eq!(count(&result, Dim::Surface), 1);
        assert_eq!(count(&result, Dim::Volume), 0);
    }

    #[test]
    fn test_extrude_surface_makes_closed_volume() {
        let mut reg = EntityRegistry::new();
        square(&mut reg);
        let offset = Vec3::new(0.0, 0.0, 0.5);
        let result = extrude(&mut reg, &[EntityRef::Surface(1)], offset, &cfg()).unwrap();
        assert_eq!(count(&result, Dim::Volume), 1);
        // Top copy plus one side per boundary edge.
        assert_eq!(count(&result, Dim::Surface), 5);
        assert_eq!(count(&result, Dim::Curve), 8);
        assert_eq!(count(&result, Dim::Point), 4);

        let dims: Vec<Dim> = result.iter().map(|e| e.dim()).collect();
        let mut sorted = dims.clone();
        sorted.sort();
        assert_eq!(dims, sorted);

        let v = reg.volume_id(1).unwrap();
        let shell = reg.volume(v).outer;
        assert_eq!(reg.surface_loop(shell).surfaces.len(), 6);
        assert!(reg.surface_loop(shell).surfaces.contains(&reg.surface_id(1).unwrap()));
        assert!(audit_volume(&reg, v).all_spherical());
    }

    #[test]
    fn test_repeated_surface_is_swept_once() {
        let mut reg = EntityRegistry::new();
        square(&mut reg);
        let inputs = [EntityRef::Surface(1), EntityRef::Surface(1)];
        let result = extrude(&mut reg, &inputs, Vec3::Z, &cfg()).unwrap();
        assert_eq!(count(&result, Dim::Volume), 1);
        assert_eq!(count(&result, Dim::Surface), 5);
        assert_eq!(reg.count(Dim::Volume), 1);
        assert_eq!(reg.count(Dim::Surface), 6);
    }

    #[test]
    fn test_extrude_arc_boundary_uses_filling() {
        let mut reg = EntityRegistry::new();
        add_point(&mut reg, Point3d::new(1.0, 0.0, 0.0), None, Some(1)).unwrap();
        add_point(&mut reg, Point3d::ORIGIN, None, Some(2)).unwrap();
        add_point(&mut reg, Point3d::new(0.0, 1.0, 0.0), None, Some(3)).unwrap();
        add_curve(&mut reg, CurveType::CircleArc, &[1, 2, 3], Some(1), &cfg()).unwrap();
        add_curve(&mut reg, CurveType::Line, &[3, 2], Some(2), &cfg()).unwrap();
        add_curve(&mut reg, CurveType::Line, &[2, 1], Some(3), &cfg()).unwrap();
        add_curve_loop(&mut reg, &[1, 2, 3], Some(1)).unwrap();
        add_plane_surface(&mut reg, &[1], Some(1), &cfg()).unwrap();

        let result = extrude(&mut reg, &[EntityRef::Surface(1)], Vec3::Z, &cfg()).unwrap();
        assert_eq!(count(&result, Dim::Volume), 1);
        let arc_side = result
            .iter()
            .filter_map(|e| e.as_surface())
            .map(|t| reg.surface(reg.surface_id(t).unwrap()).kind)
            .filter(|k| *k == SurfaceKind::Filling)
            .count();
        assert_eq!(arc_side, 1);
    }

    #[test]
    fn test_zero_vector_is_degenerate() {
        let mut reg = EntityRegistry::new();
        square(&mut reg);
        assert_eq!(
            extrude(&mut reg, &[EntityRef::Surface(1)], Vec3::ZERO, &cfg()),
            Err(ModelError::DegenerateSweep)
        );
        assert_eq!(reg.count(Dim::Point), 4);
    }

    #[test]
    fn test_volume_cannot_be_extruded() {
        let mut reg = EntityRegistry::new();
        square(&mut reg);
        extrude(&mut reg, &[EntityRef::Surface(1)], Vec3::Z, &cfg()).unwrap();
        assert!(matches!(
            extrude(&mut reg, &[EntityRef::Volume(1)], Vec3::Z, &cfg()),
            Err(ModelError::InvalidArgument { .. })
        ));
    }
}
