use tracing::{debug, instrument};

use crate::error::{ModelError, Result};
use crate::geometry::point::Point3d;
use crate::geometry::transform::Transform;
use crate::geometry::vector::Vec3;
use crate::topology::entity::EntityRef;
use crate::topology::registry::EntityRegistry;

/// Move every point reachable from `entities` through `transform`. Each
/// shared point moves exactly once. Returns the number of points moved.
pub fn apply_transform(
    reg: &mut EntityRegistry,
    entities: &[EntityRef],
    transform: &Transform,
) -> Result<usize> {
    let keys = reg.resolve_all(entities)?;
    let points = reg.reachable_points(&keys);
    for id in &points {
        let moved = transform.apply(&reg.position(*id));
        reg.point_mut(*id).position = moved;
    }
    debug!(moved = points.len(), "transformed points");
    Ok(points.len())
}

#[instrument(skip(reg))]
pub fn translate(reg: &mut EntityRegistry, entities: &[EntityRef], offset: Vec3) -> Result<()> {
    if !offset.is_finite() {
        return Err(ModelError::invalid("translation vector must be finite"));
    }
    apply_transform(reg, entities, &Transform::translation(offset))?;
    Ok(())
}

/// Rotate by `angle` radians about the axis through `origin` along `axis`
/// (right-hand rule).
#[instrument(skip(reg))]
pub fn rotate(
    reg: &mut EntityRegistry,
    entities: &[EntityRef],
    origin: Point3d,
    axis: Vec3,
    angle: f64,
) -> Result<()> {
    if !origin.is_finite() || !angle.is_finite() {
        return Err(ModelError::invalid("rotation origin and angle must be finite"));
    }
    let transform = Transform::rotation_about(origin, axis, angle)
        .ok_or_else(|| ModelError::invalid("rotation axis has zero length"))?;
    apply_transform(reg, entities, &transform)?;
    Ok(())
}

/// Scale by `factors` along x, y and z about `center`.
#[instrument(skip(reg))]
pub fn dilate(
    reg: &mut EntityRegistry,
    entities: &[EntityRef],
    center: Point3d,
    factors: Vec3,
) -> Result<()> {
    if !center.is_finite() || !factors.is_finite() {
        return Err(ModelError::invalid("dilation center and factors must be finite"));
    }
    apply_transform(reg, entities, &Transform::scaling_about(center, factors))?;
    Ok(())
}

/// Reflect in the plane `a*x + b*y + c*z + d = 0`.
#[instrument(skip(reg))]
pub fn mirror(
    reg: &mut EntityRegistry,
    entities: &[EntityRef],
    a: f64,
    b: f64,
    c: f64,
    d: f64,
) -> Result<()> {
    let transform = Transform::reflection(a, b, c, d)
        .ok_or_else(|| ModelError::invalid("mirror plane normal has zero length"))?;
    apply_transform(reg, entities, &transform)?;
    Ok(())
}
