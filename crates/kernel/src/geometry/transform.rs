use nalgebra::{Matrix4, Rotation3, Translation3, Unit, Vector3};
use serde::{Deserialize, Serialize};

use super::point::Point3d;
use super::vector::Vec3;

/// An affine map in homogeneous coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    matrix: Matrix4<f64>,
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    pub fn translation(offset: Vec3) -> Self {
        Self {
            matrix: Translation3::new(offset.x, offset.y, offset.z).to_homogeneous(),
        }
    }

    /// Rotation by `angle` radians around the line through `origin` along
    /// `axis`. Returns `None` for a zero-length axis.
    pub fn rotation_about(origin: Point3d, axis: Vec3, angle: f64) -> Option<Self> {
        let axis = Unit::try_new(Vector3::from(axis), 1e-15)?;
        let rotation = Rotation3::from_axis_angle(&axis, angle).to_homogeneous();
        Some(Self::about(origin, rotation))
    }

    /// Per-axis scaling with `center` as the fixed point.
    pub fn scaling_about(center: Point3d, factors: Vec3) -> Self {
        let scaling = Matrix4::new_nonuniform_scaling(&Vector3::from(factors));
        Self::about(center, scaling)
    }

    /// Reflection through the plane `a*x + b*y + c*z + d = 0`. Returns `None`
    /// when the plane normal is zero.
    pub fn reflection(a: f64, b: f64, c: f64, d: f64) -> Option<Self> {
        let n = Vector3::new(a, b, c);
        let len2 = n.norm_squared();
        if len2 < 1e-30 {
            return None;
        }
        let linear = nalgebra::Matrix3::identity() - n * n.transpose() * (2.0 / len2);
        let shift = n * (-2.0 * d / len2);
        let mut matrix = linear.to_homogeneous();
        matrix.fixed_view_mut::<3, 1>(0, 3).copy_from(&shift);
        Some(Self { matrix })
    }

    fn about(fixed: Point3d, linear: Matrix4<f64>) -> Self {
        let to = Translation3::new(fixed.x, fixed.y, fixed.z).to_homogeneous();
        let from = Translation3::new(-fixed.x, -fixed.y, -fixed.z).to_homogeneous();
        Self {
            matrix: to * linear * from,
        }
    }

    pub fn apply(&self, p: &Point3d) -> Point3d {
        self.matrix
            .transform_point(&nalgebra::Point3::from(*p))
            .into()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point3d,
    pub max: Point3d,
}

impl BoundingBox {
    pub fn empty() -> Self {
        Self {
            min: Point3d::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3d::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    pub fn from_points(points: &[Point3d]) -> Self {
        let mut bb = Self::empty();
        for p in points {
            bb.expand_to_include(p);
        }
        bb
    }

    pub fn expand_to_include(&mut self, p: &Point3d) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }
}
