use super::curves::OrientedShape;
use super::point::Point3d;
use super::vector::Vec3;

/// Area-weighted normal of a closed polygon (Newell's method). The length is
/// twice the enclosed area; the direction follows the winding.
pub fn newell_normal(polygon: &[Point3d]) -> Vec3 {
    let n = polygon.len();
    let mut normal = Vec3::ZERO;
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[(i + 1) % n];
        normal.x += (a.y - b.y) * (a.z + b.z);
        normal.y += (a.z - b.z) * (a.x + b.x);
        normal.z += (a.x - b.x) * (a.y + b.y);
    }
    normal
}

/// Orthonormal frame spanning a planar surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneFrame {
    pub origin: Point3d,
    pub u_axis: Vec3,
    pub v_axis: Vec3,
    pub normal: Vec3,
}

impl PlaneFrame {
    /// Fit a frame to a closed boundary polygon. The normal follows the
    /// winding; the `u` axis points along the first edge that is not
    /// degenerate. Returns `None` when the polygon encloses no area.
    pub fn from_boundary(boundary: &[Point3d], min_length: f64) -> Option<Self> {
        let normal = newell_normal(boundary).normalized(min_length)?;
        let origin = *boundary.first()?;
        let u_axis = boundary.iter().skip(1).find_map(|p| {
            let d = *p - origin;
            (d - normal * d.dot(&normal)).normalized(min_length)
        })?;
        Some(Self {
            origin,
            u_axis,
            v_axis: normal.cross(&u_axis),
            normal,
        })
    }

    pub fn evaluate(&self, u: f64, v: f64) -> Point3d {
        self.origin + self.u_axis * u + self.v_axis * v
    }

    /// Largest distance from any of `points` to the plane.
    pub fn max_deviation(&self, points: &[Point3d]) -> f64 {
        points
            .iter()
            .map(|p| (*p - self.origin).dot(&self.normal).abs())
            .fold(0.0, f64::max)
    }
}

/// Transfinite (Coons) interpolation of three or four boundary curves given
/// in loop order. A three-sided patch collapses its fourth side onto the
/// first corner.
#[derive(Debug, Clone, PartialEq)]
pub struct CoonsPatch {
    sides: Vec<OrientedShape>,
}

impl CoonsPatch {
    pub fn new(sides: Vec<OrientedShape>) -> Option<Self> {
        matches!(sides.len(), 3 | 4).then_some(Self { sides })
    }

    pub fn evaluate(&self, u: f64, v: f64) -> Point3d {
        let s = &self.sides;
        let bottom = s[0].evaluate(u).to_vec3();
        let right = s[1].evaluate(v).to_vec3();
        let top = s[2].evaluate(1.0 - u).to_vec3();
        let p00 = s[0].evaluate(0.0).to_vec3();
        let p10 = s[0].evaluate(1.0).to_vec3();
        let p11 = s[1].evaluate(1.0).to_vec3();
        let p01 = s[2].evaluate(1.0).to_vec3();
        let left = match s.get(3) {
            Some(side) => side.evaluate(1.0 - v).to_vec3(),
            None => p00,
        };

        let ruled_v = bottom * (1.0 - v) + top * v;
        let ruled_u = left * (1.0 - u) + right * u;
        let corners = p00 * ((1.0 - u) * (1.0 - v))
            + p10 * (u * (1.0 - v))
            + p01 * ((1.0 - u) * v)
            + p11 * (u * v);
        Point3d::ORIGIN + (ruled_v + ruled_u - corners)
    }
}

/// Surface geometry with its boundary resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceShape {
    Plane(PlaneFrame),
    Coons(CoonsPatch),
}

impl SurfaceShape {
    pub fn evaluate(&self, u: f64, v: f64) -> Point3d {
        match self {
            SurfaceShape::Plane(frame) => frame.evaluate(u, v),
            SurfaceShape::Coons(patch) => patch.evaluate(u, v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::curves::CurveShape;
    use approx::assert_abs_diff_eq;

    fn seg(a: Point3d, b: Point3d, reversed: bool) -> OrientedShape {
        OrientedShape {
            shape: CurveShape::Segment { start: a, end: b },
            reversed,
        }
    }

    #[test]
    fn test_newell_normal_follows_winding() {
        let square = [
            Point3d::new(0.0, 0.0, 0.0),
            Point3d::new(1.0, 0.0, 0.0),
            Point3d::new(1.0, 1.0, 0.0),
            Point3d::new(0.0, 1.0, 0.0),
        ];
        assert_abs_diff_eq!(newell_normal(&square), Vec3::new(0.0, 0.0, 2.0), epsilon = 1e-12);
        let mut reversed = square;
        reversed.reverse();
        assert!(newell_normal(&reversed).z < 0.0);
    }

    #[test]
    fn test_plane_frame_from_boundary() {
        let boundary = [
            Point3d::new(0.0, 0.0, 1.0),
            Point3d::new(2.0, 0.0, 1.0),
            Point3d::new(2.0, 2.0, 1.0),
            Point3d::new(0.0, 2.0, 1.0),
        ];
        let frame = PlaneFrame::from_boundary(&boundary, 1e-12).unwrap();
        assert_abs_diff_eq!(frame.normal, Vec3::Z, epsilon = 1e-12);
        assert_abs_diff_eq!(frame.evaluate(1.0, 1.0), Point3d::new(1.0, 1.0, 1.0), epsilon = 1e-12);
        assert_abs_diff_eq!(frame.max_deviation(&boundary), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_plane_frame_rejects_collinear() {
        let line = [
            Point3d::new(0.0, 0.0, 0.0),
            Point3d::new(1.0, 0.0, 0.0),
            Point3d::new(2.0, 0.0, 0.0),
        ];
        assert!(PlaneFrame::from_boundary(&line, 1e-12).is_none());
    }

    #[test]
    fn test_coons_reproduces_bilinear_quad() {
        let p00 = Point3d::new(0.0, 0.0, 0.0);
        let p10 = Point3d::new(1.0, 0.0, 0.0);
        let p11 = Point3d::new(1.0, 1.0, 1.0);
        let p01 = Point3d::new(0.0, 1.0, 0.0);
        let patch = CoonsPatch::new(vec![
            seg(p00, p10, false),
            seg(p10, p11, false),
            // stored backwards and traversed reversed: p11 -> p01
            seg(p01, p11, true),
            seg(p01, p00, false),
        ])
        .unwrap();
        assert_abs_diff_eq!(patch.evaluate(0.0, 0.0), p00, epsilon = 1e-12);
        assert_abs_diff_eq!(patch.evaluate(1.0, 1.0), p11, epsilon = 1e-12);
        assert_abs_diff_eq!(
            patch.evaluate(0.5, 0.5),
            Point3d::new(0.5, 0.5, 0.25),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_coons_triangle_and_arity() {
        let a = Point3d::new(0.0, 0.0, 0.0);
        let b = Point3d::new(1.0, 0.0, 0.0);
        let c = Point3d::new(0.0, 1.0, 0.0);
        let patch =
            CoonsPatch::new(vec![seg(a, b, false), seg(b, c, false), seg(c, a, false)]).unwrap();
        assert_abs_diff_eq!(patch.evaluate(1.0, 0.0), b, epsilon = 1e-12);
        assert_abs_diff_eq!(patch.evaluate(1.0, 1.0), c, epsilon = 1e-12);
        assert_abs_diff_eq!(patch.evaluate(0.0, 0.7), a, epsilon = 1e-12);
        assert!(CoonsPatch::new(vec![seg(a, b, false), seg(b, a, false)]).is_none());
    }
}
