use super::point::Point3d;
use super::vector::Vec3;

/// Curve geometry with its defining coordinates resolved.
///
/// Every shape is parametrized on `u` in `[0, 1]`, running from the start
/// point to the end point.
#[derive(Debug, Clone, PartialEq)]
pub enum CurveShape {
    Segment {
        start: Point3d,
        end: Point3d,
    },
    /// Arc around `center`, sweeping less than half a turn from `start` to
    /// `end`. The radius is blended linearly when the two ends disagree.
    Arc {
        start: Point3d,
        center: Point3d,
        end: Point3d,
    },
    /// Catmull-Rom interpolation through `points`.
    Spline { points: Vec<Point3d>, closed: bool },
}

impl CurveShape {
    pub fn evaluate(&self, u: f64) -> Point3d {
        match self {
            CurveShape::Segment { start, end } => start.lerp(end, u),
            CurveShape::Arc { start, center, end } => evaluate_arc(start, center, end, u),
            CurveShape::Spline { points, closed } => evaluate_spline(points, *closed, u),
        }
    }

    pub fn start(&self) -> Point3d {
        self.evaluate(0.0)
    }

    pub fn end(&self) -> Point3d {
        self.evaluate(1.0)
    }

    pub fn is_straight(&self) -> bool {
        matches!(self, CurveShape::Segment { .. })
    }

    /// Points along the curve including both ends. Segments are exact with
    /// two points; other shapes use `segments + 1` uniform samples.
    pub fn sample(&self, segments: usize) -> Vec<Point3d> {
        if self.is_straight() {
            return vec![self.start(), self.end()];
        }
        let n = segments.max(1);
        (0..=n).map(|i| self.evaluate(i as f64 / n as f64)).collect()
    }
}

/// A curve shape traversed forward or backward.
#[derive(Debug, Clone, PartialEq)]
pub struct OrientedShape {
    pub shape: CurveShape,
    pub reversed: bool,
}

impl OrientedShape {
    pub fn evaluate(&self, u: f64) -> Point3d {
        if self.reversed {
            self.shape.evaluate(1.0 - u)
        } else {
            self.shape.evaluate(u)
        }
    }

    /// Samples in traversal order, including both ends.
    pub fn sample(&self, segments: usize) -> Vec<Point3d> {
        let mut pts = self.shape.sample(segments);
        if self.reversed {
            pts.reverse();
        }
        pts
    }
}

/// Sweep angle of the arc `start -> end` around `center`, or `None` when the
/// configuration does not define an arc strictly between 0 and pi.
pub fn arc_sweep(start: &Point3d, center: &Point3d, end: &Point3d, min_length: f64) -> Option<f64> {
    let a = *start - *center;
    let b = *end - *center;
    if a.length() <= min_length || b.length() <= min_length {
        return None;
    }
    let n = a.cross(&b);
    if n.length() <= min_length * a.length().max(b.length()) {
        // Collinear with the center: zero or half-turn sweep.
        return None;
    }
    Some(n.length().atan2(a.dot(&b)))
}

fn evaluate_arc(start: &Point3d, center: &Point3d, end: &Point3d, u: f64) -> Point3d {
    let a = *start - *center;
    let b = *end - *center;
    let r0 = a.length();
    let r1 = b.length();
    let (Some(e1), Some(n)) = (a.normalized(0.0), a.cross(&b).normalized(0.0)) else {
        return start.lerp(end, u);
    };
    let e2 = n.cross(&e1);
    let theta = b.dot(&e2).atan2(b.dot(&e1));
    let angle = u * theta;
    let radius = r0 + u * (r1 - r0);
    *center + (e1 * angle.cos() + e2 * angle.sin()) * radius
}

fn evaluate_spline(points: &[Point3d], closed: bool, u: f64) -> Point3d {
    match points.len() {
        0 => return Point3d::ORIGIN,
        1 => return points[0],
        _ => {}
    }
    let segments = points.len() - 1;
    let s = u.clamp(0.0, 1.0) * segments as f64;
    let i = (s.floor() as usize).min(segments - 1);
    let t = s - i as f64;

    let at = |k: isize| -> Vec3 {
        let last = segments as isize;
        let idx = if closed {
            // points[0] and points[last] coincide; skip the duplicate when wrapping.
            if k < 0 {
                k + last
            } else if k > last {
                k - last
            } else {
                k
            }
        } else {
            k.clamp(0, last)
        };
        points[idx as usize].to_vec3()
    };

    let i = i as isize;
    let (p0, p1, p2, p3) = (at(i - 1), at(i), at(i + 1), at(i + 2));
    let t2 = t * t;
    let t3 = t2 * t;
    let v = (p1 * 2.0
        + (p2 - p0) * t
        + (p0 * 2.0 - p1 * 5.0 + p2 * 4.0 - p3) * t2
        + (p1 * 3.0 - p0 - p2 * 3.0 + p3) * t3)
        * 0.5;
    Point3d::ORIGIN + v
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_segment_evaluate() {
        let c = CurveShape::Segment {
            start: Point3d::ORIGIN,
            end: Point3d::new(2.0, 0.0, 0.0),
        };
        assert_abs_diff_eq!(c.evaluate(0.25), Point3d::new(0.5, 0.0, 0.0), epsilon = 1e-12);
        assert_eq!(c.sample(16).len(), 2);
    }

    #[test]
    fn test_quarter_arc() {
        let c = CurveShape::Arc {
            start: Point3d::new(1.0, 0.0, 0.0),
            center: Point3d::ORIGIN,
            end: Point3d::new(0.0, 1.0, 0.0),
        };
        let mid = c.evaluate(0.5);
        let h = FRAC_PI_2 / 2.0;
        assert_abs_diff_eq!(mid, Point3d::new(h.cos(), h.sin(), 0.0), epsilon = 1e-12);
        assert_abs_diff_eq!(c.end(), Point3d::new(0.0, 1.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_arc_sweep_limits() {
        let c = Point3d::ORIGIN;
        let sweep = arc_sweep(&Point3d::new(1.0, 0.0, 0.0), &c, &Point3d::new(0.0, 1.0, 0.0), 1e-9);
        assert_abs_diff_eq!(sweep.unwrap(), FRAC_PI_2, epsilon = 1e-12);
        // Half turn and zero radius are rejected.
        let opposite = Point3d::new(-1.0, 0.0, 0.0);
        assert!(arc_sweep(&Point3d::new(1.0, 0.0, 0.0), &c, &opposite, 1e-9).is_none());
        assert!(arc_sweep(&c, &c, &Point3d::new(0.0, 1.0, 0.0), 1e-9).is_none());
    }

    #[test]
    fn test_spline_interpolates_points() {
        let points = vec![
            Point3d::new(0.0, 0.0, 0.0),
            Point3d::new(1.0, 1.0, 0.0),
            Point3d::new(2.0, 0.0, 0.0),
        ];
        let c = CurveShape::Spline { points, closed: false };
        assert_abs_diff_eq!(c.evaluate(0.0), Point3d::new(0.0, 0.0, 0.0), epsilon = 1e-12);
        assert_abs_diff_eq!(c.evaluate(0.5), Point3d::new(1.0, 1.0, 0.0), epsilon = 1e-12);
        assert_abs_diff_eq!(c.evaluate(1.0), Point3d::new(2.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_closed_spline_wraps() {
        let points = vec![
            Point3d::new(1.0, 0.0, 0.0),
            Point3d::new(0.0, 1.0, 0.0),
            Point3d::new(-1.0, 0.0, 0.0),
            Point3d::new(0.0, -1.0, 0.0),
            Point3d::new(1.0, 0.0, 0.0),
        ];
        let c = CurveShape::Spline { points, closed: true };
        assert_abs_diff_eq!(c.start(), c.end(), epsilon = 1e-12);
        // Symmetric neighbours keep the passage through (0, 1) horizontal.
        let before = c.evaluate(0.25 - 1e-6);
        let after = c.evaluate(0.25 + 1e-6);
        assert_abs_diff_eq!(before.y, after.y, epsilon = 1e-9);
    }

    #[test]
    fn test_reversed_orientation() {
        let o = OrientedShape {
            shape: CurveShape::Segment {
                start: Point3d::ORIGIN,
                end: Point3d::new(1.0, 0.0, 0.0),
            },
            reversed: true,
        };
        assert_abs_diff_eq!(o.evaluate(0.0), Point3d::new(1.0, 0.0, 0.0), epsilon = 1e-12);
        assert_eq!(o.sample(4)[0], Point3d::new(1.0, 0.0, 0.0));
    }
}
