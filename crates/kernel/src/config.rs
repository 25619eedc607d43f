//! Tolerances and per-model options.

use approx::AbsDiffEq;

use crate::geometry::point::Point3d;

/// Thresholds for geometric comparisons.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    /// Points closer than this are considered coincident.
    pub coincidence: f64,
    /// Angles smaller than this (radians) are considered zero.
    pub angular: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            coincidence: 1e-7,
            angular: 1e-10,
        }
    }
}

impl Tolerance {
    pub fn points_coincident(&self, a: &Point3d, b: &Point3d) -> bool {
        a.abs_diff_eq(b, self.coincidence)
    }

    pub fn is_zero_length(&self, length: f64) -> bool {
        length.abs() < self.coincidence
    }

    pub fn is_zero_angle(&self, angle: f64) -> bool {
        angle.abs() < self.angular
    }
}

/// Options governing validation and geometry evaluation for one model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub tolerance: Tolerance,
    /// Samples per non-straight curve when a loop is approximated by a
    /// polygon (orientation and planarity checks, bounding boxes).
    pub curve_samples: usize,
    /// Reject holes that wind the same way as their outer loop.
    pub check_hole_orientation: bool,
    /// Log a warning when a plane surface boundary is not flat.
    pub warn_non_planar: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            tolerance: Tolerance::default(),
            curve_samples: 16,
            check_hole_orientation: true,
            warn_non_planar: true,
        }
    }
}

impl ModelConfig {
    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_curve_samples(mut self, samples: usize) -> Self {
        self.curve_samples = samples.max(1);
        self
    }

    pub fn with_hole_orientation_check(mut self, enabled: bool) -> Self {
        self.check_hole_orientation = enabled;
        self
    }

    pub fn with_planarity_warning(mut self, enabled: bool) -> Self {
        self.warn_non_planar = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tolerance_helpers() {
        let tol = Tolerance::default();
        assert!(tol.points_coincident(&Point3d::ORIGIN, &Point3d::new(1e-9, 0.0, 0.0)));
        assert!(!tol.points_coincident(&Point3d::ORIGIN, &Point3d::new(1e-3, 0.0, 0.0)));
        assert!(tol.is_zero_length(-1e-9));
        assert!(tol.is_zero_angle(1e-12));
    }

    #[test]
    fn test_config_builders() {
        let cfg = ModelConfig::default()
            .with_curve_samples(0)
            .with_hole_orientation_check(false);
        assert_eq!(cfg.curve_samples, 1);
        assert!(!cfg.check_hole_orientation);
        assert!(cfg.warn_non_planar);
    }
}
