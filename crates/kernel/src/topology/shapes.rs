//! Geometry of registered entities, evaluated from current point coordinates.

use super::entity::Sense;
use super::registry::*;
use crate::geometry::curves::{CurveShape, OrientedShape};
use crate::geometry::point::Point3d;
use crate::geometry::surfaces::{CoonsPatch, PlaneFrame, SurfaceShape};

impl EntityRegistry {
    pub fn position(&self, id: PointId) -> Point3d {
        self.point(id).position
    }

    pub fn curve_shape(&self, id: CurveId) -> CurveShape {
        let c = self.curve(id);
        let start = self.position(c.start);
        let end = self.position(c.end);
        match &c.kind {
            CurveKind::Line => CurveShape::Segment { start, end },
            CurveKind::CircleArc { center } => CurveShape::Arc {
                start,
                center: self.position(*center),
                end,
            },
            CurveKind::Spline { .. } => CurveShape::Spline {
                points: c.defining_points().iter().map(|p| self.position(*p)).collect(),
                closed: c.is_closed(),
            },
        }
    }

    pub fn oriented_shape(&self, oc: OrientedCurve) -> OrientedShape {
        OrientedShape {
            shape: self.curve_shape(oc.curve),
            reversed: oc.sense == Sense::Reversed,
        }
    }

    /// Closed polygon approximating a curve loop, without the repeated
    /// closing vertex.
    pub fn loop_polyline(&self, id: CurveLoopId, samples_per_curve: usize) -> Vec<Point3d> {
        let mut poly = Vec::new();
        for oc in &self.curve_loop(id).curves {
            let pts = self.oriented_shape(*oc).sample(samples_per_curve);
            // Each curve's end is the next curve's start.
            poly.extend(pts.iter().take(pts.len().saturating_sub(1)));
        }
        poly
    }

    /// Parametric geometry of a surface, or `None` when the boundary is too
    /// degenerate to span one.
    pub fn surface_shape(
        &self,
        id: SurfaceId,
        samples_per_curve: usize,
        min_length: f64,
    ) -> Option<SurfaceShape> {
        let s = self.surface(id);
        match s.kind {
            SurfaceKind::Plane => {
                let boundary = self.loop_polyline(s.outer, samples_per_curve);
                PlaneFrame::from_boundary(&boundary, min_length).map(SurfaceShape::Plane)
            }
            SurfaceKind::Filling => {
                let sides = self
                    .curve_loop(s.outer)
                    .curves
                    .iter()
                    .map(|oc| self.oriented_shape(*oc))
                    .collect();
                CoonsPatch::new(sides).map(SurfaceShape::Coons)
            }
        }
    }
}
