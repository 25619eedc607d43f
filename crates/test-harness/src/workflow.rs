//! ModelBuilder: fluent API for scripting geometry workflows in tests.
//!
//! Wraps a [`Model`] directly; every step is labelled so a failure names the
//! call that introduced it.

use brep_kernel::{Dim, EntityRef, Model, ModelError, Point3d, Tag, Vec3};
use tracing::debug;

use crate::helpers::HarnessError;
use crate::oracle;

/// A fluent builder for constructing and verifying geometry models in tests.
pub struct ModelBuilder {
    model: Model,
    history: Vec<String>,
    auto_check: bool,
}

impl ModelBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            model: Model::new(name),
            history: Vec::new(),
            auto_check: false,
        }
    }

    /// Enable auto-checking: after every step, run all oracles.
    pub fn with_auto_check(mut self) -> Self {
        self.auto_check = true;
        self
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn into_model(self) -> Model {
        self.model
    }

    /// Labels of the steps that succeeded, in order.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    fn step<T>(
        &mut self,
        label: String,
        op: impl FnOnce(&mut Model) -> Result<T, ModelError>,
    ) -> Result<T, HarnessError> {
        let out = op(&mut self.model).map_err(|source| HarnessError::Step {
            step: label.clone(),
            source,
        })?;
        debug!(step = %label, "step done");
        self.history.push(label);
        if self.auto_check {
            self.check()?;
        }
        Ok(out)
    }

    // ── Elementary Entities ─────────────────────────────────────────────

    pub fn point(
        &mut self,
        x: f64,
        y: f64,
        z: f64,
        lc: Option<f64>,
        tag: Option<Tag>,
    ) -> Result<Tag, HarnessError> {
        self.step(format!("point {tag:?} ({x}, {y}, {z})"), |m| {
            m.add_point(x, y, z, lc, tag)
        })
    }

    pub fn line(&mut self, start: Tag, end: Tag, tag: Option<Tag>) -> Result<Tag, HarnessError> {
        self.step(format!("line {tag:?} {start}->{end}"), |m| m.add_line(start, end, tag))
    }

    pub fn curve_loop(&mut self, curves: &[Tag], tag: Option<Tag>) -> Result<Tag, HarnessError> {
        self.step(format!("curve loop {tag:?} {curves:?}"), |m| m.add_curve_loop(curves, tag))
    }

    pub fn plane_surface(&mut self, loops: &[Tag], tag: Option<Tag>) -> Result<Tag, HarnessError> {
        self.step(format!("plane surface {tag:?} {loops:?}"), |m| {
            m.add_plane_surface(loops, tag)
        })
    }

    pub fn surface_loop(
        &mut self,
        surfaces: &[Tag],
        tag: Option<Tag>,
    ) -> Result<Tag, HarnessError> {
        self.step(format!("surface loop {tag:?} {surfaces:?}"), |m| {
            m.add_surface_loop(surfaces, tag)
        })
    }

    pub fn volume(&mut self, shells: &[Tag], tag: Option<Tag>) -> Result<Tag, HarnessError> {
        self.step(format!("volume {tag:?} {shells:?}"), |m| m.add_volume(shells, tag))
    }

    // ── Transforms & Derived Entities ───────────────────────────────────

    pub fn translate(
        &mut self,
        entities: &[EntityRef],
        dx: f64,
        dy: f64,
        dz: f64,
    ) -> Result<(), HarnessError> {
        self.step(format!("translate {} entities", entities.len()), |m| {
            m.translate(entities, Vec3::new(dx, dy, dz))
        })
    }

    pub fn rotate(
        &mut self,
        entities: &[EntityRef],
        origin: [f64; 3],
        axis: [f64; 3],
        angle: f64,
    ) -> Result<(), HarnessError> {
        self.step(format!("rotate {} entities by {angle}", entities.len()), |m| {
            m.rotate(
                entities,
                Point3d::from_array(origin),
                Vec3::new(axis[0], axis[1], axis[2]),
                angle,
            )
        })
    }

    pub fn copy(&mut self, entities: &[EntityRef]) -> Result<Vec<EntityRef>, HarnessError> {
        self.step(format!("copy {} entities", entities.len()), |m| m.copy(entities))
    }

    pub fn extrude(
        &mut self,
        entities: &[EntityRef],
        dx: f64,
        dy: f64,
        dz: f64,
    ) -> Result<Vec<EntityRef>, HarnessError> {
        self.step(format!("extrude {} entities", entities.len()), |m| {
            m.extrude(entities, Vec3::new(dx, dy, dz))
        })
    }

    // ── Groups, Sizes & Sync ────────────────────────────────────────────

    pub fn physical_group(
        &mut self,
        dim: Dim,
        members: &[Tag],
        tag: Option<Tag>,
        name: Option<&str>,
    ) -> Result<Tag, HarnessError> {
        self.step(format!("physical group {tag:?} dim {}", dim.index()), |m| {
            m.add_physical_group(dim, members, tag, name)
        })
    }

    pub fn mesh_size(&mut self, entities: &[EntityRef], size: f64) -> Result<(), HarnessError> {
        self.step(format!("mesh size {size}"), |m| m.set_mesh_size(entities, size))
    }

    pub fn synchronize(&mut self) -> Result<(), HarnessError> {
        self.step("synchronize".to_string(), |m| {
            m.synchronize();
            Ok(())
        })
    }

    pub fn value(&self, dim: Dim, tag: Tag, params: &[f64]) -> Result<Point3d, HarnessError> {
        Ok(self.model.get_value(dim, tag, params)?)
    }

    // ── Verification ────────────────────────────────────────────────────

    /// Run every oracle; the first failure becomes an error.
    pub fn check(&self) -> Result<(), HarnessError> {
        match oracle::run_all_oracles(&self.model).into_iter().find(|v| !v.passed) {
            Some(v) => Err(HarnessError::OracleFailure {
                oracle: v.oracle_name,
                detail: v.detail,
            }),
            None => Ok(()),
        }
    }
}
