//! The builder model: entity registry, physical groups and the last
//! synchronized geometry, behind a tag-addressed API.

use tracing::{info, instrument};

use crate::config::ModelConfig;
use crate::error::{ModelError, Result};
use crate::geometry::point::Point3d;
use crate::geometry::transform::BoundingBox;
use crate::geometry::vector::Vec3;
use crate::mesh::{MeshGenerator, MeshInput};
use crate::operations;
use crate::physical::{self, GroupId, PhysicalGroups};
use crate::sync::GeoModel;
use crate::topology::audit::{VolumeAudit, audit_volume};
use crate::topology::builder::{self, CurveType};
use crate::topology::entity::{Dim, EntityRef, Tag, TagSpace};
use crate::topology::registry::EntityRegistry;

/// A single geometry model.
///
/// Every operation either completes or returns an error with the model left
/// exactly as it was. Not safe for concurrent use; callers serialize access.
#[derive(Debug, Clone)]
pub struct Model {
    name: String,
    config: ModelConfig,
    registry: EntityRegistry,
    groups: PhysicalGroups,
    synced: Option<GeoModel>,
}

impl Model {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, ModelConfig::default())
    }

    pub fn with_config(name: impl Into<String>, config: ModelConfig) -> Self {
        Self {
            name: name.into(),
            config,
            registry: EntityRegistry::new(),
            groups: PhysicalGroups::new(),
            synced: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn groups(&self) -> &PhysicalGroups {
        &self.groups
    }

    /// Tag the next entity created in `space` receives when none is given.
    pub fn next_free_tag(&self, space: TagSpace) -> Tag {
        self.registry.next_free_tag(space)
    }

    /// Run a composite operation on a scratch copy of the registry and keep
    /// the result only if it succeeds.
    fn transact<T>(
        &mut self,
        op: impl FnOnce(&mut EntityRegistry, &ModelConfig) -> Result<T>,
    ) -> Result<T> {
        let mut scratch = self.registry.clone();
        let out = op(&mut scratch, &self.config)?;
        self.registry = scratch;
        Ok(out)
    }

    // ─── Elementary Entities ─────────────────────────────────────────────

    #[instrument(skip(self))]
    pub fn add_point(
        &mut self,
        x: f64,
        y: f64,
        z: f64,
        mesh_size: Option<f64>,
        tag: Option<Tag>,
    ) -> Result<Tag> {
        let id = builder::add_point(&mut self.registry, Point3d::new(x, y, z), mesh_size, tag)?;
        Ok(self.registry.point(id).tag)
    }

    #[instrument(skip(self))]
    pub fn add_curve(&mut self, kind: CurveType, points: &[Tag], tag: Option<Tag>) -> Result<Tag> {
        let id = builder::add_curve(&mut self.registry, kind, points, tag, &self.config)?;
        Ok(self.registry.curve(id).tag)
    }

    pub fn add_line(&mut self, start: Tag, end: Tag, tag: Option<Tag>) -> Result<Tag> {
        self.add_curve(CurveType::Line, &[start, end], tag)
    }

    pub fn add_circle_arc(
        &mut self,
        start: Tag,
        center: Tag,
        end: Tag,
        tag: Option<Tag>,
    ) -> Result<Tag> {
        self.add_curve(CurveType::CircleArc, &[start, center, end], tag)
    }

    pub fn add_spline(&mut self, points: &[Tag], tag: Option<Tag>) -> Result<Tag> {
        self.add_curve(CurveType::Spline, points, tag)
    }

    #[instrument(skip(self))]
    pub fn add_curve_loop(&mut self, curves: &[Tag], tag: Option<Tag>) -> Result<Tag> {
        let id = builder::add_curve_loop(&mut self.registry, curves, tag)?;
        Ok(self.registry.curve_loop(id).tag)
    }

    #[instrument(skip(self))]
    pub fn add_plane_surface(&mut self, curve_loops: &[Tag], tag: Option<Tag>) -> Result<Tag> {
        let id = builder::add_plane_surface(&mut self.registry, curve_loops, tag, &self.config)?;
        Ok(self.registry.surface(id).tag)
    }

    #[instrument(skip(self))]
    pub fn add_surface_filling(&mut self, curve_loop: Tag, tag: Option<Tag>) -> Result<Tag> {
        let id = builder::add_surface_filling(&mut self.registry, curve_loop, tag, &self.config)?;
        Ok(self.registry.surface(id).tag)
    }

    #[instrument(skip(self))]
    pub fn add_surface_loop(&mut self, surfaces: &[Tag], tag: Option<Tag>) -> Result<Tag> {
        let id = builder::add_surface_loop(&mut self.registry, surfaces, tag)?;
        Ok(self.registry.surface_loop(id).tag)
    }

    #[instrument(skip(self))]
    pub fn add_volume(&mut self, surface_loops: &[Tag], tag: Option<Tag>) -> Result<Tag> {
        let id = builder::add_volume(&mut self.registry, surface_loops, tag)?;
        Ok(self.registry.volume(id).tag)
    }

    /// Change the tag of an elementary entity in place.
    #[instrument(skip(self))]
    pub fn set_tag(&mut self, entity: EntityRef, new_tag: Tag) -> Result<()> {
        self.registry.retag(entity, new_tag)
    }

    // ─── Transforms & Derived Entities ───────────────────────────────────

    pub fn translate(&mut self, entities: &[EntityRef], offset: Vec3) -> Result<()> {
        operations::translate(&mut self.registry, entities, offset)
    }

    pub fn rotate(
        &mut self,
        entities: &[EntityRef],
        origin: Point3d,
        axis: Vec3,
        angle: f64,
    ) -> Result<()> {
        operations::rotate(&mut self.registry, entities, origin, axis, angle)
    }

    pub fn dilate(&mut self, entities: &[EntityRef], center: Point3d, factors: Vec3) -> Result<()> {
        operations::dilate(&mut self.registry, entities, center, factors)
    }

    pub fn mirror(&mut self, entities: &[EntityRef], a: f64, b: f64, c: f64, d: f64) -> Result<()> {
        operations::mirror(&mut self.registry, entities, a, b, c, d)
    }

    pub fn copy(&mut self, entities: &[EntityRef]) -> Result<Vec<EntityRef>> {
        self.transact(|reg, config| operations::copy(reg, entities, config))
    }

    pub fn extrude(&mut self, entities: &[EntityRef], offset: Vec3) -> Result<Vec<EntityRef>> {
        self.transact(|reg, config| operations::extrude(reg, entities, offset, config))
    }

    // ─── Grouping & Sizing ───────────────────────────────────────────────

    pub fn add_physical_group(
        &mut self,
        dim: Dim,
        members: &[Tag],
        tag: Option<Tag>,
        name: Option<&str>,
    ) -> Result<Tag> {
        self.groups.add(&self.registry, dim, members, tag, name)
    }

    pub fn physical_groups(&self, dim: Option<Dim>) -> Vec<GroupId> {
        self.groups.list(dim)
    }

    pub fn physical_group_members(&self, dim: Dim, tag: Tag) -> Result<Vec<Tag>> {
        self.groups.members(&self.registry, dim, tag)
    }

    pub fn physical_name(&self, dim: Dim, tag: Tag) -> Result<Option<&str>> {
        self.groups.name(dim, tag)
    }

    pub fn set_physical_name(&mut self, dim: Dim, tag: Tag, name: &str) -> Result<()> {
        self.groups.set_name(dim, tag, name)
    }

    pub fn set_mesh_size(&mut self, entities: &[EntityRef], size: f64) -> Result<()> {
        physical::set_mesh_size(&mut self.registry, entities, size)?;
        Ok(())
    }

    // ─── Synchronized Geometry ───────────────────────────────────────────

    /// Capture the current builder state as queryable geometry. Calling it
    /// again picks up later additions; nothing already built is dropped.
    #[instrument(skip(self), fields(model = %self.name))]
    pub fn synchronize(&mut self) {
        self.synced = Some(GeoModel::synchronize(&self.registry, &self.groups, &self.config));
    }

    pub fn is_synchronized(&self) -> bool {
        self.synced.is_some()
    }

    pub fn geo(&self) -> Result<&GeoModel> {
        self.synced.as_ref().ok_or(ModelError::NotSynchronized)
    }

    pub fn get_value(&self, dim: Dim, tag: Tag, params: &[f64]) -> Result<Point3d> {
        self.geo()?.get_value(dim, tag, params)
    }

    pub fn get_entities(&self, dim: Option<Dim>) -> Result<Vec<EntityRef>> {
        Ok(self.geo()?.get_entities(dim))
    }

    pub fn get_boundary(&self, entity: EntityRef) -> Result<Vec<EntityRef>> {
        self.geo()?.get_boundary(entity)
    }

    pub fn get_bounding_box(&self, entity: EntityRef) -> Result<BoundingBox> {
        self.geo()?.get_bounding_box(entity)
    }

    // ─── Diagnostics & Meshing ───────────────────────────────────────────

    pub fn audit_volume(&self, tag: Tag) -> Result<VolumeAudit> {
        Ok(audit_volume(&self.registry, self.registry.volume_id(tag)?))
    }

    pub fn mesh_input(&self) -> Result<MeshInput> {
        MeshInput::from_geo(self.geo()?)
    }

    #[instrument(skip(self, generator), fields(model = %self.name))]
    pub fn generate_mesh<G: MeshGenerator>(
        &self,
        generator: &mut G,
        dim: Dim,
    ) -> Result<G::Output> {
        let input = self.mesh_input()?;
        let out = generator.generate(&input, dim)?;
        info!(points = input.points.len(), ?dim, "mesh generated");
        Ok(out)
    }
}
