use std::collections::{BTreeMap, HashSet};

use slotmap::{SlotMap, new_key_type};

use super::entity::{Dim, EntityRef, Sense, Tag, TagSpace};
use crate::error::{ModelError, Result};
use crate::geometry::point::Point3d;

// ─── Arena Keys ──────────────────────────────────────────────────────────────

new_key_type! {
    pub struct PointId;
    pub struct CurveId;
    pub struct CurveLoopId;
    pub struct SurfaceId;
    pub struct SurfaceLoopId;
    pub struct VolumeId;
}

// ─── Entities ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub tag: Tag,
    pub position: Point3d,
    /// Target mesh element size near this point.
    pub mesh_size: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CurveKind {
    Line,
    CircleArc { center: PointId },
    Spline { interior: Vec<PointId> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    pub tag: Tag,
    pub kind: CurveKind,
    pub start: PointId,
    pub end: PointId,
}

impl Curve {
    /// Every point the curve geometry depends on, start first, end last.
    pub fn defining_points(&self) -> Vec<PointId> {
        let mut pts = vec![self.start];
        match &self.kind {
            CurveKind::Line => {}
            CurveKind::CircleArc { center } => pts.push(*center),
            CurveKind::Spline { interior } => pts.extend(interior.iter().copied()),
        }
        pts.push(self.end);
        pts
    }

    pub fn is_closed(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OrientedCurve {
    pub curve: CurveId,
    pub sense: Sense,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CurveLoop {
    pub tag: Tag,
    pub curves: Vec<OrientedCurve>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    /// Flat surface bounded by an outer loop and optional holes.
    Plane,
    /// Transfinite patch over a three- or four-sided loop.
    Filling,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pub tag: Tag,
    pub kind: SurfaceKind,
    pub outer: CurveLoopId,
    pub holes: Vec<CurveLoopId>,
}

impl Surface {
    pub fn loops(&self) -> impl Iterator<Item = CurveLoopId> + '_ {
        std::iter::once(self.outer).chain(self.holes.iter().copied())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceLoop {
    pub tag: Tag,
    pub surfaces: Vec<SurfaceId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    pub tag: Tag,
    pub outer: SurfaceLoopId,
    pub cavities: Vec<SurfaceLoopId>,
}

impl Volume {
    pub fn shells(&self) -> impl Iterator<Item = SurfaceLoopId> + '_ {
        std::iter::once(self.outer).chain(self.cavities.iter().copied())
    }
}

/// Arena key of an elementary entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKey {
    Point(PointId),
    Curve(CurveId),
    Surface(SurfaceId),
    Volume(VolumeId),
}

// ─── Tag Index ───────────────────────────────────────────────────────────────

/// Ordered map from the tags of one namespace to arena keys.
#[derive(Debug, Clone)]
pub struct TagIndex<K> {
    space: TagSpace,
    by_tag: BTreeMap<Tag, K>,
}

impl<K: Copy> TagIndex<K> {
    fn new(space: TagSpace) -> Self {
        Self {
            space,
            by_tag: BTreeMap::new(),
        }
    }

    /// One past the largest tag in use, starting at 1.
    pub fn next_free(&self) -> Tag {
        self.by_tag
            .keys()
            .next_back()
            .map_or(1, |t| t.saturating_add(1))
    }

    pub fn contains(&self, tag: Tag) -> bool {
        self.by_tag.contains_key(&tag)
    }

    pub fn resolve(&self, tag: Tag) -> Result<K> {
        self.by_tag
            .get(&tag)
            .copied()
            .ok_or(ModelError::DanglingReference {
                space: self.space,
                tag,
            })
    }

    /// Validate a caller-supplied tag, or pick the next free one.
    pub fn claim(&self, requested: Option<Tag>) -> Result<Tag> {
        let tag = match requested {
            Some(t) if t <= 0 => return Err(ModelError::InvalidTag { tag: t }),
            Some(t) => t,
            None => self.next_free(),
        };
        if self.contains(tag) {
            return Err(ModelError::DuplicateTag {
                space: self.space,
                tag,
            });
        }
        Ok(tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Tag, K)> + '_ {
        self.by_tag.iter().map(|(t, k)| (*t, *k))
    }

    pub fn len(&self) -> usize {
        self.by_tag.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_tag.is_empty()
    }

    fn bind(&mut self, tag: Tag, key: K) {
        self.by_tag.insert(tag, key);
    }

    fn unbind(&mut self, tag: Tag) -> Option<K> {
        self.by_tag.remove(&tag)
    }
}

// ─── Entity Registry ─────────────────────────────────────────────────────────

/// Arena owning every entity of a model, indexed by tag per namespace.
///
/// Higher-dimensional entities hold arena keys of their dependencies, so a
/// coordinate change or a retag is seen by everything that refers to it.
#[derive(Debug, Clone)]
pub struct EntityRegistry {
    points: SlotMap<PointId, Point>,
    curves: SlotMap<CurveId, Curve>,
    curve_loops: SlotMap<CurveLoopId, CurveLoop>,
    surfaces: SlotMap<SurfaceId, Surface>,
    surface_loops: SlotMap<SurfaceLoopId, SurfaceLoop>,
    volumes: SlotMap<VolumeId, Volume>,

    point_tags: TagIndex<PointId>,
    curve_tags: TagIndex<CurveId>,
    curve_loop_tags: TagIndex<CurveLoopId>,
    surface_tags: TagIndex<SurfaceId>,
    surface_loop_tags: TagIndex<SurfaceLoopId>,
    volume_tags: TagIndex<VolumeId>,
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self {
            points: SlotMap::with_key(),
            curves: SlotMap::with_key(),
            curve_loops: SlotMap::with_key(),
            surfaces: SlotMap::with_key(),
            surface_loops: SlotMap::with_key(),
            volumes: SlotMap::with_key(),
            point_tags: TagIndex::new(TagSpace::Point),
            curve_tags: TagIndex::new(TagSpace::Curve),
            curve_loop_tags: TagIndex::new(TagSpace::CurveLoop),
            surface_tags: TagIndex::new(TagSpace::Surface),
            surface_loop_tags: TagIndex::new(TagSpace::SurfaceLoop),
            volume_tags: TagIndex::new(TagSpace::Volume),
        }
    }

    // --- Tags ---

    /// The tag an auto-tagged entity of `space` would receive right now.
    pub fn next_free_tag(&self, space: TagSpace) -> Tag {
        match space {
            TagSpace::Point => self.point_tags.next_free(),
            TagSpace::Curve => self.curve_tags.next_free(),
            TagSpace::CurveLoop => self.curve_loop_tags.next_free(),
            TagSpace::Surface => self.surface_tags.next_free(),
            TagSpace::SurfaceLoop => self.surface_loop_tags.next_free(),
            TagSpace::Volume => self.volume_tags.next_free(),
        }
    }

    pub fn claim_tag(&self, space: TagSpace, requested: Option<Tag>) -> Result<Tag> {
        match space {
            TagSpace::Point => self.point_tags.claim(requested),
            TagSpace::Curve => self.curve_tags.claim(requested),
            TagSpace::CurveLoop => self.curve_loop_tags.claim(requested),
            TagSpace::Surface => self.surface_tags.claim(requested),
            TagSpace::SurfaceLoop => self.surface_loop_tags.claim(requested),
            TagSpace::Volume => self.volume_tags.claim(requested),
        }
    }

    pub fn count(&self, dim: Dim) -> usize {
        match dim {
            Dim::Point => self.point_tags.len(),
            Dim::Curve => self.curve_tags.len(),
            Dim::Surface => self.surface_tags.len(),
            Dim::Volume => self.volume_tags.len(),
        }
    }

    /// Tags of `dim` in ascending order.
    pub fn tags(&self, dim: Dim) -> Vec<Tag> {
        match dim {
            Dim::Point => self.point_tags.iter().map(|(t, _)| t).collect(),
            Dim::Curve => self.curve_tags.iter().map(|(t, _)| t).collect(),
            Dim::Surface => self.surface_tags.iter().map(|(t, _)| t).collect(),
            Dim::Volume => self.volume_tags.iter().map(|(t, _)| t).collect(),
        }
    }

    pub fn entities(&self, dim: Dim) -> Vec<EntityRef> {
        self.tags(dim)
            .into_iter()
            .map(|t| EntityRef::new(dim, t))
            .collect()
    }

    pub fn contains(&self, entity: EntityRef) -> bool {
        self.resolve(entity).is_ok()
    }

    // --- Resolution ---

    pub fn point_id(&self, tag: Tag) -> Result<PointId> {
        self.point_tags.resolve(tag)
    }

    pub fn curve_id(&self, tag: Tag) -> Result<CurveId> {
        self.curve_tags.resolve(tag)
    }

    pub fn curve_loop_id(&self, tag: Tag) -> Result<CurveLoopId> {
        self.curve_loop_tags.resolve(tag)
    }

    pub fn surface_id(&self, tag: Tag) -> Result<SurfaceId> {
        self.surface_tags.resolve(tag)
    }

    pub fn surface_loop_id(&self, tag: Tag) -> Result<SurfaceLoopId> {
        self.surface_loop_tags.resolve(tag)
    }

    pub fn volume_id(&self, tag: Tag) -> Result<VolumeId> {
        self.volume_tags.resolve(tag)
    }

    pub fn resolve(&self, entity: EntityRef) -> Result<EntityKey> {
        Ok(match entity {
            EntityRef::Point(t) => EntityKey::Point(self.point_id(t)?),
            EntityRef::Curve(t) => EntityKey::Curve(self.curve_id(t)?),
            EntityRef::Surface(t) => EntityKey::Surface(self.surface_id(t)?),
            EntityRef::Volume(t) => EntityKey::Volume(self.volume_id(t)?),
        })
    }

    pub fn resolve_all(&self, entities: &[EntityRef]) -> Result<Vec<EntityKey>> {
        entities.iter().map(|e| self.resolve(*e)).collect()
    }

    /// Current tag of the entity behind `key`.
    pub fn entity_ref(&self, key: EntityKey) -> EntityRef {
        match key {
            EntityKey::Point(id) => EntityRef::Point(self.points[id].tag),
            EntityKey::Curve(id) => EntityRef::Curve(self.curves[id].tag),
            EntityKey::Surface(id) => EntityRef::Surface(self.surfaces[id].tag),
            EntityKey::Volume(id) => EntityRef::Volume(self.volumes[id].tag),
        }
    }

    // --- Access ---

    pub fn point(&self, id: PointId) -> &Point {
        &self.points[id]
    }

    pub fn point_mut(&mut self, id: PointId) -> &mut Point {
        &mut self.points[id]
    }

    pub fn curve(&self, id: CurveId) -> &Curve {
        &self.curves[id]
    }

    pub fn curve_loop(&self, id: CurveLoopId) -> &CurveLoop {
        &self.curve_loops[id]
    }

    pub fn surface(&self, id: SurfaceId) -> &Surface {
        &self.surfaces[id]
    }

    pub fn surface_loop(&self, id: SurfaceLoopId) -> &SurfaceLoop {
        &self.surface_loops[id]
    }

    pub fn volume(&self, id: VolumeId) -> &Volume {
        &self.volumes[id]
    }

    pub fn curve_loops(&self) -> impl Iterator<Item = (Tag, CurveLoopId)> + '_ {
        self.curve_loop_tags.iter()
    }

    pub fn surface_loops(&self) -> impl Iterator<Item = (Tag, SurfaceLoopId)> + '_ {
        self.surface_loop_tags.iter()
    }

    /// Start and end points of a curve as traversed with `oc.sense`.
    pub fn oriented_endpoints(&self, oc: OrientedCurve) -> (PointId, PointId) {
        let c = &self.curves[oc.curve];
        match oc.sense {
            Sense::Forward => (c.start, c.end),
            Sense::Reversed => (c.end, c.start),
        }
    }

    /// Signed tag of an oriented curve, as written in a curve loop.
    pub fn signed_tag(&self, oc: OrientedCurve) -> Tag {
        oc.sense.sign(self.curves[oc.curve].tag)
    }

    // --- Insertion (callers validate and claim tags first) ---

    pub(crate) fn insert_point(&mut self, point: Point) -> PointId {
        let tag = point.tag;
        let id = self.points.insert(point);
        self.point_tags.bind(tag, id);
        id
    }

    pub(crate) fn insert_curve(&mut self, curve: Curve) -> CurveId {
        let tag = curve.tag;
        let id = self.curves.insert(curve);
        self.curve_tags.bind(tag, id);
        id
    }

    pub(crate) fn insert_curve_loop(&mut self, curve_loop: CurveLoop) -> CurveLoopId {
        let tag = curve_loop.tag;
        let id = self.curve_loops.insert(curve_loop);
        self.curve_loop_tags.bind(tag, id);
        id
    }

    pub(crate) fn insert_surface(&mut self, surface: Surface) -> SurfaceId {
        let tag = surface.tag;
        let id = self.surfaces.insert(surface);
        self.surface_tags.bind(tag, id);
        id
    }

    pub(crate) fn insert_surface_loop(&mut self, shell: SurfaceLoop) -> SurfaceLoopId {
        let tag = shell.tag;
        let id = self.surface_loops.insert(shell);
        self.surface_loop_tags.bind(tag, id);
        id
    }

    pub(crate) fn insert_volume(&mut self, volume: Volume) -> VolumeId {
        let tag = volume.tag;
        let id = self.volumes.insert(volume);
        self.volume_tags.bind(tag, id);
        id
    }

    /// Give an elementary entity a new tag. References held by loops,
    /// surfaces, volumes and groups are keys and stay valid.
    pub fn retag(&mut self, entity: EntityRef, new_tag: Tag) -> Result<()> {
        let key = self.resolve(entity)?;
        let old = entity.tag();
        if old == new_tag {
            return Ok(());
        }
        self.claim_tag(entity.dim().into(), Some(new_tag))?;
        match key {
            EntityKey::Point(id) => {
                self.point_tags.unbind(old);
                self.point_tags.bind(new_tag, id);
                self.points[id].tag = new_tag;
            }
            EntityKey::Curve(id) => {
                self.curve_tags.unbind(old);
                self.curve_tags.bind(new_tag, id);
                self.curves[id].tag = new_tag;
            }
            EntityKey::Surface(id) => {
                self.surface_tags.unbind(old);
                self.surface_tags.bind(new_tag, id);
                self.surfaces[id].tag = new_tag;
            }
            EntityKey::Volume(id) => {
                self.volume_tags.unbind(old);
                self.volume_tags.bind(new_tag, id);
                self.volumes[id].tag = new_tag;
            }
        }
        Ok(())
    }

    // --- Traversal ---

    /// Points reachable from `keys` by descending through volumes, surface
    /// loops, surfaces, curve loops and curves. Each point appears once, in
    /// first-visit order.
    pub fn reachable_points(&self, keys: &[EntityKey]) -> Vec<PointId> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        let mut visit = |id: PointId| {
            if seen.insert(id) {
                out.push(id);
            }
        };
        for key in keys {
            for curve in self.reachable_curves(*key) {
                for p in self.curves[curve].defining_points() {
                    visit(p);
                }
            }
            if let EntityKey::Point(id) = key {
                visit(*id);
            }
        }
        out
    }

    /// Curves bounding `key`, descending through all lower dimensions.
    pub fn reachable_curves(&self, key: EntityKey) -> Vec<CurveId> {
        match key {
            EntityKey::Point(_) => Vec::new(),
            EntityKey::Curve(id) => vec![id],
            EntityKey::Surface(id) => self.surface_curves(id),
            EntityKey::Volume(id) => self.volumes[id]
                .shells()
                .flat_map(|shell| self.surface_loops[shell].surfaces.clone())
                .flat_map(|s| self.surface_curves(s))
                .collect(),
        }
    }

    fn surface_curves(&self, id: SurfaceId) -> Vec<CurveId> {
        self.surfaces[id]
            .loops()
            .flat_map(|l| self.curve_loops[l].curves.iter().map(|oc| oc.curve))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(reg: &mut EntityRegistry, tag: Tag, x: f64) -> PointId {
        reg.insert_point(Point {
            tag,
            position: Point3d::new(x, 0.0, 0.0),
            mesh_size: None,
        })
    }

    #[test]
    fn test_next_free_tag_is_max_plus_one() {
        let mut reg = EntityRegistry::new();
        assert_eq!(reg.next_free_tag(TagSpace::Point), 1);
        point(&mut reg, 1, 0.0);
        point(&mut reg, 7, 1.0);
        assert_eq!(reg.next_free_tag(TagSpace::Point), 8);
        // Other namespaces are independent.
        assert_eq!(reg.next_free_tag(TagSpace::Curve), 1);
        assert_eq!(reg.next_free_tag(TagSpace::CurveLoop), 1);
    }

    #[test]
    fn test_claim_rejects_duplicates_and_non_positive() {
        let mut reg = EntityRegistry::new();
        point(&mut reg, 3, 0.0);
        assert_eq!(
            reg.claim_tag(TagSpace::Point, Some(3)),
            Err(ModelError::DuplicateTag {
                space: TagSpace::Point,
                tag: 3
            })
        );
        assert_eq!(
            reg.claim_tag(TagSpace::Point, Some(0)),
            Err(ModelError::InvalidTag { tag: 0 })
        );
        assert_eq!(reg.claim_tag(TagSpace::Point, None), Ok(4));
        assert_eq!(reg.claim_tag(TagSpace::Curve, Some(3)), Ok(3));
    }

    #[test]
    fn test_resolve_dangling() {
        let reg = EntityRegistry::new();
        assert_eq!(
            reg.resolve(EntityRef::Curve(5)),
            Err(ModelError::DanglingReference {
                space: TagSpace::Curve,
                tag: 5
            })
        );
    }

    #[test]
    fn test_retag_keeps_references() {
        let mut reg = EntityRegistry::new();
        let a = point(&mut reg, 1, 0.0);
        let b = point(&mut reg, 2, 1.0);
        let c = reg.insert_curve(Curve {
            tag: 1,
            kind: CurveKind::Line,
            start: a,
            end: b,
        });
        reg.retag(EntityRef::Point(2), 20).unwrap();
        assert!(!reg.contains(EntityRef::Point(2)));
        assert_eq!(reg.point_id(20).unwrap(), b);
        assert_eq!(reg.point(reg.curve(c).end).tag, 20);
        assert!(matches!(
            reg.retag(EntityRef::Point(1), 20),
            Err(ModelError::DuplicateTag { .. })
        ));
    }

    #[test]
    fn test_reachable_points_dedup() {
        let mut reg = EntityRegistry::new();
        let a = point(&mut reg, 1, 0.0);
        let b = point(&mut reg, 2, 1.0);
        let c = point(&mut reg, 3, 2.0);
        let l1 = reg.insert_curve(Curve {
            tag: 1,
            kind: CurveKind::Line,
            start: a,
            end: b,
        });
        let l2 = reg.insert_curve(Curve {
            tag: 2,
            kind: CurveKind::Line,
            start: b,
            end: c,
        });
        let pts = reg.reachable_points(&[
            EntityKey::Curve(l1),
            EntityKey::Curve(l2),
            EntityKey::Point(a),
        ]);
        assert_eq!(pts, vec![a, b, c]);
    }
}
