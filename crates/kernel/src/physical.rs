//! Physical groups and mesh-size hints.
//!
//! Groups classify entities without constraining topology. Members are held
//! as arena keys, so retagging a member is reflected in every group.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::error::{ModelError, Result};
use crate::topology::builder::check_mesh_size;
use crate::topology::entity::{Dim, EntityRef, Tag};
use crate::topology::registry::{EntityKey, EntityRegistry};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhysicalGroup {
    pub name: Option<String>,
    members: Vec<EntityKey>,
}

impl PhysicalGroup {
    pub fn member_keys(&self) -> &[EntityKey] {
        &self.members
    }
}

/// Identifier of a physical group: group tags are unique per dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupId {
    pub dim: Dim,
    pub tag: Tag,
}

#[derive(Debug, Clone, Default)]
pub struct PhysicalGroups {
    groups: BTreeMap<GroupId, PhysicalGroup>,
}

impl PhysicalGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `members` of dimension `dim` to a group. Without a tag a new
    /// group is created with the next free tag of that dimension; an
    /// existing tag gains the members it does not already hold.
    #[instrument(skip(self, reg))]
    pub fn add(
        &mut self,
        reg: &EntityRegistry,
        dim: Dim,
        members: &[Tag],
        tag: Option<Tag>,
        name: Option<&str>,
    ) -> Result<Tag> {
        let keys = members
            .iter()
            .map(|t| reg.resolve(EntityRef::new(dim, *t)))
            .collect::<Result<Vec<_>>>()?;
        let tag = match tag {
            Some(t) if t <= 0 => return Err(ModelError::InvalidTag { tag: t }),
            Some(t) => t,
            None => {
                let t = self.next_free_tag(dim);
                if self.groups.contains_key(&GroupId { dim, tag: t }) {
                    return Err(ModelError::invalid(format!(
                        "no free physical group tag in dimension {}",
                        dim.index()
                    )));
                }
                t
            }
        };
        let group = self.groups.entry(GroupId { dim, tag }).or_default();
        for key in keys {
            if !group.members.contains(&key) {
                group.members.push(key);
            }
        }
        if let Some(name) = name {
            group.name = Some(name.to_string());
        }
        debug!(tag, members = group.members.len(), "physical group updated");
        Ok(tag)
    }

    /// One past the largest group tag of `dim`, saturating at `Tag::MAX`.
    pub fn next_free_tag(&self, dim: Dim) -> Tag {
        self.groups
            .keys()
            .filter(|id| id.dim == dim)
            .map(|id| id.tag)
            .max()
            .map_or(1, |t| t.saturating_add(1))
    }

    /// Group identifiers, optionally restricted to one dimension, in
    /// (dimension, tag) order.
    pub fn list(&self, dim: Option<Dim>) -> Vec<GroupId> {
        self.groups
            .keys()
            .filter(|id| dim.is_none_or(|d| id.dim == d))
            .copied()
            .collect()
    }

    pub fn get(&self, dim: Dim, tag: Tag) -> Result<&PhysicalGroup> {
        self.groups.get(&GroupId { dim, tag }).ok_or_else(|| {
            ModelError::invalid(format!("physical group ({}, {tag}) does not exist", dim.index()))
        })
    }

    /// Current tags of the group's members, in insertion order.
    pub fn members(&self, reg: &EntityRegistry, dim: Dim, tag: Tag) -> Result<Vec<Tag>> {
        Ok(self
            .get(dim, tag)?
            .members
            .iter()
            .map(|k| reg.entity_ref(*k).tag())
            .collect())
    }

    pub fn name(&self, dim: Dim, tag: Tag) -> Result<Option<&str>> {
        Ok(self.get(dim, tag)?.name.as_deref())
    }

    pub fn set_name(&mut self, dim: Dim, tag: Tag, name: &str) -> Result<()> {
        self.get(dim, tag)?;
        if let Some(group) = self.groups.get_mut(&GroupId { dim, tag }) {
            group.name = Some(name.to_string());
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (GroupId, &PhysicalGroup)> + '_ {
        self.groups.iter().map(|(id, g)| (*id, g))
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Set the mesh size of every point in `entities`, overwriting any earlier
/// value. Entries of other dimensions are skipped. Returns the number of
/// points updated.
#[instrument(skip(reg))]
pub fn set_mesh_size(reg: &mut EntityRegistry, entities: &[EntityRef], size: f64) -> Result<usize> {
    check_mesh_size(size)?;
    let keys = reg.resolve_all(entities)?;
    let mut updated = 0;
    for (key, entity) in keys.iter().zip(entities) {
        match key {
            EntityKey::Point(id) => {
                reg.point_mut(*id).mesh_size = Some(size);
                updated += 1;
            }
            _ => warn!(%entity, "mesh size applies to points only, skipped"),
        }
    }
    Ok(updated)
}
