use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Strictly positive identifier of an entity within its dimension. Signed so
/// that curve loops can carry orientation in the sign.
pub type Tag = i32;

/// Topological dimension of an elementary entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Dim {
    Point = 0,
    Curve = 1,
    Surface = 2,
    Volume = 3,
}

impl Dim {
    pub const ALL: [Dim; 4] = [Dim::Point, Dim::Curve, Dim::Surface, Dim::Volume];

    pub fn from_index(dim: i32) -> Result<Self> {
        match dim {
            0 => Ok(Dim::Point),
            1 => Ok(Dim::Curve),
            2 => Ok(Dim::Surface),
            3 => Ok(Dim::Volume),
            other => Err(ModelError::InvalidArgument {
                reason: format!("dimension must be 0..=3, got {other}"),
            }),
        }
    }

    pub fn index(self) -> i32 {
        self as i32
    }
}

/// A reference to an elementary entity, discriminated by dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityRef {
    Point(Tag),
    Curve(Tag),
    Surface(Tag),
    Volume(Tag),
}

impl EntityRef {
    pub fn new(dim: Dim, tag: Tag) -> Self {
        match dim {
            Dim::Point => EntityRef::Point(tag),
            Dim::Curve => EntityRef::Curve(tag),
            Dim::Surface => EntityRef::Surface(tag),
            Dim::Volume => EntityRef::Volume(tag),
        }
    }

    /// Build from a raw `(dim, tag)` pair, rejecting out-of-range dimensions.
    pub fn from_pair(dim: i32, tag: Tag) -> Result<Self> {
        Ok(Self::new(Dim::from_index(dim)?, tag))
    }

    pub fn dim(&self) -> Dim {
        match self {
            EntityRef::Point(_) => Dim::Point,
            EntityRef::Curve(_) => Dim::Curve,
            EntityRef::Surface(_) => Dim::Surface,
            EntityRef::Volume(_) => Dim::Volume,
        }
    }

    pub fn tag(&self) -> Tag {
        match *self {
            EntityRef::Point(t)
            | EntityRef::Curve(t)
            | EntityRef::Surface(t)
            | EntityRef::Volume(t) => t,
        }
    }

    pub fn to_pair(&self) -> (i32, Tag) {
        (self.dim().index(), self.tag())
    }

    pub fn as_point(&self) -> Option<Tag> {
        match *self {
            EntityRef::Point(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_curve(&self) -> Option<Tag> {
        match *self {
            EntityRef::Curve(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_surface(&self) -> Option<Tag> {
        match *self {
            EntityRef::Surface(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_volume(&self) -> Option<Tag> {
        match *self {
            EntityRef::Volume(t) => Some(t),
            _ => None,
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.dim().index(), self.tag())
    }
}

/// Independent tag namespaces. Loops are numbered separately from the
/// elementary entities they compose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TagSpace {
    Point,
    Curve,
    CurveLoop,
    Surface,
    SurfaceLoop,
    Volume,
}

impl From<Dim> for TagSpace {
    fn from(dim: Dim) -> Self {
        match dim {
            Dim::Point => TagSpace::Point,
            Dim::Curve => TagSpace::Curve,
            Dim::Surface => TagSpace::Surface,
            Dim::Volume => TagSpace::Volume,
        }
    }
}

impl fmt::Display for TagSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TagSpace::Point => "point",
            TagSpace::Curve => "curve",
            TagSpace::CurveLoop => "curve loop",
            TagSpace::Surface => "surface",
            TagSpace::SurfaceLoop => "surface loop",
            TagSpace::Volume => "volume",
        };
        f.write_str(name)
    }
}

/// Direction in which a loop traverses a curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sense {
    Forward,
    Reversed,
}

impl Sense {
    pub fn of(signed_tag: Tag) -> Self {
        if signed_tag < 0 { Sense::Reversed } else { Sense::Forward }
    }

    pub fn flip(self) -> Self {
        match self {
            Sense::Forward => Sense::Reversed,
            Sense::Reversed => Sense::Forward,
        }
    }

    pub fn sign(self, tag: Tag) -> Tag {
        match self {
            Sense::Forward => tag,
            Sense::Reversed => -tag,
        }
    }
}
