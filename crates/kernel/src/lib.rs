pub mod config;
pub mod error;
pub mod geometry;
pub mod mesh;
pub mod model;
pub mod operations;
pub mod physical;
pub mod session;
pub mod sync;
pub mod topology;

// Re-export the tag-addressed surface at crate root for convenience.
pub use config::{ModelConfig, Tolerance};
pub use error::{ModelError, Result};
pub use geometry::point::Point3d;
pub use geometry::transform::BoundingBox;
pub use geometry::vector::Vec3;
pub use mesh::{MeshGenerator, MeshInput};
pub use model::Model;
pub use physical::GroupId;
pub use topology::audit::VolumeAudit;
pub use topology::builder::CurveType;
pub use topology::entity::{Dim, EntityRef, Sense, Tag, TagSpace};
