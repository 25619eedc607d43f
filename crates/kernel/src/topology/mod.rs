pub mod audit;
pub mod builder;
pub mod entity;
pub mod registry;
pub mod shapes;

pub use entity::{Dim, EntityRef, Sense, Tag, TagSpace};
pub use registry::EntityRegistry;
