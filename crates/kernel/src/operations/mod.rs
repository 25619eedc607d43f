//! Operations on sets of existing entities: rigid and affine transforms,
//! deep copies and extrusions.
//!
//! These functions validate their arguments up front but may register
//! entities before a later structural check fails. [`crate::Model`] runs
//! them against a scratch registry so a failure never leaks into the model.

pub mod copy;
pub mod extrude;
pub mod transform;

pub use copy::copy;
pub use extrude::extrude;
pub use transform::{dilate, mirror, rotate, translate};
