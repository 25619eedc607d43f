use crate::topology::entity::{Tag, TagSpace};

/// Errors raised by model operations. A failing operation leaves the model
/// exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("{space} tag {tag} already exists")]
    DuplicateTag { space: TagSpace, tag: Tag },

    #[error("{space} {tag} does not exist")]
    DanglingReference { space: TagSpace, tag: Tag },

    #[error("invalid tag {tag}: tags must be strictly positive")]
    InvalidTag { tag: Tag },

    #[error("curve loop does not close: curve {from} does not end where curve {to} starts")]
    OpenLoop { from: Tag, to: Tag },

    #[error("hole loop {hole} winds in the same direction as outer loop {outer}")]
    OrientationMismatch { outer: Tag, hole: Tag },

    #[error("surface loop is not closed: curve {curve} is bounded by {uses} surface use(s), expected 2")]
    UnclosedShell { curve: Tag, uses: usize },

    #[error("extrusion vector has zero length")]
    DegenerateSweep,

    #[error("model has not been synchronized")]
    NotSynchronized,

    #[error("session is not initialized")]
    NotInitialized,

    #[error("unknown model: {name}")]
    UnknownModel { name: String },

    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error("meshing failed: {reason}")]
    MeshingFailed { reason: String },

    #[error("serialization failed: {reason}")]
    Serialization { reason: String },
}

impl ModelError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        ModelError::InvalidArgument {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ModelError>;
