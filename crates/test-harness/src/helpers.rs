//! Helper functions: error type and entity reference constructors.

use brep_kernel::{EntityRef, ModelError, Tag};

// ── Error Type ──────────────────────────────────────────────────────────────

/// Unified error type for the test harness.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("step \"{step}\" failed: {source}")]
    Step {
        step: String,
        #[source]
        source: ModelError,
    },

    #[error("assertion failed: {detail}")]
    AssertionFailed { detail: String },

    #[error("oracle failure ({oracle}): {detail}")]
    OracleFailure { oracle: String, detail: String },

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("report serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

// ── Entity Reference Constructors ───────────────────────────────────────────

pub fn points(tags: &[Tag]) -> Vec<EntityRef> {
    tags.iter().map(|t| EntityRef::Point(*t)).collect()
}

pub fn curves(tags: &[Tag]) -> Vec<EntityRef> {
    tags.iter().map(|t| EntityRef::Curve(*t)).collect()
}

pub fn surfaces(tags: &[Tag]) -> Vec<EntityRef> {
    tags.iter().map(|t| EntityRef::Surface(*t)).collect()
}

/// Tags of `entities` that are volumes, in order.
pub fn volume_tags(entities: &[EntityRef]) -> Vec<Tag> {
    entities.iter().filter_map(|e| e.as_volume()).collect()
}
