//! Test harness for the B-rep geometry builder.
//!
//! Replays the tutorial workflows step by step, verifies the model at every
//! step, and renders diagnostic output.
//!
//! # Key Components
//!
//! - [`ModelBuilder`]: Fluent wrapper over a model that records each step
//! - [`tutorials`]: Tutorial 1 and tutorial 2 replays
//! - [`oracle`]: Verification functions returning pass/fail verdicts
//! - [`report`]: Structured text model descriptions
//! - [`helpers`]: Error type and entity reference constructors
//! - [`assertions`]: Assertion helpers with diagnostics

pub mod assertions;
pub mod helpers;
pub mod oracle;
pub mod report;
pub mod tutorials;
pub mod workflow;

pub use helpers::HarnessError;
pub use oracle::OracleVerdict;
pub use report::ModelReport;
pub use workflow::ModelBuilder;
