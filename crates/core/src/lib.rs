//! `sparkcrumbs-core`: engine-side value types shared by every crate.
//!
//! This crate contains **pure data** (no threads, no IO): identifiers, job
//! outcomes, stage descriptors and the optional-remote-field convention used
//! when reading values that the engine may leave unset.

pub mod error;
pub mod field;
pub mod id;
pub mod job;
pub mod stage;

pub use error::FieldError;
pub use field::RemoteField;
pub use id::{JobId, SessionId, StageId};
pub use job::JobResult;
pub use stage::StageInfo;
