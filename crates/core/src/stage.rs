//! Stage descriptors carried by stage lifecycle events.

use serde::{Deserialize, Serialize};

use crate::error::FieldError;
use crate::field::RemoteField;
use crate::id::StageId;

/// Snapshot of a stage as seen by listeners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageInfo {
    stage_id: StageId,
    attempt_id: u32,
    name: String,
    #[serde(default)]
    failure_reason: RemoteField<String>,
}

impl StageInfo {
    pub fn new(stage_id: StageId, attempt_id: u32, name: impl Into<String>) -> Self {
        Self {
            stage_id,
            attempt_id,
            name: name.into(),
            failure_reason: RemoteField::Unset,
        }
    }

    pub fn with_failure_reason(mut self, reason: impl Into<String>) -> Self {
        self.failure_reason = RemoteField::Set(reason.into());
        self
    }

    pub fn with_failure_field(mut self, field: RemoteField<String>) -> Self {
        self.failure_reason = field;
        self
    }

    pub fn stage_id(&self) -> StageId {
        self.stage_id
    }

    pub fn attempt_id(&self) -> u32 {
        self.attempt_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Why the stage failed.
    ///
    /// `Err(FieldError::Empty)` means the stage finished without a failure.
    pub fn failure_reason(&self) -> Result<&str, FieldError> {
        self.failure_reason.get().map(String::as_str)
    }
}
