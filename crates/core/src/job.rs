//! Job outcomes as reported by the engine.

use serde::{Deserialize, Serialize};

/// Result of a finished job.
///
/// The `Display` form is the engine's own rendering (`JobSucceeded`,
/// `JobFailed`), which is what ends up in breadcrumb data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobResult {
    Succeeded,
    Failed {
        #[serde(default)]
        reason: Option<String>,
    },
}

impl JobResult {
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: Some(reason.into()),
        }
    }
}

impl core::fmt::Display for JobResult {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Succeeded => f.write_str("JobSucceeded"),
            Self::Failed { .. } => f.write_str("JobFailed"),
        }
    }
}
