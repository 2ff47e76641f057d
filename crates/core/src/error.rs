//! Field read error model.

use thiserror::Error;

/// Why an optional engine-side field could not be read as a value.
///
/// `Empty` is the well-known "nothing set" outcome and callers branch on it.
/// `Unreachable` is a genuine fault talking to the engine and must not be
/// mistaken for `Empty`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// The field exists but holds no value.
    #[error("field is empty")]
    Empty,

    /// The value could not be fetched from the engine.
    #[error("field unreachable: {0}")]
    Unreachable(String),
}

impl FieldError {
    pub fn unreachable(msg: impl Into<String>) -> Self {
        Self::Unreachable(msg.into())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}
