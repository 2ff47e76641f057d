//! Optional values owned by the engine.

use serde::{Deserialize, Serialize};

use crate::error::FieldError;

/// A value held on the engine side that may be unset.
///
/// Reading goes through [`RemoteField::get`], which keeps "not set" and
/// "could not read" as two separate outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteField<T> {
    Set(T),
    Unset,
    /// The engine handle failed while resolving the field.
    Unreachable(String),
}

impl<T> RemoteField<T> {
    pub fn get(&self) -> Result<&T, FieldError> {
        match self {
            Self::Set(v) => Ok(v),
            Self::Unset => Err(FieldError::Empty),
            Self::Unreachable(msg) => Err(FieldError::unreachable(msg.clone())),
        }
    }

    pub fn is_set(&self) -> bool {
        matches!(self, Self::Set(_))
    }
}

impl<T> Default for RemoteField<T> {
    fn default() -> Self {
        Self::Unset
    }
}

impl<T> From<Option<T>> for RemoteField<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Self::Set(v),
            None => Self::Unset,
        }
    }
}
