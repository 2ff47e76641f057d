use std::collections::BTreeMap;
use std::sync::Arc;

use crate::report::Report;

/// Extra context handed to processors alongside a report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hint {
    pub values: BTreeMap<String, serde_json::Value>,
}

impl Hint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.values.insert(key.into(), value);
        self
    }
}

/// Report hook. Returning `None` drops the report.
pub type EventProcessor = Arc<dyn Fn(Report, &Hint) -> Option<Report> + Send + Sync>;

/// Handle to a registered [`EventProcessor`], used to unregister it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ProcessorId(u64);

impl ProcessorId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(&self) -> u64 {
        self.0
    }
}
