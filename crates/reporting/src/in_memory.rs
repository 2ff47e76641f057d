//! In-memory reporting client for tests/dev.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use crate::breadcrumb::Breadcrumb;
use crate::client::Reporter;
use crate::processor::{EventProcessor, Hint, ProcessorId};
use crate::report::Report;

/// Options for [`InMemoryReporter`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReporterOptions {
    /// Breadcrumbs kept in the ring buffer; older ones are evicted.
    pub max_breadcrumbs: usize,
}

impl Default for ReporterOptions {
    fn default() -> Self {
        Self {
            max_breadcrumbs: 100,
        }
    }
}

/// Reporting client that keeps everything in process memory.
///
/// - Breadcrumbs go to a bounded FIFO
/// - Processors run in registration order on [`InMemoryReporter::capture`]
/// - Captured reports are kept for inspection
pub struct InMemoryReporter {
    options: ReporterOptions,
    integrations: Mutex<HashSet<String>>,
    breadcrumbs: Mutex<VecDeque<Breadcrumb>>,
    processors: Mutex<Vec<(ProcessorId, EventProcessor)>>,
    next_processor: AtomicU64,
    captured: Mutex<Vec<Report>>,
}

impl InMemoryReporter {
    pub fn new() -> Self {
        Self::with_options(ReporterOptions::default())
    }

    pub fn with_options(options: ReporterOptions) -> Self {
        Self {
            options,
            integrations: Mutex::new(HashSet::new()),
            breadcrumbs: Mutex::new(VecDeque::new()),
            processors: Mutex::new(Vec::new()),
            next_processor: AtomicU64::new(0),
            captured: Mutex::new(Vec::new()),
        }
    }

    /// Builder-style: enable an integration by name.
    pub fn with_integration(self, name: impl Into<String>) -> Self {
        self.enable_integration(name);
        self
    }

    pub fn enable_integration(&self, name: impl Into<String>) {
        lock(&self.integrations).insert(name.into());
    }

    pub fn disable_integration(&self, name: &str) {
        lock(&self.integrations).remove(name);
    }

    /// Run processors over `report`, attach breadcrumbs, and store it.
    ///
    /// Returns the event id, or `None` if a processor dropped the report.
    pub fn capture(&self, report: Report) -> Option<Uuid> {
        self.capture_with_hint(report, &Hint::default())
    }

    pub fn capture_with_hint(&self, mut report: Report, hint: &Hint) -> Option<Uuid> {
        report.breadcrumbs.extend(self.breadcrumbs());

        // Snapshot so processors may register further processors.
        let processors: Vec<EventProcessor> =
            lock(&self.processors).iter().map(|(_, p)| p.clone()).collect();
        for processor in processors {
            match processor(report, hint) {
                Some(next) => report = next,
                None => {
                    debug!("report dropped by event processor");
                    return None;
                }
            }
        }

        let id = report.event_id;
        lock(&self.captured).push(report);
        Some(id)
    }

    pub fn breadcrumbs(&self) -> Vec<Breadcrumb> {
        lock(&self.breadcrumbs).iter().cloned().collect()
    }

    pub fn captured(&self) -> Vec<Report> {
        lock(&self.captured).clone()
    }

    pub fn processor_count(&self) -> usize {
        lock(&self.processors).len()
    }

    pub fn clear_breadcrumbs(&self) {
        lock(&self.breadcrumbs).clear();
    }
}

impl Default for InMemoryReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for InMemoryReporter {
    fn add_breadcrumb(&self, breadcrumb: Breadcrumb) {
        if self.options.max_breadcrumbs == 0 {
            return;
        }
        let mut crumbs = lock(&self.breadcrumbs);
        while crumbs.len() >= self.options.max_breadcrumbs {
            crumbs.pop_front();
        }
        crumbs.push_back(breadcrumb);
    }

    fn add_event_processor(&self, processor: EventProcessor) -> ProcessorId {
        let id = ProcessorId::new(self.next_processor.fetch_add(1, Ordering::Relaxed));
        lock(&self.processors).push((id, processor));
        id
    }

    fn remove_event_processor(&self, id: ProcessorId) -> bool {
        let mut processors = lock(&self.processors);
        let before = processors.len();
        processors.retain(|(pid, _)| *pid != id);
        processors.len() != before
    }

    fn has_integration(&self, name: &str) -> bool {
        lock(&self.integrations).contains(name)
    }
}

impl core::fmt::Debug for InMemoryReporter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InMemoryReporter")
            .field("options", &self.options)
            .field("breadcrumbs", &lock(&self.breadcrumbs).len())
            .field("processors", &self.processor_count())
            .finish()
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
