use crate::breadcrumb::Breadcrumb;
use crate::processor::{EventProcessor, ProcessorId};

/// The reporting client as seen by integrations.
///
/// Implementations are shared across threads and handle their own
/// synchronization. Every call is fire-and-forget.
pub trait Reporter: Send + Sync {
    /// Append a breadcrumb to the current scope.
    fn add_breadcrumb(&self, breadcrumb: Breadcrumb);

    /// Register a hook that runs on every report before it is sent.
    fn add_event_processor(&self, processor: EventProcessor) -> ProcessorId;

    /// Unregister a hook. Returns false if it was not registered.
    fn remove_event_processor(&self, id: ProcessorId) -> bool;

    /// Whether the named integration is enabled on this client.
    fn has_integration(&self, name: &str) -> bool;
}

impl<R> Reporter for std::sync::Arc<R>
where
    R: Reporter + ?Sized,
{
    fn add_breadcrumb(&self, breadcrumb: Breadcrumb) {
        (**self).add_breadcrumb(breadcrumb)
    }

    fn add_event_processor(&self, processor: EventProcessor) -> ProcessorId {
        (**self).add_event_processor(processor)
    }

    fn remove_event_processor(&self, id: ProcessorId) -> bool {
        (**self).remove_event_processor(id)
    }

    fn has_integration(&self, name: &str) -> bool {
        (**self).has_integration(name)
    }
}
