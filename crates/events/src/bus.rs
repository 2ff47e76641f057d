//! Publish/subscribe seam between the engine scheduler and its listeners.
//!
//! Every subscriber receives its own copy of each event, in publish order.
//! Breadcrumb ordering relies on that per-subscriber FIFO.

use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

/// Outcome of waiting on a [`Subscription`].
#[derive(Debug, PartialEq, Eq)]
pub enum Poll<M> {
    Message(M),
    /// Nothing arrived within the timeout.
    Idle,
    /// The bus dropped this subscriber.
    Closed,
}

/// Receiving end of a bus subscription.
///
/// ```ignore
/// let subscription = bus.subscribe();
/// loop {
///     match subscription.poll(Duration::from_millis(250)) {
///         Poll::Message(event) => dispatch(&listener, &event)?,
///         Poll::Idle => continue,
///         Poll::Closed => break,
///     }
/// }
/// ```
///
/// Owned by a single consuming thread.
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: Receiver<M>,
}

impl<M> Subscription<M> {
    pub(crate) fn new(receiver: Receiver<M>) -> Self {
        Self { receiver }
    }

    /// Wait up to `timeout` for the next message.
    pub fn poll(&self, timeout: Duration) -> Poll<M> {
        match self.receiver.recv_timeout(timeout) {
            Ok(message) => Poll::Message(message),
            Err(RecvTimeoutError::Timeout) => Poll::Idle,
            Err(RecvTimeoutError::Disconnected) => Poll::Closed,
        }
    }

    /// Block for the next message; `None` once the bus has dropped us.
    pub fn next_blocking(&self) -> Option<M> {
        self.receiver.recv().ok()
    }

    /// The next message, if one is already queued.
    pub fn try_next(&self) -> Option<M> {
        self.receiver.try_recv().ok()
    }

    /// Everything already queued, without waiting.
    pub fn drain(&self) -> impl Iterator<Item = M> + '_ {
        self.receiver.try_iter()
    }
}

/// Engine event bus.
///
/// ```text
/// scheduler ─publish─► EventBus ─► Subscription ─► ListenerWorker ─► EngineListener
/// ```
///
/// Shared across threads: the scheduler and task threads may publish
/// concurrently.
pub trait EventBus<M>: Send + Sync {
    type Error: core::fmt::Debug + core::fmt::Display + Send + Sync + 'static;

    /// Fan `message` out to the current subscribers. Returns how many got it.
    fn publish(&self, message: M) -> Result<usize, Self::Error>;

    fn subscribe(&self) -> Subscription<M>;
}

impl<M, B> EventBus<M> for Arc<B>
where
    B: EventBus<M> + ?Sized,
{
    type Error = B::Error;

    fn publish(&self, message: M) -> Result<usize, Self::Error> {
        (**self).publish(message)
    }

    fn subscribe(&self) -> Subscription<M> {
        (**self).subscribe()
    }
}
