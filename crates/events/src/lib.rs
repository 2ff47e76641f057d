//! Engine lifecycle events and the listener contract.
//!
//! The engine publishes [`EngineEvent`]s on an [`EventBus`]; a
//! [`ListenerWorker`] drains a subscription and hands each event to an
//! [`EngineListener`] through [`dispatch`].

pub mod bus;
pub mod event;
pub mod in_memory_bus;
pub mod listener;
pub mod worker;

pub use bus::{EventBus, Poll, Subscription};
pub use event::*;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
pub use listener::{EngineListener, ListenerError, dispatch};
pub use worker::{ListenerWorker, WorkerHandle};
