//! Bridge from engine lifecycle events to the reporting client.
//!
//! ```text
//! InitializationInterceptor ── init ok ──► ActivationGuard::activate(session)
//!                                            ├─ Session::add_listener(BridgeListener)
//!                                            ├─ PropertyPropagator::propagate
//!                                            └─ Reporter::add_event_processor(EventEnricher)
//!
//! engine bus ──► BridgeListener ──► Reporter::add_breadcrumb
//! capture    ──► EventEnricher  ──► tags / extra / user filled if absent
//! ```
//!
//! Start from [`SparkIntegration::setup_once`].

pub mod config;
pub mod enricher;
pub mod error;
pub mod guard;
pub mod integration;
pub mod interceptor;
pub mod listener;
pub mod properties;

pub use config::BridgeConfig;
pub use enricher::EventEnricher;
pub use error::BridgeError;
pub use guard::{Activation, ActivationGuard};
pub use integration::SparkIntegration;
pub use interceptor::InitializationInterceptor;
pub use listener::BridgeListener;
pub use properties::PropertyPropagator;
