//! Error-report model and the reporting client contract.
//!
//! The transport that ships reports off-process is not part of this crate.
//! [`Reporter`] is the surface the bridge writes to; [`InMemoryReporter`]
//! implements it for tests and local runs.

pub mod breadcrumb;
pub mod client;
pub mod in_memory;
pub mod processor;
pub mod report;

pub use breadcrumb::{Breadcrumb, Level};
pub use client::Reporter;
pub use in_memory::{InMemoryReporter, ReporterOptions};
pub use processor::{EventProcessor, Hint, ProcessorId};
pub use report::{Report, User};
