//! Engine-facing contract: sessions, their registry, and an in-memory engine.
//!
//! The bridge only ever talks to the engine through [`Session`] and
//! [`SessionAccessor`]. [`LocalSession`] is a process-local engine session
//! used by tests and local development.

pub mod conf;
pub mod error;
pub mod local;
pub mod registry;
pub mod session;

pub use error::SessionError;
pub use local::{LocalSession, SessionSettings};
pub use registry::{SessionAccessor, SessionRegistry};
pub use session::Session;
