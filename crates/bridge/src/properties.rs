use sparkcrumbs_engine::{Session, SessionError};

pub const APP_NAME_KEY: &str = "app_name";
pub const APPLICATION_ID_KEY: &str = "application_id";

/// Pushes driver identity into the session's worker-visible properties.
///
/// Remote workers read these to tag their own reports without asking the
/// driver. Writing the same values again is harmless.
#[derive(Debug, Clone, Default)]
pub struct PropertyPropagator {
    prefix: String,
}

impl PropertyPropagator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn key(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }

    /// Write `app_name` and `application_id`; does nothing without a session.
    pub fn propagate(&self, session: Option<&dyn Session>) -> Result<(), SessionError> {
        let Some(session) = session else {
            return Ok(());
        };

        session.set_local_property(&self.key(APP_NAME_KEY), &session.app_name()?)?;
        session.set_local_property(&self.key(APPLICATION_ID_KEY), &session.application_id()?)?;
        Ok(())
    }
}
