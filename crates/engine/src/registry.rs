use std::sync::{Arc, PoisonError, RwLock};

use sparkcrumbs_core::SessionId;

use crate::session::Session;

/// Read access to the currently active session, if any.
pub trait SessionAccessor: Send + Sync {
    fn active(&self) -> Option<Arc<dyn Session>>;
}

/// Process-wide slot holding the active session.
///
/// At most one session is active at a time; starting a new one replaces the
/// previous entry.
#[derive(Default)]
pub struct SessionRegistry {
    active: RwLock<Option<Arc<dyn Session>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `session` the active one, returning the session it replaced.
    pub fn set_active(&self, session: Arc<dyn Session>) -> Option<Arc<dyn Session>> {
        let mut slot = self.active.write().unwrap_or_else(PoisonError::into_inner);
        slot.replace(session)
    }

    /// Clear the slot only if it still holds session `id`.
    pub fn clear_if(&self, id: SessionId) -> bool {
        let mut slot = self.active.write().unwrap_or_else(PoisonError::into_inner);
        match slot.as_ref() {
            Some(s) if s.id() == id => {
                *slot = None;
                true
            }
            _ => false,
        }
    }

    pub fn active_id(&self) -> Option<SessionId> {
        self.active().map(|s| s.id())
    }
}

impl SessionAccessor for SessionRegistry {
    fn active(&self) -> Option<Arc<dyn Session>> {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl<A> SessionAccessor for Arc<A>
where
    A: SessionAccessor + ?Sized,
{
    fn active(&self) -> Option<Arc<dyn Session>> {
        (**self).active()
    }
}

impl core::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("active", &self.active_id())
            .finish()
    }
}
