//! At-most-once installation of the bridge per session.

use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, Weak};

use tracing::{debug, info, warn};

use sparkcrumbs_core::SessionId;
use sparkcrumbs_engine::{Session, SessionAccessor};
use sparkcrumbs_events::EngineListener;
use sparkcrumbs_reporting::{ProcessorId, Reporter};

use crate::config::BridgeConfig;
use crate::enricher::EventEnricher;
use crate::error::BridgeError;
use crate::listener::BridgeListener;
use crate::properties::PropertyPropagator;

/// Outcome of [`ActivationGuard::activate`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Activation {
    /// Listener, properties and enricher were installed by this call.
    Installed,
    /// An earlier call already installed the bridge.
    AlreadyActive,
}

/// Per-session installation state.
enum Slot {
    /// A caller is installing right now; others wait on `settled`.
    Installing,
    Installed {
        session: Weak<dyn Session>,
        processor: ProcessorId,
    },
    /// Installation failed with the listener still attached.
    Stranded { session: Weak<dyn Session> },
}

impl Slot {
    fn session(&self) -> Option<&Weak<dyn Session>> {
        match self {
            Slot::Installing => None,
            Slot::Installed { session, .. } | Slot::Stranded { session } => Some(session),
        }
    }
}

/// An installation that failed part way.
struct Failure {
    error: BridgeError,
    /// The listener could not be detached again.
    stranded: bool,
}

impl Failure {
    fn clean(error: impl Into<BridgeError>) -> Self {
        Self {
            error: error.into(),
            stranded: false,
        }
    }
}

/// Owns the "bridge installed for session X" state.
///
/// A session id is claimed before any side effect, under one lock. While the
/// claimant installs, other callers for the same session wait for the
/// outcome: they see [`Activation::AlreadyActive`] if it succeeded and retry
/// the installation themselves if it failed. A failed installation detaches
/// the listener it added before releasing the claim.
///
/// Stopped or dropped sessions are forgotten (and their enrichers removed
/// from the reporter) on the next [`ActivationGuard::activate`] or
/// [`ActivationGuard::prune`].
pub struct ActivationGuard {
    reporter: Arc<dyn Reporter>,
    sessions: Arc<dyn SessionAccessor>,
    config: BridgeConfig,
    propagator: PropertyPropagator,
    slots: Mutex<HashMap<SessionId, Slot>>,
    settled: Condvar,
}

impl ActivationGuard {
    pub fn new(
        reporter: Arc<dyn Reporter>,
        sessions: Arc<dyn SessionAccessor>,
        config: BridgeConfig,
    ) -> Self {
        let propagator = PropertyPropagator::new(config.property_prefix.clone());
        Self {
            reporter,
            sessions,
            config,
            propagator,
            slots: Mutex::new(HashMap::new()),
            settled: Condvar::new(),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn reporter(&self) -> &Arc<dyn Reporter> {
        &self.reporter
    }

    /// Install the bridge for `session`: listener, then properties, then enricher.
    pub fn activate(&self, session: &Arc<dyn Session>) -> Result<Activation, BridgeError> {
        self.prune();

        let id = session.id();
        let Some(claim) = self.claim(id)? else {
            debug!(session_id = %id, "bridge already active for session");
            return Ok(Activation::AlreadyActive);
        };

        match self.install(session) {
            Ok(processor) => {
                claim.settle(Some(Slot::Installed {
                    session: Arc::downgrade(session),
                    processor,
                }));
                info!(session_id = %id, "bridge activated");
                Ok(Activation::Installed)
            }
            Err(Failure { error, stranded }) => {
                let slot = stranded.then(|| Slot::Stranded {
                    session: Arc::downgrade(session),
                });
                claim.settle(slot);
                warn!(session_id = %id, error = %error, stranded, "bridge activation failed");
                Err(error)
            }
        }
    }

    /// Forget sessions that were stopped or dropped and remove their
    /// enrichers from the reporter. Returns how many were forgotten.
    pub fn prune(&self) -> usize {
        let gone: Vec<(SessionId, Slot)> = {
            let mut slots = self.lock();
            let ids: Vec<SessionId> = slots
                .iter()
                .filter(|(_, slot)| {
                    slot.session()
                        .is_some_and(|s| s.upgrade().is_none_or(|s| s.is_stopped()))
                })
                .map(|(id, _)| *id)
                .collect();
            ids.into_iter()
                .filter_map(|id| slots.remove(&id).map(|slot| (id, slot)))
                .collect()
        };

        for (id, slot) in &gone {
            if let Slot::Installed { processor, .. } = slot {
                self.reporter.remove_event_processor(*processor);
            }
            debug!(session_id = %id, "forgot stopped session");
        }
        gone.len()
    }

    pub fn is_active(&self, id: SessionId) -> bool {
        matches!(self.lock().get(&id), Some(Slot::Installed { .. }))
    }

    pub fn active_sessions(&self) -> Vec<SessionId> {
        self.lock()
            .iter()
            .filter(|(_, slot)| matches!(slot, Slot::Installed { .. }))
            .map(|(id, _)| *id)
            .collect()
    }

    fn install(&self, session: &Arc<dyn Session>) -> Result<ProcessorId, Failure> {
        let listener: Arc<dyn EngineListener> = Arc::new(BridgeListener::new(
            self.reporter.clone(),
            self.sessions.clone(),
            self.propagator.clone(),
        ));
        session.add_listener(listener.clone()).map_err(Failure::clean)?;

        if let Err(err) = self.propagator.propagate(Some(&**session)) {
            return Err(self.detach(session, &listener, err.into()));
        }

        let enricher = EventEnricher::new(
            &self.reporter,
            self.sessions.clone(),
            session.id(),
            self.config.integration.clone(),
        );
        Ok(self.reporter.add_event_processor(enricher.into_processor()))
    }

    /// Undo `add_listener` after a later installation step failed.
    fn detach(
        &self,
        session: &Arc<dyn Session>,
        listener: &Arc<dyn EngineListener>,
        error: BridgeError,
    ) -> Failure {
        match session.remove_listener(listener) {
            Ok(_) => Failure::clean(error),
            Err(undo) => {
                warn!(session_id = %session.id(), error = %undo, "could not detach bridge listener");
                Failure {
                    error,
                    stranded: true,
                }
            }
        }
    }

    /// Claim `id` for installation, waiting out any installation in flight.
    /// `None` means the bridge is already installed.
    fn claim(&self, id: SessionId) -> Result<Option<Claim<'_>>, BridgeError> {
        let mut slots = self.lock();
        loop {
            match slots.get(&id) {
                Some(Slot::Installing) => {}
                Some(Slot::Installed { .. }) => return Ok(None),
                Some(Slot::Stranded { .. }) => return Err(BridgeError::Stranded(id)),
                None => {
                    slots.insert(id, Slot::Installing);
                    return Ok(Some(Claim {
                        guard: self,
                        id,
                        settled: false,
                    }));
                }
            }
            slots = self
                .settled
                .wait(slots)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SessionId, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A held `Installing` slot. Released on drop if never settled, so waiters
/// are not left hanging when installation unwinds.
struct Claim<'a> {
    guard: &'a ActivationGuard,
    id: SessionId,
    settled: bool,
}

impl Claim<'_> {
    /// Replace the `Installing` slot with `slot` (or remove it) and wake waiters.
    fn settle(mut self, slot: Option<Slot>) {
        self.release(slot);
        self.settled = true;
    }

    fn release(&self, slot: Option<Slot>) {
        let mut slots = self.guard.lock();
        match slot {
            Some(slot) => {
                slots.insert(self.id, slot);
            }
            None => {
                slots.remove(&self.id);
            }
        }
        drop(slots);
        self.guard.settled.notify_all();
    }
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.release(None);
        }
    }
}

impl core::fmt::Debug for ActivationGuard {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ActivationGuard")
            .field("config", &self.config)
            .field("activated", &self.active_sessions())
            .finish()
    }
}
