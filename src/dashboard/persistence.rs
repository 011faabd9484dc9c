use crate::dashboard::backend::DashboardBackend;
use crate::dashboard::config::default_template;
use crate::dashboard::model::DashboardState;
use crate::dashboard::store::DashboardStore;
use crate::session::Session;
use anyhow::{anyhow, Result};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(5);
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveLifecycle {
    Idle,
    /// A save fires once `due` has passed; new edits push `due` back.
    PendingSave { due: Instant },
    /// A write is in flight. `follow_up` holds the deadline of a save
    /// requested while it runs.
    Saving { follow_up: Option<Instant> },
}

impl SaveLifecycle {
    pub fn is_saving(self) -> bool {
        matches!(self, SaveLifecycle::Saving { .. })
    }
}

pub fn can_transition(from: SaveLifecycle, to: SaveLifecycle) -> bool {
    use SaveLifecycle::*;
    matches!(
        (from, to),
        (Idle, PendingSave { .. })
            | (Idle, Saving { .. })
            | (PendingSave { .. }, PendingSave { .. })
            | (PendingSave { .. }, Saving { .. })
            | (PendingSave { .. }, Idle)
            | (Saving { .. }, Saving { .. })
            | (Saving { .. }, Idle)
            | (Saving { .. }, PendingSave { .. })
    ) || from == to
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistenceConfig {
    pub debounce: Duration,
    pub retry_delay: Duration,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

/// User-visible outcome the presentation layer drains and displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceNotice {
    Saved,
    SaveFailed(String),
    LoadFailed(String),
    TemplateCreated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Server snapshot installed; carries sanitisation warnings.
    Loaded(Vec<String>),
    /// No snapshot existed; a role template was installed and marked dirty.
    Template,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveRequest {
    Started,
    /// A write is already in flight; this one runs right after it.
    Queued,
    /// Nothing unsaved.
    Clean,
}

struct InFlight {
    revision: u64,
    state: DashboardState,
    rx: Receiver<Result<()>>,
}

/// Bridges the store to the backend: debounced auto-save, explicit save,
/// one write in flight at a time, last writer wins.
pub struct PersistenceController {
    backend: Arc<dyn DashboardBackend>,
    user_id: String,
    config: PersistenceConfig,
    lifecycle: SaveLifecycle,
    seen_revision: u64,
    in_flight: Option<InFlight>,
    server_snapshot: Option<DashboardState>,
    notices: Vec<PersistenceNotice>,
    last_error: Option<String>,
    writes: u64,
}

impl PersistenceController {
    pub fn new(
        backend: Arc<dyn DashboardBackend>,
        session: &Session,
        config: PersistenceConfig,
    ) -> Self {
        Self {
            backend,
            user_id: session.user_id.clone(),
            config,
            lifecycle: SaveLifecycle::Idle,
            seen_revision: 0,
            in_flight: None,
            server_snapshot: None,
            notices: Vec::new(),
            last_error: None,
            writes: 0,
        }
    }

    pub fn lifecycle(&self) -> SaveLifecycle {
        self.lifecycle
    }

    pub fn is_saving(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Number of writes handed to the backend.
    pub fn writes_issued(&self) -> u64 {
        self.writes
    }

    pub fn server_snapshot(&self) -> Option<&DashboardState> {
        self.server_snapshot.as_ref()
    }

    pub fn take_notices(&mut self) -> Vec<PersistenceNotice> {
        std::mem::take(&mut self.notices)
    }

    /// Fetch the server snapshot into the store, or install the role
    /// template when the user has none. A failed load leaves the store as is.
    pub fn load(&mut self, store: &mut DashboardStore, now: Instant) -> Result<LoadOutcome> {
        match self.backend.load_dashboard(&self.user_id) {
            Ok(Some(state)) => {
                let warnings = store.replace_all(state.clone());
                self.server_snapshot = Some(state);
                self.seen_revision = store.revision();
                self.transition(SaveLifecycle::Idle);
                self.last_error = None;
                tracing::info!(user = %self.user_id, widgets = store.widgets().len(), "dashboard loaded");
                Ok(LoadOutcome::Loaded(warnings))
            }
            Ok(None) => {
                let template = default_template(store.role(), store.registry());
                store.replace_all_unsaved(template);
                self.server_snapshot = None;
                self.seen_revision = store.revision();
                self.transition(SaveLifecycle::PendingSave { due: now });
                self.notices.push(PersistenceNotice::TemplateCreated);
                tracing::info!(user = %self.user_id, role = %store.role(), "no saved dashboard; using role template");
                Ok(LoadOutcome::Template)
            }
            Err(err) => {
                let message = format!("{err:#}");
                tracing::warn!(user = %self.user_id, error = %message, "dashboard load failed");
                self.notices.push(PersistenceNotice::LoadFailed(message.clone()));
                self.last_error = Some(message);
                Err(err)
            }
        }
    }

    /// Restart the debounce timer for an edit made at `now`.
    pub fn note_mutation(&mut self, now: Instant) {
        let due = now + self.config.debounce;
        let next = match self.lifecycle {
            SaveLifecycle::Saving { .. } => SaveLifecycle::Saving {
                follow_up: Some(due),
            },
            SaveLifecycle::Idle | SaveLifecycle::PendingSave { .. } => {
                SaveLifecycle::PendingSave { due }
            }
        };
        self.transition(next);
    }

    /// Advance the controller: collect a finished write, pick up store edits
    /// and fire the debounced save when due. Call once per event-loop turn.
    pub fn tick(&mut self, store: &mut DashboardStore, now: Instant) {
        self.poll_in_flight(store, now);
        self.observe_store(store, now);
        if let SaveLifecycle::PendingSave { due } = self.lifecycle {
            if now >= due {
                self.persist(store, now);
            }
        }
    }

    /// User-triggered save. Bypasses the debounce timer; queued behind a
    /// write that is already in flight.
    pub fn save_now(&mut self, store: &mut DashboardStore, now: Instant) -> SaveRequest {
        self.poll_in_flight(store, now);
        self.observe_store(store, now);
        if let SaveLifecycle::Saving { .. } = self.lifecycle {
            self.transition(SaveLifecycle::Saving {
                follow_up: Some(now),
            });
            return SaveRequest::Queued;
        }
        if !store.is_dirty() {
            self.transition(SaveLifecycle::Idle);
            return SaveRequest::Clean;
        }
        self.persist(store, now);
        SaveRequest::Started
    }

    /// Block until the in-flight write (if any) finishes. Returns false on timeout.
    pub fn wait_for_in_flight(&mut self, store: &mut DashboardStore, timeout: Duration) -> bool {
        let Some(in_flight) = &self.in_flight else {
            return true;
        };
        let result = match in_flight.rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => return false,
            Err(RecvTimeoutError::Disconnected) => {
                Err(anyhow!("dashboard save worker exited without reporting"))
            }
        };
        self.finish_save(store, result, Instant::now());
        true
    }

    /// Write any unsaved state and wait for it, e.g. on session end.
    pub fn flush(&mut self, store: &mut DashboardStore, timeout: Duration) -> Result<()> {
        if !self.wait_for_in_flight(store, timeout) {
            return Err(anyhow!("timed out waiting for dashboard save"));
        }
        if store.is_dirty() {
            self.save_now(store, Instant::now());
            if !self.wait_for_in_flight(store, timeout) {
                return Err(anyhow!("timed out waiting for dashboard save"));
            }
        }
        match &self.last_error {
            Some(err) if store.is_dirty() => Err(anyhow!("dashboard save failed: {err}")),
            _ => Ok(()),
        }
    }

    fn observe_store(&mut self, store: &DashboardStore, now: Instant) {
        if store.revision() != self.seen_revision {
            self.seen_revision = store.revision();
            self.note_mutation(now);
        }
    }

    fn poll_in_flight(&mut self, store: &mut DashboardStore, now: Instant) {
        let Some(in_flight) = &self.in_flight else {
            return;
        };
        let result = match in_flight.rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => {
                Err(anyhow!("dashboard save worker exited without reporting"))
            }
        };
        self.finish_save(store, result, now);
    }

    /// Single entry point for writes. Never runs while another write is in flight.
    fn persist(&mut self, store: &mut DashboardStore, now: Instant) {
        if self.in_flight.is_some() {
            return;
        }
        if !store.is_dirty() {
            self.transition(SaveLifecycle::Idle);
            return;
        }
        let (revision, state) = store.snapshot();
        if let Some(server) = &self.server_snapshot {
            if server.same_content(&state) {
                tracing::debug!(revision, "dashboard matches server snapshot; skipping write");
                store.mark_saved(revision);
                self.transition(SaveLifecycle::Idle);
                return;
            }
        }

        let (tx, rx) = mpsc::channel();
        let backend = Arc::clone(&self.backend);
        let user_id = self.user_id.clone();
        let payload = state.clone();
        let spawned = std::thread::Builder::new()
            .name("dashboard-save".into())
            .spawn(move || {
                let _ = tx.send(backend.save_dashboard(&user_id, &payload));
            });
        if let Err(err) = spawned {
            self.record_failure(anyhow!(err).context("spawn dashboard save worker"), None, now);
            return;
        }

        self.writes += 1;
        tracing::debug!(revision, widgets = state.widgets.len(), "dashboard save started");
        self.in_flight = Some(InFlight {
            revision,
            state,
            rx,
        });
        self.transition(SaveLifecycle::Saving { follow_up: None });
    }

    fn finish_save(&mut self, store: &mut DashboardStore, result: Result<()>, now: Instant) {
        let Some(in_flight) = self.in_flight.take() else {
            return;
        };
        let follow_up = match self.lifecycle {
            SaveLifecycle::Saving { follow_up } => follow_up,
            _ => None,
        };
        match result {
            Ok(()) => {
                let clean = store.mark_saved(in_flight.revision);
                tracing::info!(
                    user = %self.user_id,
                    revision = in_flight.revision,
                    clean,
                    "dashboard saved"
                );
                self.server_snapshot = Some(in_flight.state);
                self.last_error = None;
                self.notices.push(PersistenceNotice::Saved);
                match follow_up {
                    Some(due) => self.transition(SaveLifecycle::PendingSave { due }),
                    None => self.transition(SaveLifecycle::Idle),
                }
            }
            Err(err) => self.record_failure(err, follow_up, now),
        }
    }

    /// Keep local edits, surface the error and schedule a retry.
    fn record_failure(&mut self, err: anyhow::Error, follow_up: Option<Instant>, now: Instant) {
        let message = format!("{err:#}");
        tracing::warn!(user = %self.user_id, error = %message, "dashboard save failed");
        self.notices.push(PersistenceNotice::SaveFailed(message.clone()));
        self.last_error = Some(message);
        let retry = now + self.config.retry_delay;
        let due = follow_up.map(|d| d.min(retry)).unwrap_or(retry);
        self.transition(SaveLifecycle::PendingSave { due });
    }

    fn transition(&mut self, next: SaveLifecycle) {
        if !can_transition(self.lifecycle, next) {
            tracing::error!(from = ?self.lifecycle, to = ?next, "unexpected save lifecycle transition");
        }
        self.lifecycle = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::backend::MemoryBackend;
    use crate::dashboard::model::{Role, Theme};
    use crate::dashboard::store::WidgetOverrides;
    use crate::dashboard::widgets::WidgetRegistry;

    const WAIT: Duration = Duration::from_secs(5);

    fn setup(backend: Arc<MemoryBackend>) -> (DashboardStore, PersistenceController) {
        let session = Session::new("u-1", Role::Member);
        let store = DashboardStore::new(Arc::new(WidgetRegistry::with_defaults()), &session);
        let controller = PersistenceController::new(backend, &session, PersistenceConfig::default());
        (store, controller)
    }

    #[test]
    fn lifecycle_transitions() {
        let now = Instant::now();
        let pending = SaveLifecycle::PendingSave { due: now };
        let saving = SaveLifecycle::Saving { follow_up: None };
        assert!(can_transition(SaveLifecycle::Idle, pending));
        assert!(can_transition(pending, saving));
        assert!(can_transition(saving, SaveLifecycle::Idle));
        assert!(can_transition(saving, pending));
        assert!(can_transition(SaveLifecycle::Idle, SaveLifecycle::Idle));
    }

    #[test]
    fn missing_snapshot_installs_template_and_saves_it() {
        let backend = Arc::new(MemoryBackend::new());
        let (mut store, mut ctl) = setup(Arc::clone(&backend));
        let t0 = Instant::now();
        assert_eq!(ctl.load(&mut store, t0).unwrap(), LoadOutcome::Template);
        assert!(store.is_dirty());
        assert_eq!(ctl.take_notices(), vec![PersistenceNotice::TemplateCreated]);

        ctl.tick(&mut store, t0);
        assert!(ctl.is_saving());
        assert!(ctl.wait_for_in_flight(&mut store, WAIT));
        assert!(!store.is_dirty());
        assert_eq!(backend.save_count(), 1);
        assert!(backend.document("u-1").unwrap().same_content(store.state()));
    }

    #[test]
    fn edits_that_return_to_server_state_skip_the_write() {
        let backend = Arc::new(MemoryBackend::new());
        let (mut store, mut ctl) = setup(Arc::clone(&backend));
        let t0 = Instant::now();
        ctl.load(&mut store, t0).unwrap();
        ctl.tick(&mut store, t0);
        ctl.wait_for_in_flight(&mut store, WAIT);
        let original = store.theme();

        store.set_theme(Theme::Dark);
        ctl.tick(&mut store, t0);
        store.set_theme(original);
        ctl.tick(&mut store, t0 + Duration::from_secs(1));
        ctl.tick(&mut store, t0 + Duration::from_secs(7));
        assert!(!ctl.is_saving());
        assert!(!store.is_dirty());
        assert_eq!(ctl.writes_issued(), 1);
    }

    #[test]
    fn explicit_save_when_clean_is_a_no_op() {
        let backend = Arc::new(MemoryBackend::new());
        let (mut store, mut ctl) = setup(backend);
        assert_eq!(ctl.save_now(&mut store, Instant::now()), SaveRequest::Clean);
        store
            .add_widget("taskList", WidgetOverrides::default())
            .unwrap();
        assert_eq!(ctl.save_now(&mut store, Instant::now()), SaveRequest::Started);
        assert!(ctl.wait_for_in_flight(&mut store, WAIT));
        assert!(!store.is_dirty());
    }
}
