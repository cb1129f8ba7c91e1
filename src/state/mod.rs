/// Pure vote and ranking computations.
pub mod party;
/// Session phases and legal transitions.
pub mod state_machine;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock, watch};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dao::{kv_store::KvStore, party::PartyRepository},
    error::ServiceError,
    services::{catalog::Catalog, verification::RequestVerifier},
};

/// State handle cloned into every handler.
pub type SharedState = Arc<AppState>;

type VoteGateKey = (Uuid, String);

/// Central application state: the store handle, the collaborators and the vote gates.
///
/// Party data itself is never cached here; every request reads it from the store.
pub struct AppState {
    kv_store: RwLock<Option<Arc<dyn KvStore>>>,
    degraded: watch::Sender<bool>,
    config: Arc<AppConfig>,
    catalog: Arc<dyn Catalog>,
    verifier: Arc<dyn RequestVerifier>,
    vote_gates: DashMap<VoteGateKey, Arc<Mutex<()>>>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(
        config: AppConfig,
        catalog: Arc<dyn Catalog>,
        verifier: Arc<dyn RequestVerifier>,
    ) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            kv_store: RwLock::new(None),
            degraded: degraded_tx,
            config: Arc::new(config),
            catalog,
            verifier,
            vote_gates: DashMap::new(),
        })
    }

    /// Obtain a handle to the current store, if one is installed.
    pub async fn kv_store(&self) -> Option<Arc<dyn KvStore>> {
        let guard = self.kv_store.read().await;
        guard.as_ref().cloned()
    }

    /// Current store, or [`ServiceError::Degraded`] when none is usable.
    pub async fn require_kv_store(&self) -> Result<Arc<dyn KvStore>, ServiceError> {
        if *self.degraded.borrow() {
            return Err(ServiceError::Degraded);
        }
        self.kv_store().await.ok_or(ServiceError::Degraded)
    }

    /// Typed repository over the current store.
    pub async fn repository(&self) -> Result<PartyRepository, ServiceError> {
        self.require_kv_store().await.map(PartyRepository::new)
    }

    /// Install a new store implementation and leave degraded mode.
    pub async fn set_kv_store(&self, store: Arc<dyn KvStore>) {
        {
            let mut guard = self.kv_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false).await;
    }

    /// Remove the current store and enter degraded mode.
    pub async fn clear_kv_store(&self) {
        {
            let mut guard = self.kv_store.write().await;
            guard.take();
        }
        self.update_degraded(true).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        if self.kv_store.read().await.is_none() {
            return true;
        }
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub async fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }

    /// Configuration loaded at startup.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Track metadata source.
    pub fn catalog(&self) -> &Arc<dyn Catalog> {
        &self.catalog
    }

    /// Interaction signature check.
    pub fn verifier(&self) -> &Arc<dyn RequestVerifier> {
        &self.verifier
    }

    /// Gate serializing vote mutations on one track of one session.
    pub fn vote_gate(&self, session_id: Uuid, track_id: &str) -> Arc<Mutex<()>> {
        self.vote_gates
            .entry((session_id, track_id.to_owned()))
            .or_default()
            .clone()
    }

    /// Hand back a gate obtained from [`AppState::vote_gate`] once its guard is dropped.
    ///
    /// The map entry is removed when nobody else holds or waits on it, so the map only
    /// ever contains gates of requests in flight.
    pub fn release_vote_gate(&self, session_id: Uuid, track_id: &str, gate: Arc<Mutex<()>>) {
        self.vote_gates
            .remove_if(&(session_id, track_id.to_owned()), |_, entry| {
                Arc::ptr_eq(entry, &gate) && Arc::strong_count(entry) == 2
            });
    }

    /// Drop every idle gate belonging to `session_id`.
    pub fn release_session_gates(&self, session_id: Uuid) {
        self.vote_gates
            .retain(|(session, _), gate| *session != session_id || Arc::strong_count(gate) > 1);
    }

    #[cfg(test)]
    pub(crate) fn vote_gate_count(&self) -> usize {
        self.vote_gates.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dao::kv_store::MemoryKvStore,
        services::{catalog::StaticCatalog, verification::RejectAllVerifier},
    };

    fn state() -> SharedState {
        AppState::new(
            AppConfig::default(),
            Arc::new(StaticCatalog::new()),
            Arc::new(RejectAllVerifier),
        )
    }

    #[tokio::test]
    async fn starts_degraded_until_store_installed() {
        let state = state();
        assert!(state.is_degraded().await);
        assert!(matches!(
            state.repository().await,
            Err(ServiceError::Degraded)
        ));

        let mut watcher = state.degraded_watcher();
        state.set_kv_store(Arc::new(MemoryKvStore::new())).await;
        assert!(!state.is_degraded().await);
        assert!(watcher.has_changed().unwrap());
        assert!(!*watcher.borrow_and_update());

        state.clear_kv_store().await;
        assert!(state.is_degraded().await);
    }

    #[tokio::test]
    async fn vote_gates_are_shared_per_track_and_released_when_idle() {
        let state = state();
        let session = Uuid::new_v4();
        let first = state.vote_gate(session, "t1");
        let again = state.vote_gate(session, "t1");
        assert!(Arc::ptr_eq(&first, &again));

        let other = state.vote_gate(session, "t2");
        assert!(!Arc::ptr_eq(&first, &other));
        let foreign = state.vote_gate(Uuid::new_v4(), "t1");
        assert_eq!(state.vote_gate_count(), 3);

        // Another holder still waits on t1.
        state.release_vote_gate(session, "t1", first);
        assert_eq!(state.vote_gate_count(), 3);
        state.release_vote_gate(session, "t1", again);
        assert_eq!(state.vote_gate_count(), 2);

        drop(other);
        state.release_session_gates(session);
        assert_eq!(state.vote_gate_count(), 1);
        drop(foreign);
    }

    #[tokio::test]
    async fn released_gate_is_recreated_fresh() {
        let state = state();
        let session = Uuid::new_v4();
        let gate = state.vote_gate(session, "t1");
        let stale = Arc::downgrade(&gate);
        {
            let _guard = gate.lock().await;
        }
        state.release_vote_gate(session, "t1", gate);
        assert_eq!(state.vote_gate_count(), 0);
        assert!(stale.upgrade().is_none());

        let fresh = state.vote_gate(session, "t1");
        assert!(fresh.try_lock().is_ok());
    }
}
