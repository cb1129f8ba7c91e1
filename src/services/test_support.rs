//! Fixtures shared by the service unit tests.

use std::sync::Arc;

use crate::{
    config::AppConfig,
    dao::{kv_store::MemoryKvStore, party::PartyRepository},
    services::{catalog::StaticCatalog, verification::RejectAllVerifier},
    state::{AppState, SharedState},
};

/// State backed by a fresh in-memory store, with the default configuration.
pub(crate) async fn party_state(catalog: StaticCatalog) -> (SharedState, MemoryKvStore) {
    party_state_with(AppConfig::default(), catalog).await
}

pub(crate) async fn party_state_with(
    config: AppConfig,
    catalog: StaticCatalog,
) -> (SharedState, MemoryKvStore) {
    let store = MemoryKvStore::new();
    let state = AppState::new(config, Arc::new(catalog), Arc::new(RejectAllVerifier));
    state.set_kv_store(Arc::new(store.clone())).await;
    (state, store)
}

/// Check the cross-record invariants against the current store content.
pub(crate) async fn assert_invariants(repo: &PartyRepository) {
    let active = repo.session_active().await.unwrap();
    let current = repo.current_song().await.unwrap();
    let participants = repo.participants().await.unwrap();
    let eligible = repo.eligible_voters().await.unwrap();
    let voted = repo.voted_users().await.unwrap();
    let queue = repo.queue().await.unwrap();
    let history = repo.history().await.unwrap();

    if current.is_none() {
        assert!(eligible.is_empty(), "eligible voters without current song");
        assert!(voted.is_empty(), "votes without current song");
    }
    for user in voted.keys() {
        assert!(eligible.contains(user), "{user} voted without being eligible");
    }
    for user in &eligible {
        assert!(
            participants.contains(user),
            "{user} is eligible but no longer participates"
        );
    }
    if !active {
        assert!(current.is_none(), "current song in closed session");
        assert!(queue.is_empty(), "queue in closed session");
        assert!(participants.is_empty(), "participants in closed session");
        assert!(history.is_empty(), "history in closed session");
    }
}
