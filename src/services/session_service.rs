//! Opening and closing listening sessions.

use tokio::try_join;
use tracing::info;
use uuid::Uuid;

use crate::{
    dao::models::RosterEntity,
    dto::party::{SessionStarted, SessionSummary},
    error::{Rejection, ServiceError},
    services::catalog::parse_playlist_id,
    state::{
        SharedState,
        party::summarize,
        state_machine::{PartyEvent, SessionPhase, compute_transition},
    },
};

/// Open a session, optionally seeding the queue from a playlist reference.
///
/// Nothing is written when the reference is unreadable or resolves to no track.
pub async fn start_session(
    state: &SharedState,
    playlist: Option<&str>,
) -> Result<SessionStarted, ServiceError> {
    let repo = state.repository().await?;
    let (active, current) = try_join!(repo.session_active(), repo.current_song())?;
    compute_transition(
        SessionPhase::derive(active, current.is_some()),
        PartyEvent::StartSession,
    )?;

    let queue = match playlist {
        Some(reference) => {
            let playlist_id = parse_playlist_id(reference).ok_or(Rejection::InvalidReference)?;
            let tracks = state
                .catalog()
                .playlist_tracks(&playlist_id, state.config().playlist_limit)
                .await;
            if tracks.is_empty() {
                return Err(Rejection::EmptyOrInaccessible.into());
            }
            tracks
        }
        None => Vec::new(),
    };

    let session_id = Uuid::new_v4();
    repo.set_session_id(session_id).await?;
    repo.clear_current_song().await?;
    repo.clear_voted_users().await?;
    repo.clear_eligible_voters().await?;
    repo.clear_history().await?;
    repo.put_participants(&RosterEntity::new()).await?;
    repo.put_queue(&queue).await?;
    repo.set_session_active(true).await?;

    info!(%session_id, queue_size = queue.len(), "listening session started");
    Ok(SessionStarted {
        session_id,
        queue_size: queue.len(),
    })
}

/// Close the session and rank every track voted on during it.
pub async fn end_session(state: &SharedState) -> Result<SessionSummary, ServiceError> {
    let repo = state.repository().await?;
    let (active, current, history, session_id) = try_join!(
        repo.session_active(),
        repo.current_song(),
        repo.history(),
        repo.session_id()
    )?;
    compute_transition(
        SessionPhase::derive(active, current.is_some()),
        PartyEvent::EndSession,
    )?;

    repo.set_session_active(false).await?;
    repo.clear_queue().await?;
    repo.clear_participants().await?;
    repo.clear_eligible_voters().await?;
    repo.clear_voted_users().await?;
    repo.clear_history().await?;

    if let Some(session_id) = session_id {
        state.release_session_gates(session_id);
    }

    let tracks: Vec<_> = summarize(&history).into_iter().map(Into::into).collect();
    info!(
        session_id = ?session_id,
        rated_tracks = tracks.len(),
        "listening session ended"
    );
    Ok(SessionSummary { tracks })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dao::{
            kv_store::KvStore,
            models::{HistoryEntryEntity, TrackEntity},
        },
        services::{
            catalog::StaticCatalog,
            test_support::{assert_invariants, party_state},
        },
    };

    fn track(id: &str) -> TrackEntity {
        TrackEntity {
            id: id.into(),
            title: format!("Title {id}"),
            thumbnail: None,
        }
    }

    #[tokio::test]
    async fn start_resets_every_record() {
        let (state, store) = party_state(StaticCatalog::new()).await;
        store.insert_raw("SESSION_PARTICIPANTS", r#"["old"]"#);
        store.insert_raw("HISTORY", r#"{"x":{"title":"X","totalPoints":1,"voterCount":1,"participantCount":1}}"#);
        store.insert_raw("QUEUE", r#"[{"id":"x","title":"X"}]"#);

        let started = start_session(&state, None).await.unwrap();
        assert_eq!(started.queue_size, 0);

        let repo = state.repository().await.unwrap();
        assert!(repo.session_active().await.unwrap());
        assert_eq!(repo.session_id().await.unwrap(), Some(started.session_id));
        assert!(repo.participants().await.unwrap().is_empty());
        assert!(repo.history().await.unwrap().is_empty());
        assert!(repo.queue().await.unwrap().is_empty());
        assert_invariants(&repo).await;
    }

    #[tokio::test]
    async fn start_twice_is_rejected() {
        let (state, _store) = party_state(StaticCatalog::new()).await;
        start_session(&state, None).await.unwrap();
        assert!(matches!(
            start_session(&state, None).await,
            Err(ServiceError::Rejected(Rejection::AlreadyActive))
        ));
    }

    #[tokio::test]
    async fn playlist_seeds_queue_in_order() {
        let catalog = StaticCatalog::new()
            .with_playlist("PLabcdefghijk123", vec![track("a"), track("b"), track("c")]);
        let (state, _store) = party_state(catalog).await;

        let started = start_session(
            &state,
            Some("https://www.youtube.com/playlist?list=PLabcdefghijk123"),
        )
        .await
        .unwrap();
        assert_eq!(started.queue_size, 3);

        let queue = state.repository().await.unwrap().queue().await.unwrap();
        let ids: Vec<_> = queue.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn bad_or_empty_playlist_leaves_store_untouched() {
        let (state, store) = party_state(StaticCatalog::new()).await;

        assert!(matches!(
            start_session(&state, Some("definitely not a playlist")).await,
            Err(ServiceError::Rejected(Rejection::InvalidReference))
        ));
        assert!(matches!(
            start_session(&state, Some("PLabcdefghijk123")).await,
            Err(ServiceError::Rejected(Rejection::EmptyOrInaccessible))
        ));
        assert!(store.get("SESSION_ACTIVE").await.unwrap().is_none());
        assert!(store.get("SESSION_ID").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn end_requires_open_session_without_vote() {
        let (state, store) = party_state(StaticCatalog::new()).await;
        assert!(matches!(
            end_session(&state).await,
            Err(ServiceError::Rejected(Rejection::NotActive))
        ));

        start_session(&state, None).await.unwrap();
        store.insert_raw("CURRENT_SONG", r#"{"id":"x","title":"X"}"#);
        assert!(matches!(
            end_session(&state).await,
            Err(ServiceError::Rejected(Rejection::VoteInProgress))
        ));
        assert!(state.repository().await.unwrap().session_active().await.unwrap());
    }

    #[tokio::test]
    async fn end_ranks_history_and_clears_session() {
        let (state, _store) = party_state(StaticCatalog::new()).await;
        start_session(&state, None).await.unwrap();

        let repo = state.repository().await.unwrap();
        let mut history = repo.history().await.unwrap();
        for (id, total, participants) in [("x", 4, 2), ("y", 0, 3), ("z", 3, 2)] {
            history.insert(
                id.into(),
                HistoryEntryEntity {
                    title: id.to_uppercase(),
                    total_points: total,
                    voter_count: total.min(participants),
                    participant_count: participants,
                },
            );
        }
        repo.put_history(&history).await.unwrap();

        let summary = end_session(&state).await.unwrap();
        let averages: Vec<f64> = summary.tracks.iter().map(|t| t.average).collect();
        assert_eq!(averages, vec![2.0, 1.5, 0.0]);
        assert_eq!(summary.tracks[0].title, "X");

        assert!(!repo.session_active().await.unwrap());
        assert!(repo.history().await.unwrap().is_empty());
        assert_invariants(&repo).await;
    }
}
