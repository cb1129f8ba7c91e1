//! Joining, leaving and kicking participants.

use tokio::try_join;
use tracing::info;

use crate::{
    dto::party::RosterUpdate,
    error::{Rejection, ServiceError},
    state::{
        SharedState,
        state_machine::{PartyEvent, SessionPhase, compute_transition},
    },
};

/// Add `user_id` to the room of the running session.
pub async fn join(state: &SharedState, user_id: &str) -> Result<RosterUpdate, ServiceError> {
    let repo = state.repository().await?;
    let (active, current, mut participants) = try_join!(
        repo.session_active(),
        repo.current_song(),
        repo.participants()
    )?;
    compute_transition(
        SessionPhase::derive(active, current.is_some()),
        PartyEvent::Roster,
    )?;
    if participants.contains(user_id) {
        return Err(Rejection::AlreadyJoined.into());
    }

    participants.insert(user_id.to_owned());
    repo.put_participants(&participants).await?;
    info!(user_id, participants = participants.len(), "participant joined");
    Ok(RosterUpdate {
        user_id: user_id.to_owned(),
        participant_count: participants.len(),
    })
}

/// Remove the caller from the room.
pub async fn leave(state: &SharedState, user_id: &str) -> Result<RosterUpdate, ServiceError> {
    let update = remove_member(state, user_id, Rejection::NotJoined).await?;
    info!(user_id, participants = update.participant_count, "participant left");
    Ok(update)
}

/// Remove `target_id` on behalf of a manager.
///
/// Unauthorized callers are refused before the store is touched.
pub async fn kick(
    state: &SharedState,
    caller_id: &str,
    authorized: bool,
    target_id: &str,
) -> Result<RosterUpdate, ServiceError> {
    if !authorized {
        return Err(Rejection::Forbidden.into());
    }
    let update = remove_member(state, target_id, Rejection::TargetNotJoined).await?;
    info!(
        caller_id,
        target_id,
        participants = update.participant_count,
        "participant kicked"
    );
    Ok(update)
}

/// Participants in join order.
pub async fn list_participants(state: &SharedState) -> Result<Vec<String>, ServiceError> {
    let repo = state.repository().await?;
    let (active, current, participants) = try_join!(
        repo.session_active(),
        repo.current_song(),
        repo.participants()
    )?;
    compute_transition(
        SessionPhase::derive(active, current.is_some()),
        PartyEvent::Roster,
    )?;
    Ok(participants.into_iter().collect())
}

/// Drop a user from the roster and, when present, from the current vote.
async fn remove_member(
    state: &SharedState,
    user_id: &str,
    missing: Rejection,
) -> Result<RosterUpdate, ServiceError> {
    let repo = state.repository().await?;
    let (active, current, mut participants, mut eligible, mut votes) = try_join!(
        repo.session_active(),
        repo.current_song(),
        repo.participants(),
        repo.eligible_voters(),
        repo.voted_users()
    )?;
    compute_transition(
        SessionPhase::derive(active, current.is_some()),
        PartyEvent::Roster,
    )?;
    if !participants.shift_remove(user_id) {
        return Err(missing.into());
    }

    repo.put_participants(&participants).await?;
    if eligible.shift_remove(user_id) {
        repo.put_eligible_voters(&eligible).await?;
    }
    if votes.shift_remove(user_id).is_some() {
        repo.put_voted_users(&votes).await?;
    }

    Ok(RosterUpdate {
        user_id: user_id.to_owned(),
        participant_count: participants.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{
        catalog::StaticCatalog,
        playback_service::start_vote_on_url,
        session_service::start_session,
        test_support::{assert_invariants, party_state},
        voting_service::cast_or_toggle_vote,
    };

    fn rejection<T: std::fmt::Debug>(result: Result<T, ServiceError>) -> Rejection {
        match result {
            Err(ServiceError::Rejected(rejection)) => rejection,
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn roster_requires_active_session() {
        let (state, _store) = party_state(StaticCatalog::new()).await;
        assert_eq!(rejection(join(&state, "a").await), Rejection::NotActive);
        assert_eq!(rejection(leave(&state, "a").await), Rejection::NotActive);
        assert_eq!(
            rejection(kick(&state, "dj", true, "a").await),
            Rejection::NotActive
        );
        assert_eq!(
            rejection(list_participants(&state).await),
            Rejection::NotActive
        );
    }

    #[tokio::test]
    async fn join_twice_and_leave_twice_are_rejected() {
        let (state, _store) = party_state(StaticCatalog::new()).await;
        start_session(&state, None).await.unwrap();

        assert_eq!(join(&state, "a").await.unwrap().participant_count, 1);
        assert_eq!(rejection(join(&state, "a").await), Rejection::AlreadyJoined);
        assert_eq!(leave(&state, "a").await.unwrap().participant_count, 0);
        assert_eq!(rejection(leave(&state, "a").await), Rejection::NotJoined);
    }

    #[tokio::test]
    async fn unauthorized_kick_is_refused_before_any_read() {
        let (state, store) = party_state(StaticCatalog::new()).await;
        // A corrupt record would surface if the store were read.
        store.insert_raw("SESSION_ACTIVE", "garbage");
        assert_eq!(
            rejection(kick(&state, "guest", false, "a").await),
            Rejection::Forbidden
        );
    }

    #[tokio::test]
    async fn kick_of_absent_target_is_rejected() {
        let (state, _store) = party_state(StaticCatalog::new()).await;
        start_session(&state, None).await.unwrap();
        assert_eq!(
            rejection(kick(&state, "dj", true, "ghost").await),
            Rejection::TargetNotJoined
        );
    }

    #[tokio::test]
    async fn leave_mid_vote_prunes_all_sets() {
        let (state, _store) = party_state(StaticCatalog::new()).await;
        start_session(&state, None).await.unwrap();
        join(&state, "a").await.unwrap();
        join(&state, "b").await.unwrap();
        start_vote_on_url(&state, "xxxxxxxxxxx").await.unwrap();
        cast_or_toggle_vote(&state, "a", "xxxxxxxxxxx", 2)
            .await
            .unwrap();

        leave(&state, "a").await.unwrap();
        let repo = state.repository().await.unwrap();
        assert!(!repo.eligible_voters().await.unwrap().contains("a"));
        assert!(repo.voted_users().await.unwrap().is_empty());
        assert_invariants(&repo).await;
    }

    #[tokio::test]
    async fn listing_keeps_join_order() {
        let (state, _store) = party_state(StaticCatalog::new()).await;
        start_session(&state, None).await.unwrap();
        for user in ["c", "a", "b"] {
            join(&state, user).await.unwrap();
        }
        assert_eq!(
            list_participants(&state).await.unwrap(),
            vec!["c", "a", "b"]
        );
    }
}
