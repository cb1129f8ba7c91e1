//! Casting, replacing and retracting votes on the current track.

use tokio::try_join;
use tracing::info;
use uuid::Uuid;

use crate::{
    dao::{models::CurrentSongEntity, party::PartyRepository},
    error::{Rejection, ServiceError},
    state::{
        SharedState,
        party::{VoteOutcome, toggle_vote},
        state_machine::{PartyEvent, SessionPhase, compute_transition},
    },
};

/// Apply a vote button press for `user_id`.
///
/// Pressing the score already recorded retracts it; another score replaces it.
pub async fn cast_or_toggle_vote(
    state: &SharedState,
    user_id: &str,
    track_id: &str,
    score: u32,
) -> Result<VoteOutcome, ServiceError> {
    if state.config().vote_option(score).is_none() {
        return Err(ServiceError::InvalidInput(format!(
            "score {score} is not a configured vote option"
        )));
    }

    let repo = state.repository().await?;
    if !state.config().serialize_votes {
        return apply_vote(&repo, user_id, track_id, score).await;
    }

    // Presses on anything but the open track never reach the gate map.
    let (active, current, session_id) = try_join!(
        repo.session_active(),
        repo.current_song(),
        repo.session_id()
    )?;
    check_target(active, current.as_ref(), track_id)?;

    let session_id = session_id.unwrap_or_else(Uuid::nil);
    let gate = state.vote_gate(session_id, track_id);
    let outcome = {
        let _guard = gate.lock().await;
        apply_vote(&repo, user_id, track_id, score).await
    };
    state.release_vote_gate(session_id, track_id, gate);
    outcome
}

fn check_target(
    active: bool,
    current: Option<&CurrentSongEntity>,
    track_id: &str,
) -> Result<(), ServiceError> {
    compute_transition(
        SessionPhase::derive(active, current.is_some()),
        PartyEvent::CastVote,
    )?;
    if current.is_none_or(|song| song.id != track_id) {
        return Err(Rejection::VoteClosed.into());
    }
    Ok(())
}

async fn apply_vote(
    repo: &PartyRepository,
    user_id: &str,
    track_id: &str,
    score: u32,
) -> Result<VoteOutcome, ServiceError> {
    let (active, current, participants, eligible, mut votes) = try_join!(
        repo.session_active(),
        repo.current_song(),
        repo.participants(),
        repo.eligible_voters(),
        repo.voted_users()
    )?;
    check_target(active, current.as_ref(), track_id)?;
    if !participants.contains(user_id) {
        return Err(Rejection::NotAParticipant.into());
    }
    if !eligible.contains(user_id) {
        return Err(Rejection::NotEligible.into());
    }

    let outcome = toggle_vote(&mut votes, user_id, score);
    repo.put_voted_users(&votes).await?;
    info!(user_id, track_id, outcome = ?outcome, voters = votes.len(), "vote recorded");
    Ok(outcome)
}
