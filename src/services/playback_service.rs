//! Starting and closing votes on tracks, from a link or from the queue head.

use tokio::try_join;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::{
        models::{CurrentSongEntity, RosterEntity, VotesEntity},
        party::PartyRepository,
    },
    dto::party::{CurrentSongView, VoteResult},
    error::{Rejection, ServiceError},
    services::catalog::{TrackMetadata, parse_video_id},
    state::{
        SharedState,
        party::{VoteTally, merge_into_history},
        state_machine::{PartyEvent, SessionPhase, compute_transition},
    },
};

/// Snapshot eligibility, reset the votes and publish the song, in that order.
async fn open_vote(
    repo: &PartyRepository,
    song: CurrentSongEntity,
    participants: RosterEntity,
) -> Result<CurrentSongView, ServiceError> {
    repo.put_eligible_voters(&participants).await?;
    repo.put_voted_users(&VotesEntity::new()).await?;
    repo.put_current_song(&song).await?;
    Ok(CurrentSongView::new(song, participants.len()))
}

/// Open voting on the track behind `url`.
///
/// A failed title lookup falls back to the configured placeholder title.
pub async fn start_vote_on_url(
    state: &SharedState,
    url: &str,
) -> Result<CurrentSongView, ServiceError> {
    let repo = state.repository().await?;
    let (active, current, participants) = try_join!(
        repo.session_active(),
        repo.current_song(),
        repo.participants()
    )?;
    compute_transition(
        SessionPhase::derive(active, current.is_some()),
        PartyEvent::StartVote,
    )?;

    let video_id = parse_video_id(url).ok_or(Rejection::UnresolvableUrl)?;
    let metadata = match state.catalog().lookup_track(&video_id).await {
        Ok(metadata) => metadata,
        Err(err) => {
            warn!(track_id = %video_id, error = %err, "track lookup failed; using placeholder title");
            TrackMetadata {
                title: state.config().placeholder_title.clone(),
                thumbnail: None,
            }
        }
    };

    let song = CurrentSongEntity {
        id: video_id,
        title: metadata.title,
        thumbnail: metadata.thumbnail,
    };
    let view = open_vote(&repo, song, participants).await?;
    info!(
        track_id = %view.id,
        eligible = view.eligible_count,
        "vote started from link"
    );
    Ok(view)
}

/// Pop the queue head and open voting on it, reusing its stored metadata.
pub async fn advance_queue(state: &SharedState) -> Result<CurrentSongView, ServiceError> {
    let repo = state.repository().await?;
    let (active, current, mut queue, participants) = try_join!(
        repo.session_active(),
        repo.current_song(),
        repo.queue(),
        repo.participants()
    )?;
    compute_transition(
        SessionPhase::derive(active, current.is_some()),
        PartyEvent::StartVote,
    )?;
    if queue.is_empty() {
        return Err(Rejection::QueueEmpty.into());
    }

    let head = queue.remove(0);
    repo.put_queue(&queue).await?;
    let view = open_vote(&repo, head.into(), participants).await?;
    info!(
        track_id = %view.id,
        eligible = view.eligible_count,
        remaining = queue.len(),
        "vote started from queue"
    );
    Ok(view)
}

/// Close voting on the current track and fold its tally into the history.
pub async fn end_vote(state: &SharedState) -> Result<VoteResult, ServiceError> {
    let repo = state.repository().await?;
    let (active, current, session_id) = try_join!(
        repo.session_active(),
        repo.current_song(),
        repo.session_id()
    )?;
    compute_transition(
        SessionPhase::derive(active, current.is_some()),
        PartyEvent::EndVote,
    )?;
    let track_id = current.ok_or(Rejection::NoCurrentSong)?.id;
    let session_id = session_id.unwrap_or_else(Uuid::nil);

    if !state.config().serialize_votes {
        return close_vote(state, &repo, session_id, &track_id).await;
    }

    // Wait for in-flight votes on this track; the tally is read under the gate.
    let gate = state.vote_gate(session_id, &track_id);
    let result = {
        let _guard = gate.lock().await;
        close_vote(state, &repo, session_id, &track_id).await
    };
    state.release_vote_gate(session_id, &track_id, gate);
    result
}

/// Tally and clear the vote on `track_id`, provided it is still the current song.
async fn close_vote(
    state: &SharedState,
    repo: &PartyRepository,
    session_id: Uuid,
    track_id: &str,
) -> Result<VoteResult, ServiceError> {
    let (current, voted, eligible, mut history) = try_join!(
        repo.current_song(),
        repo.voted_users(),
        repo.eligible_voters(),
        repo.history()
    )?;
    // A duplicate end may have closed it, and another track may be open by now.
    let song = current
        .filter(|song| song.id == track_id)
        .ok_or(Rejection::NoCurrentSong)?;

    let tally = VoteTally::compute(&voted, &eligible);
    merge_into_history(&mut history, &song.id, &song.title, &tally);
    repo.put_history(&history).await?;
    repo.clear_current_song().await?;
    repo.clear_eligible_voters().await?;
    repo.clear_voted_users().await?;

    let result = VoteResult::new(song, &tally, state.config().high_approval_threshold);
    info!(
        %session_id,
        track_id = %result.track_id,
        total_points = result.total_points,
        voter_count = result.voter_count,
        participant_count = result.participant_count,
        high_approval = result.high_approval,
        "vote ended"
    );
    Ok(result)
}
