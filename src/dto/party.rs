use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dao::models::CurrentSongEntity,
    state::party::{TrackStanding, VoteTally},
};

/// Result of opening a session.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionStarted {
    /// Identifier of the new session.
    pub session_id: Uuid,
    /// Tracks loaded from the playlist, if one was given.
    pub queue_size: usize,
}

/// One ranked line of the end-of-session summary.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackSummary {
    /// Catalog identifier.
    pub track_id: String,
    /// Display title.
    pub title: String,
    /// Points per eligible listener.
    pub average: f64,
    /// Sum of all scores.
    pub total_points: u64,
    /// Scores cast.
    pub voter_count: u64,
    /// Eligible listeners summed over each vote.
    pub participant_count: u64,
}

impl From<TrackStanding> for TrackSummary {
    fn from(value: TrackStanding) -> Self {
        Self {
            track_id: value.track_id,
            title: value.title,
            average: value.average,
            total_points: value.total_points,
            voter_count: value.voter_count,
            participant_count: value.participant_count,
        }
    }
}

/// Ranking returned when the session closes, best average first.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionSummary {
    /// Rated tracks in rank order.
    pub tracks: Vec<TrackSummary>,
}

/// Track that just opened for voting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CurrentSongView {
    /// Catalog identifier.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Thumbnail URL, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    /// Size of the eligibility snapshot for this track.
    pub eligible_count: usize,
}

impl CurrentSongView {
    /// Project a stored song with its snapshot size.
    pub fn new(song: CurrentSongEntity, eligible_count: usize) -> Self {
        Self {
            id: song.id,
            title: song.title,
            thumbnail: song.thumbnail,
            eligible_count,
        }
    }
}

/// Totals of a vote that just closed.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VoteResult {
    /// Catalog identifier.
    pub track_id: String,
    /// Display title.
    pub title: String,
    /// Points from this vote.
    pub total_points: u64,
    /// Scores cast in this vote.
    pub voter_count: u64,
    /// Eligible listeners at close.
    pub participant_count: u64,
    /// Points per eligible listener.
    pub average: f64,
    /// Average went over the approval threshold.
    pub high_approval: bool,
}

impl VoteResult {
    /// Summarize a closed vote against the approval threshold.
    pub fn new(song: CurrentSongEntity, tally: &VoteTally, threshold: f64) -> Self {
        let average = tally.average();
        Self {
            track_id: song.id,
            title: song.title,
            total_points: tally.total_points,
            voter_count: tally.voter_count,
            participant_count: tally.participant_count,
            average,
            high_approval: average > threshold,
        }
    }
}

/// Roster size after a join, leave or kick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RosterUpdate {
    /// Listener who joined or left.
    pub user_id: String,
    /// Room size after the change.
    pub participant_count: usize,
}

/// Public read-only projection of the party.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PartyOverview {
    /// A session is running.
    pub session_active: bool,
    /// Track open for voting, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_song: Option<NowPlaying>,
    /// Pending tracks.
    pub queue_length: usize,
    /// Listeners in the room.
    pub participant_count: usize,
}

/// Track currently open for voting, without vote details.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NowPlaying {
    /// Catalog identifier.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Thumbnail URL, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

impl From<CurrentSongEntity> for NowPlaying {
    fn from(value: CurrentSongEntity) -> Self {
        Self {
            id: value.id,
            title: value.title,
            thumbnail: value.thumbnail,
        }
    }
}
