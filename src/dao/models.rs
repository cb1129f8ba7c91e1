use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Keys of the flat store layout, one record per entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartyKey {
    /// `SESSION_ACTIVE`: boolean session flag.
    SessionActive,
    /// `SESSION_ID`: identifier of the running session.
    SessionId,
    /// `QUEUE`: pending tracks.
    Queue,
    /// `CURRENT_SONG`: track open for voting.
    CurrentSong,
    /// `SESSION_PARTICIPANTS`: the room.
    Participants,
    /// `ELIGIBLE_VOTERS`: snapshot taken when the vote opened.
    EligibleVoters,
    /// `VOTED_USERS`: scores on the current track.
    VotedUsers,
    /// `HISTORY`: per-track results.
    History,
}

impl PartyKey {
    /// Name under which the record is stored.
    pub const fn as_str(self) -> &'static str {
        match self {
            PartyKey::SessionActive => "SESSION_ACTIVE",
            PartyKey::SessionId => "SESSION_ID",
            PartyKey::Queue => "QUEUE",
            PartyKey::CurrentSong => "CURRENT_SONG",
            PartyKey::Participants => "SESSION_PARTICIPANTS",
            PartyKey::EligibleVoters => "ELIGIBLE_VOTERS",
            PartyKey::VotedUsers => "VOTED_USERS",
            PartyKey::History => "HISTORY",
        }
    }
}

/// Track waiting in the queue, carrying already-resolved metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct TrackEntity {
    /// Catalog identifier (11-character video id).
    pub id: String,
    /// Display title, or the placeholder when lookup failed.
    pub title: String,
    /// Thumbnail URL, when the catalog had one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

/// Track currently open for voting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CurrentSongEntity {
    /// Catalog identifier of the track.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Thumbnail URL, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

impl From<TrackEntity> for CurrentSongEntity {
    fn from(value: TrackEntity) -> Self {
        Self {
            id: value.id,
            title: value.title,
            thumbnail: value.thumbnail,
        }
    }
}

/// Accumulated voting statistics of one track over a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntryEntity {
    /// Title recorded the first time the track was rated.
    pub title: String,
    /// Sum of all scores.
    pub total_points: u64,
    /// Number of scores cast.
    pub voter_count: u64,
    /// Sum of eligible voter counts at each vote end, not the turnout.
    pub participant_count: u64,
}

/// Ordered pending tracks.
pub type QueueEntity = Vec<TrackEntity>;
/// Ordered set of user ids (participants or eligible voters).
pub type RosterEntity = IndexSet<String>;
/// Outstanding score per user for the current track.
pub type VotesEntity = IndexMap<String, u32>;
/// Per-track statistics keyed by track id, in first-voted order.
pub type HistoryEntity = IndexMap<String, HistoryEntryEntity>;
