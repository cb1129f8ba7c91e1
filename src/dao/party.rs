//! Typed access to the party records. This is the only place where store
//! strings are encoded or decoded; malformed values surface as
//! [`RecordError::Corrupt`] instead of being coerced.

use std::sync::Arc;

use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use uuid::Uuid;

use crate::dao::{
    kv_store::KvStore,
    models::{
        CurrentSongEntity, HistoryEntity, PartyKey, QueueEntity, RosterEntity, TrackEntity,
        VotesEntity,
    },
    storage::StorageError,
};

/// Failures raised while reading or writing a party record.
#[derive(Debug, Error)]
pub enum RecordError {
    /// The store itself failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// The stored value could not be decoded into its record type.
    #[error("corrupt value under `{key}`: {reason}")]
    Corrupt {
        /// Store key holding the bad record.
        key: &'static str,
        /// Decoder message.
        reason: String,
    },
}

/// Result alias for repository operations.
pub type RecordResult<T> = Result<T, RecordError>;

/// Repository over the flat key layout described by [`PartyKey`].
#[derive(Clone)]
pub struct PartyRepository {
    store: Arc<dyn KvStore>,
}

impl PartyRepository {
    /// Wrap a store handle.
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    async fn read<T>(&self, key: PartyKey) -> RecordResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let Some(raw) = self.store.get(key.as_str()).await? else {
            return Ok(None);
        };
        // An emptied record reads the same as a deleted one.
        if raw.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str::<Option<T>>(&raw).map_err(|err| RecordError::Corrupt {
            key: key.as_str(),
            reason: err.to_string(),
        })
    }

    async fn write<T>(&self, key: PartyKey, value: &T) -> RecordResult<()>
    where
        T: Serialize + ?Sized,
    {
        let encoded = serde_json::to_string(value).map_err(|err| RecordError::Corrupt {
            key: key.as_str(),
            reason: err.to_string(),
        })?;
        self.store.put(key.as_str(), encoded).await?;
        Ok(())
    }

    async fn remove(&self, key: PartyKey) -> RecordResult<()> {
        self.store.delete(key.as_str()).await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Reads (absent collections normalize to empty)
    // -----------------------------------------------------------------------

    /// Whether a session is open; absence means closed.
    pub async fn session_active(&self) -> RecordResult<bool> {
        Ok(self
            .read::<bool>(PartyKey::SessionActive)
            .await?
            .unwrap_or(false))
    }

    /// Identifier of the latest session, if one was ever started.
    pub async fn session_id(&self) -> RecordResult<Option<Uuid>> {
        self.read(PartyKey::SessionId).await
    }

    /// Pending tracks, head first.
    pub async fn queue(&self) -> RecordResult<QueueEntity> {
        Ok(self.read(PartyKey::Queue).await?.unwrap_or_default())
    }

    /// The track open for voting; absence means nothing is playing.
    pub async fn current_song(&self) -> RecordResult<Option<CurrentSongEntity>> {
        self.read(PartyKey::CurrentSong).await
    }

    /// Users currently in the room.
    pub async fn participants(&self) -> RecordResult<RosterEntity> {
        Ok(self.read(PartyKey::Participants).await?.unwrap_or_default())
    }

    /// Participants frozen when the current vote opened.
    pub async fn eligible_voters(&self) -> RecordResult<RosterEntity> {
        Ok(self
            .read(PartyKey::EligibleVoters)
            .await?
            .unwrap_or_default())
    }

    /// Scores cast on the current track, by user.
    pub async fn voted_users(&self) -> RecordResult<VotesEntity> {
        Ok(self.read(PartyKey::VotedUsers).await?.unwrap_or_default())
    }

    /// Accumulated results, by track id.
    pub async fn history(&self) -> RecordResult<HistoryEntity> {
        Ok(self.read(PartyKey::History).await?.unwrap_or_default())
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Flip the session flag.
    pub async fn set_session_active(&self, active: bool) -> RecordResult<()> {
        self.write(PartyKey::SessionActive, &active).await
    }

    /// Stamp a new session identifier.
    pub async fn set_session_id(&self, id: Uuid) -> RecordResult<()> {
        self.write(PartyKey::SessionId, &id).await
    }

    /// Replace the queue.
    pub async fn put_queue(&self, queue: &[TrackEntity]) -> RecordResult<()> {
        self.write(PartyKey::Queue, queue).await
    }

    /// Delete the queue.
    pub async fn clear_queue(&self) -> RecordResult<()> {
        self.remove(PartyKey::Queue).await
    }

    /// Open voting on `song`.
    pub async fn put_current_song(&self, song: &CurrentSongEntity) -> RecordResult<()> {
        self.write(PartyKey::CurrentSong, song).await
    }

    /// Delete the current song.
    pub async fn clear_current_song(&self) -> RecordResult<()> {
        self.remove(PartyKey::CurrentSong).await
    }

    /// Replace the roster.
    pub async fn put_participants(&self, participants: &RosterEntity) -> RecordResult<()> {
        self.write(PartyKey::Participants, participants).await
    }

    /// Delete the roster.
    pub async fn clear_participants(&self) -> RecordResult<()> {
        self.remove(PartyKey::Participants).await
    }

    /// Replace the eligibility snapshot.
    pub async fn put_eligible_voters(&self, eligible: &RosterEntity) -> RecordResult<()> {
        self.write(PartyKey::EligibleVoters, eligible).await
    }

    /// Delete the eligibility snapshot.
    pub async fn clear_eligible_voters(&self) -> RecordResult<()> {
        self.remove(PartyKey::EligibleVoters).await
    }

    /// Replace the scores of the current track.
    pub async fn put_voted_users(&self, votes: &VotesEntity) -> RecordResult<()> {
        self.write(PartyKey::VotedUsers, votes).await
    }

    /// Delete the scores of the current track.
    pub async fn clear_voted_users(&self) -> RecordResult<()> {
        self.remove(PartyKey::VotedUsers).await
    }

    /// Replace the history.
    pub async fn put_history(&self, history: &HistoryEntity) -> RecordResult<()> {
        self.write(PartyKey::History, history).await
    }

    /// Delete the history.
    pub async fn clear_history(&self) -> RecordResult<()> {
        self.remove(PartyKey::History).await
    }
}
