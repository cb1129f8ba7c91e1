use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;

use crate::{
    dao::{party::RecordError, storage::StorageError},
    state::state_machine::InvalidTransition,
};

/// Guard violations returned to the caller without any side effect.
///
/// The display text is the short message shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    /// `StartSession` while a session runs.
    #[error("A listening session is already running.")]
    AlreadyActive,
    /// The operation needs an open session.
    #[error("No listening session is running.")]
    NotActive,
    /// A vote arrived after the session ended.
    #[error("The listening session has ended.")]
    SessionClosed,
    /// Another track is still being voted on.
    #[error("A vote is still open. End it first.")]
    VoteInProgress,
    /// `EndVote` without an open vote.
    #[error("No song is playing right now.")]
    NoCurrentSong,
    /// The pressed button belongs to a track that is no longer current.
    #[error("Voting on this song has closed.")]
    VoteClosed,
    /// `AdvanceQueue` found nothing to play.
    #[error("The queue is empty.")]
    QueueEmpty,
    /// The voter never joined.
    #[error("Join the session before voting.")]
    NotAParticipant,
    /// Duplicate join.
    #[error("You already joined this session.")]
    AlreadyJoined,
    /// Leave by someone who is not in the room.
    #[error("You are not part of this session.")]
    NotJoined,
    /// Kick of someone who is not in the room.
    #[error("That user is not part of this session.")]
    TargetNotJoined,
    /// Joined after the current vote started.
    #[error("You joined after this song started. You can vote on the next one.")]
    NotEligible,
    /// Manager-only command from a regular member.
    #[error("You are not allowed to do that.")]
    Forbidden,
    /// The playlist argument holds no playlist id.
    #[error("That playlist link could not be read.")]
    InvalidReference,
    /// The link holds no video id.
    #[error("That link does not point to a video.")]
    UnresolvableUrl,
    /// The playlist resolved to no tracks.
    #[error("That playlist is empty or private.")]
    EmptyOrInaccessible,
}

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A state-machine guard or input check refused the operation.
    #[error("rejected: {0}")]
    Rejected(Rejection),
    /// The inbound payload could not be classified.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// A stored record could not be decoded.
    #[error("corrupt state under `{key}`: {reason}")]
    CorruptState {
        /// Store key holding the bad record.
        key: &'static str,
        /// Decoder message.
        reason: String,
    },
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
}

impl From<Rejection> for ServiceError {
    fn from(rejection: Rejection) -> Self {
        ServiceError::Rejected(rejection)
    }
}

impl From<InvalidTransition> for ServiceError {
    fn from(invalid: InvalidTransition) -> Self {
        ServiceError::Rejected(invalid.rejection())
    }
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

impl From<RecordError> for ServiceError {
    fn from(err: RecordError) -> Self {
        match err {
            RecordError::Storage(source) => ServiceError::Unavailable(source),
            RecordError::Corrupt { key, reason } => ServiceError::CorruptState { key, reason },
        }
    }
}

/// Failure surfaced to an HTTP caller. The payload is the message placed in the JSON body.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed payload, unknown command or validation failure.
    #[error("{0}")]
    BadRequest(String),
    /// Missing or invalid request signature.
    #[error("{0}")]
    Unauthorized(String),
    /// No usable store; the platform may retry later.
    #[error("{0}")]
    Unavailable(String),
    /// Corrupt stored state.
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status the error is answered with.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "bad_request",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Unavailable(_) => "unavailable",
            AppError::Internal(_) => "internal",
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            // Interaction replies render rejections themselves; anywhere else they are plain 400s.
            ServiceError::Rejected(rejection) => AppError::BadRequest(rejection.to_string()),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            err @ ServiceError::CorruptState { .. } => AppError::Internal(err.to_string()),
            ServiceError::Unavailable(source) => AppError::Unavailable(source.to_string()),
            ServiceError::Degraded => AppError::Unavailable("storage unavailable (degraded mode)".into()),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'static str,
    message: &'a str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let message = self.to_string();
        let body = ErrorBody {
            error: self.code(),
            message: &message,
        };
        (self.status(), Json(body)).into_response()
    }
}
