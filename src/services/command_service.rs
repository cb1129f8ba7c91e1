//! Classification of inbound interactions into [`Command`]s, dispatch to the
//! party services and rendering of the resulting [`ResponseIntent`].

use std::collections::HashMap;

use tracing::{error, info};

use crate::{
    config::AppConfig,
    dto::{
        interaction::{InteractionKind, InteractionRequest, InteractionUser},
        party::{CurrentSongView, SessionStarted, SessionSummary, VoteResult},
        response::{ResponseIntent, VOTE_CUSTOM_ID_PREFIX, VoteButton},
    },
    error::{Rejection, ServiceError},
    services::{playback_service, roster_service, session_service, voting_service},
    state::{SharedState, party::VoteOutcome},
};

/// Every action the party understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `session-start`.
    SessionStart {
        /// Playlist URL or id to seed the queue with.
        playlist: Option<String>,
    },
    /// `session-end`.
    SessionEnd,
    /// `vote-start`: open the given track for voting.
    VoteStart {
        /// Track URL or bare video id.
        url: String,
    },
    /// `vote-next`: open the head of the queue.
    VoteNext,
    /// `vote-end`.
    VoteEnd,
    /// `enter`: join the room.
    Enter,
    /// `exit`: leave the room.
    Exit,
    /// `kick`: remove another listener.
    Kick {
        /// User id to remove.
        target: String,
    },
    /// `participants`: list the room.
    Participants,
    /// Vote button press.
    Vote {
        /// Track the button was rendered for.
        track_id: String,
        /// Score on the button.
        score: u32,
    },
}

impl Command {
    /// Classify a slash command or button press.
    pub fn parse(kind: &InteractionKind) -> Result<Self, ServiceError> {
        match kind {
            InteractionKind::Command { name, options } => Self::from_command(name, options),
            InteractionKind::Component { custom_id } => Self::from_custom_id(custom_id),
        }
    }

    fn from_command(name: &str, options: &HashMap<String, String>) -> Result<Self, ServiceError> {
        let command = match name {
            "session-start" => Command::SessionStart {
                playlist: optional(options, "playlist"),
            },
            "session-end" => Command::SessionEnd,
            "vote-start" => Command::VoteStart {
                url: required(options, name, "url")?,
            },
            "vote-next" => Command::VoteNext,
            "vote-end" => Command::VoteEnd,
            "enter" => Command::Enter,
            "exit" => Command::Exit,
            "kick" => Command::Kick {
                target: required(options, name, "target")?,
            },
            "participants" => Command::Participants,
            other => {
                return Err(ServiceError::InvalidInput(format!(
                    "unknown command `{other}`"
                )));
            }
        };
        Ok(command)
    }

    fn from_custom_id(custom_id: &str) -> Result<Self, ServiceError> {
        let malformed =
            || ServiceError::InvalidInput(format!("malformed button id `{custom_id}`"));

        let rest = custom_id
            .strip_prefix(VOTE_CUSTOM_ID_PREFIX)
            .and_then(|rest| rest.strip_prefix(':'))
            .ok_or_else(malformed)?;
        let (track_id, score) = rest.rsplit_once(':').ok_or_else(malformed)?;
        if track_id.is_empty() {
            return Err(malformed());
        }
        let score = score.parse::<u32>().map_err(|_| malformed())?;

        Ok(Command::Vote {
            track_id: track_id.to_owned(),
            score,
        })
    }

    /// Whether only managers may run this command.
    pub fn requires_authorization(&self) -> bool {
        matches!(self, Command::Kick { .. } | Command::Participants)
    }
}

fn optional(options: &HashMap<String, String>, key: &str) -> Option<String> {
    options
        .get(key)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

fn required(
    options: &HashMap<String, String>,
    command: &str,
    key: &str,
) -> Result<String, ServiceError> {
    optional(options, key).ok_or_else(|| {
        ServiceError::InvalidInput(format!("command `{command}` requires option `{key}`"))
    })
}

/// Resolved identity of whoever issued the interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    /// Platform user id.
    pub user_id: String,
    /// Holds a manager role.
    pub authorized: bool,
}

impl Caller {
    /// Check the caller's roles against the configured manager roles.
    pub fn resolve(config: &AppConfig, user: &InteractionUser) -> Self {
        Self {
            user_id: user.id.clone(),
            authorized: config.is_manager(&user.roles),
        }
    }
}

/// Run one command and render its reply.
pub async fn dispatch(
    state: &SharedState,
    caller: &Caller,
    command: Command,
) -> Result<ResponseIntent, ServiceError> {
    if command.requires_authorization() && !caller.authorized {
        return Err(Rejection::Forbidden.into());
    }

    let intent = match command {
        Command::SessionStart { playlist } => {
            let started = session_service::start_session(state, playlist.as_deref()).await?;
            render_session_started(&started)
        }
        Command::SessionEnd => {
            let summary = session_service::end_session(state).await?;
            render_session_summary(&summary)
        }
        Command::VoteStart { url } => {
            let song = playback_service::start_vote_on_url(state, &url).await?;
            render_now_playing(state.config(), &song)
        }
        Command::VoteNext => {
            let song = playback_service::advance_queue(state).await?;
            render_now_playing(state.config(), &song)
        }
        Command::VoteEnd => {
            let result = playback_service::end_vote(state).await?;
            render_vote_result(&result)
        }
        Command::Enter => {
            let update = roster_service::join(state, &caller.user_id).await?;
            ResponseIntent::public(format!(
                "{} joined the listening party ({} in the room).",
                update.user_id, update.participant_count
            ))
        }
        Command::Exit => {
            let update = roster_service::leave(state, &caller.user_id).await?;
            ResponseIntent::public(format!(
                "{} left the listening party ({} in the room).",
                update.user_id, update.participant_count
            ))
        }
        Command::Kick { target } => {
            let update =
                roster_service::kick(state, &caller.user_id, caller.authorized, &target).await?;
            ResponseIntent::public(format!(
                "{} was removed from the listening party.",
                update.user_id
            ))
        }
        Command::Participants => {
            let participants = roster_service::list_participants(state).await?;
            render_participants(&participants)
        }
        Command::Vote { track_id, score } => {
            let outcome =
                voting_service::cast_or_toggle_vote(state, &caller.user_id, &track_id, score)
                    .await?;
            render_vote_outcome(state.config(), outcome)
        }
    };
    Ok(intent)
}

/// Entry point for a verified interaction.
///
/// Rejections become ephemeral replies; every other failure is returned to the route.
pub async fn handle_interaction(
    state: &SharedState,
    request: InteractionRequest,
) -> Result<ResponseIntent, ServiceError> {
    let caller = Caller::resolve(state.config(), &request.user);
    let command = Command::parse(&request.kind)?;
    info!(user_id = %caller.user_id, command = ?command, "handling interaction");

    match dispatch(state, &caller, command).await {
        Ok(intent) => Ok(intent),
        Err(ServiceError::Rejected(rejection)) => {
            info!(user_id = %caller.user_id, ?rejection, "interaction rejected");
            Ok(ResponseIntent::ephemeral(rejection.to_string()))
        }
        Err(err @ ServiceError::CorruptState { .. }) => {
            error!(error = %err, "stored party state is corrupt");
            Err(err)
        }
        Err(err) => Err(err),
    }
}

fn render_session_started(started: &SessionStarted) -> ResponseIntent {
    let text = match started.queue_size {
        0 => "Listening party started. Share a link to play the first track.".to_owned(),
        1 => "Listening party started with 1 track queued.".to_owned(),
        n => format!("Listening party started with {n} tracks queued."),
    };
    ResponseIntent::public(text)
}

fn render_session_summary(summary: &SessionSummary) -> ResponseIntent {
    if summary.tracks.is_empty() {
        return ResponseIntent::public("Listening party ended. No track was rated.");
    }

    let mut text = String::from("Listening party ended. Final ranking:");
    for (rank, track) in summary.tracks.iter().enumerate() {
        text.push_str(&format!(
            "\n{}. {} ({:.2} avg, {} votes)",
            rank + 1,
            track.title,
            track.average,
            track.voter_count
        ));
    }
    ResponseIntent::public(text)
}

fn render_now_playing(config: &AppConfig, song: &CurrentSongView) -> ResponseIntent {
    let buttons = config
        .vote_options
        .iter()
        .map(|option| VoteButton::new(&option.label, &song.id, option.score))
        .collect();
    ResponseIntent::public(format!(
        "Now playing: {}. {} listeners can vote.",
        song.title, song.eligible_count
    ))
    .with_options(buttons)
}

fn render_vote_result(result: &VoteResult) -> ResponseIntent {
    let mut text = format!(
        "Voting closed for {}: {} points from {} of {} listeners ({:.2} avg).",
        result.title, result.total_points, result.voter_count, result.participant_count, result.average
    );
    if result.high_approval {
        text.push_str(" The room loved it!");
    }
    ResponseIntent::public(text)
}

fn render_participants(participants: &[String]) -> ResponseIntent {
    if participants.is_empty() {
        return ResponseIntent::ephemeral("Nobody has joined yet.");
    }
    ResponseIntent::ephemeral(format!(
        "{} in the room: {}",
        participants.len(),
        participants.join(", ")
    ))
}

fn render_vote_outcome(config: &AppConfig, outcome: VoteOutcome) -> ResponseIntent {
    let label = |score: u32| {
        config
            .vote_option(score)
            .map(|option| option.label.clone())
            .unwrap_or_else(|| score.to_string())
    };
    let text = match outcome {
        VoteOutcome::Cast {
            score,
            previous: None,
        } => format!("Your vote ({}) was recorded.", label(score)),
        VoteOutcome::Cast {
            score,
            previous: Some(_),
        } => format!("Your vote was changed to {}.", label(score)),
        VoteOutcome::Retracted { score } => {
            format!("Your vote ({}) was withdrawn.", label(score))
        }
    };
    ResponseIntent::ephemeral(text)
}
