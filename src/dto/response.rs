use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Prefix of the custom id carried by vote buttons.
pub const VOTE_CUSTOM_ID_PREFIX: &str = "vote";

/// Abstract reply handed back to the platform, which renders it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ResponseIntent {
    /// Message body.
    pub text: String,
    /// Only the caller sees the reply.
    pub ephemeral: bool,
    /// Buttons rendered under the message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<VoteButton>>,
}

impl ResponseIntent {
    /// Reply visible to the whole channel.
    pub fn public(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ephemeral: false,
            options: None,
        }
    }

    /// Reply only the caller sees.
    pub fn ephemeral(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ephemeral: true,
            options: None,
        }
    }

    /// Attach vote buttons.
    pub fn with_options(mut self, options: Vec<VoteButton>) -> Self {
        self.options = Some(options);
        self
    }
}

/// Interactive button attached to a vote announcement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct VoteButton {
    /// Text shown on the button.
    pub label: String,
    /// Routing id echoed back on press.
    pub custom_id: String,
}

impl VoteButton {
    /// Button casting `score` on `track_id`.
    pub fn new(label: &str, track_id: &str, score: u32) -> Self {
        Self {
            label: label.to_owned(),
            custom_id: vote_custom_id(track_id, score),
        }
    }
}

/// Build `vote:<trackId>:<score>`.
pub fn vote_custom_id(track_id: &str, score: u32) -> String {
    format!("{VOTE_CUSTOM_ID_PREFIX}:{track_id}:{score}")
}
