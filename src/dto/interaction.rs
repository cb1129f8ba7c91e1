use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::dto::validation::validate_user_id;

/// Inbound interaction forwarded by the chat platform.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
pub struct InteractionRequest {
    /// Caller identity.
    #[validate(nested)]
    pub user: InteractionUser,
    /// What was invoked.
    pub kind: InteractionKind,
}

/// Identity of the caller as resolved by the platform.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
pub struct InteractionUser {
    /// Platform user id.
    #[validate(custom(function = "validate_user_id"))]
    pub id: String,
    /// Role ids held by the caller in the guild.
    #[serde(default)]
    #[validate(length(max = 250))]
    pub roles: Vec<String>,
}

/// Either a slash command or a button press.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InteractionKind {
    /// Slash command with its named string options.
    Command {
        /// Command name, e.g. `vote-start`.
        name: String,
        /// Named string arguments.
        #[serde(default)]
        options: HashMap<String, String>,
    },
    /// Button press identified by its custom id (`vote:<trackId>:<score>`).
    Component {
        /// Raw custom id of the pressed button.
        custom_id: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_command_and_component_shapes() {
        let command: InteractionRequest = serde_json::from_str(
            r#"{"user": {"id": "42", "roles": ["dj"]},
                "kind": {"type": "command", "name": "vote-start", "options": {"url": "x"}}}"#,
        )
        .unwrap();
        assert!(command.validate().is_ok());
        match command.kind {
            InteractionKind::Command { name, options } => {
                assert_eq!(name, "vote-start");
                assert_eq!(options.get("url").map(String::as_str), Some("x"));
            }
            other => panic!("unexpected kind {other:?}"),
        }

        let component: InteractionRequest = serde_json::from_str(
            r#"{"user": {"id": "42"},
                "kind": {"type": "component", "custom_id": "vote:abc:2"}}"#,
        )
        .unwrap();
        assert!(component.user.roles.is_empty());
        assert!(matches!(component.kind, InteractionKind::Component { .. }));
    }

    #[test]
    fn blank_user_id_fails_validation() {
        let request: InteractionRequest = serde_json::from_str(
            r#"{"user": {"id": ""}, "kind": {"type": "command", "name": "enter"}}"#,
        )
        .unwrap();
        assert!(request.validate().is_err());
    }
}
