/// Health endpoint payloads.
pub mod health;
/// Inbound interactions from the chat platform.
pub mod interaction;
/// Results returned by party operations.
pub mod party;
/// Reply intents rendered by the platform.
pub mod response;
/// Field validators shared by request DTOs.
pub mod validation;
