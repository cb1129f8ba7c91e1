//! Library crate for the listening party backend, exposing modules for binaries and integration tests.

/// Runtime configuration and environment loading.
pub mod config;
/// Persistence: the key-value port, its backends and the typed party repository.
pub mod dao;
/// Wire types.
pub mod dto;
/// HTTP-facing error type and service error mapping.
pub mod error;
/// Axum routers.
pub mod routes;
/// Party operations and their collaborators.
pub mod services;
/// Shared application state and the session state machine.
pub mod state;
