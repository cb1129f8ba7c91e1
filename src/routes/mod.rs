use axum::Router;

use crate::state::SharedState;

/// OpenAPI document and Swagger UI.
pub mod docs;
/// Liveness and storage health.
pub mod health;
/// Signed webhook receiving commands and button presses.
pub mod interactions;
/// Read-only party overview.
pub mod party;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(party::router())
        .merge(interactions::router(state.clone()));

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
