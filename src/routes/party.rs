use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::party::PartyOverview, error::AppError, services::public_service, state::SharedState,
};

#[utoipa::path(
    get,
    path = "/party",
    tag = "party",
    responses(
        (status = 200, description = "Current party projection", body = PartyOverview),
        (status = 503, description = "Storage unavailable"),
    )
)]
/// Return whether a session runs, the current song and the room size.
pub async fn party_overview(
    State(state): State<SharedState>,
) -> Result<Json<PartyOverview>, AppError> {
    Ok(Json(public_service::party_overview(&state).await?))
}

/// Configure the public party routes.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/party", get(party_overview))
}
