use axum::{
    Json, Router,
    body::{Body, to_bytes},
    extract::State,
    http::{HeaderMap, Request},
    middleware::{self, Next},
    response::Response,
    routing::post,
};
use axum_valid::Valid;
use tracing::warn;

use crate::{
    dto::{interaction::InteractionRequest, response::ResponseIntent},
    error::AppError,
    services::{
        command_service,
        verification::{SIGNATURE_HEADER, TIMESTAMP_HEADER},
    },
    state::SharedState,
};

/// Interaction payloads are small; anything larger is refused before verification.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Signed webhook entry point of the chat platform.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/interactions", post(interactions))
        .route_layer(middleware::from_fn_with_state(state, require_signature))
}

#[utoipa::path(
    post,
    path = "/interactions",
    tag = "interactions",
    params(
        ("X-Signature-Sha256" = String, Header, description = "hex(sha256(secret || timestamp || body))"),
        ("X-Signature-Timestamp" = String, Header, description = "Unix time in seconds the request was signed at"),
    ),
    request_body = InteractionRequest,
    responses(
        (status = 200, description = "Reply to render; rejections are ephemeral replies", body = ResponseIntent),
        (status = 400, description = "Malformed payload or command"),
        (status = 401, description = "Missing or invalid signature"),
        (status = 503, description = "Storage unavailable"),
    )
)]
/// Classify, run and answer one interaction.
pub async fn interactions(
    State(state): State<SharedState>,
    Valid(Json(request)): Valid<Json<InteractionRequest>>,
) -> Result<Json<ResponseIntent>, AppError> {
    let intent = command_service::handle_interaction(&state, request).await?;
    Ok(Json(intent))
}

fn header(headers: &HeaderMap, name: &str) -> Result<String, AppError> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_owned())
        .ok_or_else(|| AppError::Unauthorized(format!("missing signature header `{name}`")))
}

async fn require_signature(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let (parts, body) = req.into_parts();
    let signature = header(&parts.headers, SIGNATURE_HEADER)?;
    let timestamp = header(&parts.headers, TIMESTAMP_HEADER)?;

    let bytes = to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|err| AppError::BadRequest(format!("unreadable request body: {err}")))?;

    if !state.verifier().verify(&bytes, &signature, &timestamp) {
        warn!("rejected interaction with invalid signature");
        return Err(AppError::Unauthorized("invalid request signature".into()));
    }

    let req = Request::from_parts(parts, Body::from(bytes));
    Ok(next.run(req).await)
}
