use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the listening party backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::interactions::interactions,
        crate::routes::party::party_overview,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::interaction::InteractionRequest,
            crate::dto::interaction::InteractionUser,
            crate::dto::interaction::InteractionKind,
            crate::dto::response::ResponseIntent,
            crate::dto::response::VoteButton,
            crate::dto::party::PartyOverview,
            crate::dto::party::NowPlaying,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "interactions", description = "Signed chat platform webhook"),
        (name = "party", description = "Read-only party projection"),
    )
)]
pub struct ApiDoc;

impl ApiDoc {
    /// OpenAPI document stamped with this crate's name and version.
    pub fn document() -> utoipa::openapi::OpenApi {
        let mut doc = Self::openapi();
        doc.info.title = "Listening Party API".into();
        doc.info.version = env!("CARGO_PKG_VERSION").into();
        doc
    }
}
