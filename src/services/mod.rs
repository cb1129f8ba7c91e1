/// Track and playlist metadata lookup.
pub mod catalog;
/// Interaction classification, dispatch and reply rendering.
pub mod command_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Vote start, queue advance and vote end.
pub mod playback_service;
/// Public service for read-only party information.
pub mod public_service;
/// Join, leave, kick and participant listing.
pub mod roster_service;
/// Session start and end.
pub mod session_service;
/// Storage connection supervisor with backoff and degraded mode.
pub mod storage_supervisor;
/// Inbound request signature verification.
pub mod verification;
/// Vote casting and toggling.
pub mod voting_service;

#[cfg(test)]
pub(crate) mod test_support;
