//! Track and playlist metadata lookup, plus the pure reference parsers used
//! before any lookup happens.

mod youtube;

use std::{
    collections::HashMap,
    sync::{Arc, LazyLock},
};

use futures::future::BoxFuture;
use regex::Regex;
use reqwest::StatusCode;
use thiserror::Error;

use crate::dao::models::TrackEntity;

pub use self::youtube::YouTubeCatalog;

/// Descriptive data returned for a single track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackMetadata {
    /// Video title.
    pub title: String,
    /// Best available thumbnail URL.
    pub thumbnail: Option<String>,
}

/// Failures of a single-track lookup. Callers degrade these to a placeholder.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The HTTP call failed.
    #[error("catalog request failed")]
    Request(#[from] reqwest::Error),
    /// Non-success status.
    #[error("catalog answered with status {0}")]
    Status(StatusCode),
    /// No such video.
    #[error("track `{0}` is unknown to the catalog")]
    NotFound(String),
}

/// External metadata source.
pub trait Catalog: Send + Sync {
    /// Resolve the title and thumbnail of a video id.
    fn lookup_track(
        &self,
        video_id: &str,
    ) -> BoxFuture<'static, Result<TrackMetadata, CatalogError>>;

    /// Ordered tracks of a playlist, at most `limit`.
    ///
    /// Returns an empty list when the playlist is empty, private or the lookup fails.
    fn playlist_tracks(&self, playlist_id: &str, limit: usize)
    -> BoxFuture<'static, Vec<TrackEntity>>;
}

const ID_CHARS: &str = "[A-Za-z0-9_-]";

static VIDEO_IN_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?:youtu\.be/|[?&]v=|/shorts/|/embed/|/v/)({ID_CHARS}{{11}})(?:[^A-Za-z0-9_-]|$)"
    ))
    .expect("valid video url pattern")
});

static BARE_VIDEO_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("^{ID_CHARS}{{11}}$")).expect("valid video id pattern"));

static LIST_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"[?&]list=({ID_CHARS}{{2,64}})(?:[^A-Za-z0-9_-]|$)"))
        .expect("valid list parameter pattern")
});

static BARE_PLAYLIST_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("^(?:PL|UU|LL|FL|OL|RD){ID_CHARS}{{11,62}}$"))
        .expect("valid playlist id pattern")
});

/// Extract the 11-character video id from a link or a bare id.
pub fn parse_video_id(reference: &str) -> Option<String> {
    let reference = reference.trim();
    if BARE_VIDEO_ID.is_match(reference) {
        return Some(reference.to_owned());
    }
    VIDEO_IN_URL
        .captures(reference)
        .and_then(|captures| captures.get(1))
        .map(|id| id.as_str().to_owned())
}

/// Extract a playlist id from a `list=` link or a bare playlist id.
pub fn parse_playlist_id(reference: &str) -> Option<String> {
    let reference = reference.trim();
    if BARE_PLAYLIST_ID.is_match(reference) {
        return Some(reference.to_owned());
    }
    LIST_PARAM
        .captures(reference)
        .and_then(|captures| captures.get(1))
        .map(|id| id.as_str().to_owned())
}

/// Fixed in-memory catalog.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    tracks: Arc<HashMap<String, TrackMetadata>>,
    playlists: Arc<HashMap<String, Vec<TrackEntity>>>,
}

impl StaticCatalog {
    /// Catalog that knows nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a video title.
    pub fn with_track(mut self, video_id: &str, title: &str) -> Self {
        Arc::make_mut(&mut self.tracks).insert(
            video_id.to_owned(),
            TrackMetadata {
                title: title.to_owned(),
                thumbnail: None,
            },
        );
        self
    }

    /// Register the tracks of a playlist.
    pub fn with_playlist(mut self, playlist_id: &str, tracks: Vec<TrackEntity>) -> Self {
        Arc::make_mut(&mut self.playlists).insert(playlist_id.to_owned(), tracks);
        self
    }
}

impl Catalog for StaticCatalog {
    fn lookup_track(
        &self,
        video_id: &str,
    ) -> BoxFuture<'static, Result<TrackMetadata, CatalogError>> {
        let found = self
            .tracks
            .get(video_id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(video_id.to_owned()));
        Box::pin(async move { found })
    }

    fn playlist_tracks(
        &self,
        playlist_id: &str,
        limit: usize,
    ) -> BoxFuture<'static, Vec<TrackEntity>> {
        let tracks = self
            .playlists
            .get(playlist_id)
            .map(|tracks| tracks.iter().take(limit).cloned().collect())
            .unwrap_or_default();
        Box::pin(async move { tracks })
    }
}
