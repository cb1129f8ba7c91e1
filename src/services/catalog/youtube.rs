use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{Catalog, CatalogError, TrackMetadata};
use crate::dao::models::TrackEntity;

const OEMBED_URL: &str = "https://www.youtube.com/oembed";
const PLAYLIST_ITEMS_URL: &str = "https://www.googleapis.com/youtube/v3/playlistItems";
const WATCH_URL: &str = "https://www.youtube.com/watch?v=";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Largest page the Data API serves.
const PAGE_SIZE: usize = 50;

/// Catalog backed by YouTube oEmbed (titles) and the Data API (playlists).
#[derive(Clone)]
pub struct YouTubeCatalog {
    client: Client,
    api_key: Option<Arc<str>>,
}

#[derive(Debug, Deserialize)]
struct OEmbedResponse {
    title: String,
    #[serde(default)]
    thumbnail_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemsPage {
    #[serde(default)]
    items: Vec<PlaylistItem>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    snippet: PlaylistSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistSnippet {
    title: String,
    #[serde(default)]
    resource_id: Option<ResourceId>,
    #[serde(default)]
    thumbnails: Option<Thumbnails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceId {
    #[serde(default)]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Thumbnails {
    #[serde(default)]
    high: Option<Thumbnail>,
    #[serde(default)]
    medium: Option<Thumbnail>,
    #[serde(default)]
    default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

impl PlaylistSnippet {
    fn into_track(self) -> Option<TrackEntity> {
        let id = self.resource_id?.video_id.filter(|id| !id.is_empty())?;
        let thumbnail = self
            .thumbnails
            .and_then(|t| t.high.or(t.medium).or(t.default))
            .map(|t| t.url);
        Some(TrackEntity {
            id,
            title: self.title,
            thumbnail,
        })
    }
}

impl YouTubeCatalog {
    /// Build a catalog; playlist resolution stays disabled without an API key.
    pub fn new(api_key: Option<String>) -> Result<Self, CatalogError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_key: api_key
                .filter(|key| !key.trim().is_empty())
                .map(Arc::from),
        })
    }

    /// Read `YOUTUBE_API_KEY` from the environment.
    pub fn from_env() -> Result<Self, CatalogError> {
        Self::new(std::env::var("YOUTUBE_API_KEY").ok())
    }

    async fn fetch_track(&self, video_id: &str) -> Result<TrackMetadata, CatalogError> {
        let watch_url = format!("{WATCH_URL}{video_id}");
        let response = self
            .client
            .get(OEMBED_URL)
            .query(&[("url", watch_url.as_str()), ("format", "json")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status(status));
        }

        let body: OEmbedResponse = response.json().await?;
        Ok(TrackMetadata {
            title: body.title,
            thumbnail: body.thumbnail_url,
        })
    }

    async fn fetch_page(
        &self,
        api_key: &str,
        playlist_id: &str,
        page_token: Option<&str>,
    ) -> Result<PlaylistItemsPage, CatalogError> {
        let page_size = PAGE_SIZE.to_string();
        let mut query = vec![
            ("part", "snippet"),
            ("maxResults", page_size.as_str()),
            ("playlistId", playlist_id),
            ("key", api_key),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token));
        }

        let response = self
            .client
            .get(PLAYLIST_ITEMS_URL)
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status(status));
        }
        Ok(response.json().await?)
    }

    async fn fetch_playlist(
        &self,
        playlist_id: &str,
        limit: usize,
    ) -> Result<Vec<TrackEntity>, CatalogError> {
        let Some(api_key) = self.api_key.clone() else {
            warn!(playlist_id, "YOUTUBE_API_KEY is not set; playlist cannot be resolved");
            return Ok(Vec::new());
        };

        let mut tracks = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .fetch_page(&api_key, playlist_id, page_token.as_deref())
                .await?;
            tracks.extend(
                page.items
                    .into_iter()
                    .filter_map(|item| item.snippet.into_track()),
            );

            if tracks.len() >= limit {
                tracks.truncate(limit);
                break;
            }
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        debug!(playlist_id, count = tracks.len(), "resolved playlist");
        Ok(tracks)
    }
}

impl Catalog for YouTubeCatalog {
    fn lookup_track(
        &self,
        video_id: &str,
    ) -> BoxFuture<'static, Result<TrackMetadata, CatalogError>> {
        let catalog = self.clone();
        let video_id = video_id.to_owned();
        Box::pin(async move { catalog.fetch_track(&video_id).await })
    }

    fn playlist_tracks(
        &self,
        playlist_id: &str,
        limit: usize,
    ) -> BoxFuture<'static, Vec<TrackEntity>> {
        let catalog = self.clone();
        let playlist_id = playlist_id.to_owned();
        Box::pin(async move {
            match catalog.fetch_playlist(&playlist_id, limit).await {
                Ok(tracks) => tracks,
                Err(err) => {
                    warn!(playlist_id = %playlist_id, error = %err, "playlist lookup failed");
                    Vec::new()
                }
            }
        })
    }
}
