//! Application-level configuration loading: vote options, manager roles and party tuning.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "LISTENING_PARTY_CONFIG_PATH";
/// Environment variable selecting the storage backend.
const STORE_BACKEND_ENV: &str = "STORE_BACKEND";

const DEFAULT_PLACEHOLDER_TITLE: &str = "Unknown title";
const DEFAULT_HIGH_APPROVAL_THRESHOLD: f64 = 1.0;
const DEFAULT_PLAYLIST_LIMIT: usize = 200;

/// One selectable score rendered as a vote button.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VoteOption {
    /// Points added to the track when this option is picked.
    pub score: u32,
    /// Button label.
    pub label: String,
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Fixed set of scores a participant may cast.
    pub vote_options: Vec<VoteOption>,
    /// Role ids whose holders may run manager-only commands.
    pub manager_roles: Vec<String>,
    /// Title used when the catalog cannot describe a track.
    pub placeholder_title: String,
    /// A vote result is flagged as highly approved when its average exceeds this value.
    pub high_approval_threshold: f64,
    /// Serialize concurrent votes on the same track.
    pub serialize_votes: bool,
    /// Maximum number of tracks seeded from a playlist.
    pub playlist_limit: usize,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(app_config) => {
                    info!(
                        path = %path.display(),
                        vote_options = app_config.vote_options.len(),
                        manager_roles = app_config.manager_roles.len(),
                        "loaded party configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse a configuration document; omitted fields keep their defaults.
    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }

    /// Look up the configured option for `score`.
    pub fn vote_option(&self, score: u32) -> Option<&VoteOption> {
        self.vote_options.iter().find(|option| option.score == score)
    }

    /// Whether any of `roles` grants manager rights.
    pub fn is_manager(&self, roles: &[String]) -> bool {
        roles
            .iter()
            .any(|role| self.manager_roles.iter().any(|manager| manager == role))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            vote_options: default_vote_options(),
            manager_roles: Vec::new(),
            placeholder_title: DEFAULT_PLACEHOLDER_TITLE.to_owned(),
            high_approval_threshold: DEFAULT_HIGH_APPROVAL_THRESHOLD,
            serialize_votes: true,
            playlist_limit: DEFAULT_PLAYLIST_LIMIT,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    vote_options: Option<Vec<VoteOption>>,
    #[serde(default)]
    manager_roles: Vec<String>,
    #[serde(default)]
    placeholder_title: Option<String>,
    #[serde(default)]
    high_approval_threshold: Option<f64>,
    #[serde(default)]
    serialize_votes: Option<bool>,
    #[serde(default)]
    playlist_limit: Option<usize>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = AppConfig::default();
        let vote_options = value
            .vote_options
            .filter(|options| !options.is_empty())
            .unwrap_or(defaults.vote_options);

        Self {
            vote_options,
            manager_roles: value.manager_roles,
            placeholder_title: value
                .placeholder_title
                .filter(|title| !title.trim().is_empty())
                .unwrap_or(defaults.placeholder_title),
            high_approval_threshold: value
                .high_approval_threshold
                .unwrap_or(defaults.high_approval_threshold),
            serialize_votes: value.serialize_votes.unwrap_or(defaults.serialize_votes),
            playlist_limit: value
                .playlist_limit
                .filter(|limit| *limit > 0)
                .unwrap_or(defaults.playlist_limit),
        }
    }
}

/// Storage backend selected through `STORE_BACKEND`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Process-local map, lost on restart.
    Memory,
    /// CouchDB over HTTP.
    Couch,
    /// MongoDB.
    Mongo,
}

impl StoreBackend {
    /// Read the backend from the environment, defaulting to [`StoreBackend::Memory`].
    pub fn from_env() -> Self {
        match env::var(STORE_BACKEND_ENV) {
            Ok(raw) => Self::parse(&raw).unwrap_or_else(|| {
                warn!(value = %raw, "unknown STORE_BACKEND; using in-memory store");
                StoreBackend::Memory
            }),
            Err(_) => StoreBackend::Memory,
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "memory" => Some(StoreBackend::Memory),
            "couch" | "couchdb" => Some(StoreBackend::Couch),
            "mongo" | "mongodb" => Some(StoreBackend::Mongo),
            _ => None,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Built-in score options shipped with the binary.
fn default_vote_options() -> Vec<VoteOption> {
    vec![
        VoteOption {
            score: 1,
            label: "Good".into(),
        },
        VoteOption {
            score: 2,
            label: "Great".into(),
        },
    ]
}
