use super::error::{CouchDaoError, CouchResult};

const DEFAULT_DATABASE: &str = "listening_party";

/// Where the CouchDB store lives and how to authenticate against it.
#[derive(Debug, Clone)]
pub struct CouchConfig {
    /// Server root without a trailing slash.
    pub base_url: String,
    /// Database holding the party documents.
    pub database: String,
    /// Basic auth user and password.
    pub credentials: Option<(String, String)>,
}

impl CouchConfig {
    /// Read `COUCH_BASE_URL` (required), `COUCH_DB` and the optional
    /// `COUCH_USERNAME`/`COUCH_PASSWORD` pair.
    pub fn from_env() -> CouchResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> CouchResult<Self> {
        let present = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let base_url = present("COUCH_BASE_URL").ok_or(CouchDaoError::NotConfigured {
            var: "COUCH_BASE_URL",
        })?;
        let database = present("COUCH_DB").unwrap_or_else(|| DEFAULT_DATABASE.to_owned());

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            database,
            credentials: present("COUCH_USERNAME").zip(present("COUCH_PASSWORD")),
        })
    }

    /// Absolute URL of the database.
    pub fn database_url(&self) -> String {
        format!("{}/{}", self.base_url, self.database)
    }
}
