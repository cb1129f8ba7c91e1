use super::error::{MongoDaoError, MongoResult};

const DEFAULT_DATABASE: &str = "listening_party";

/// Connection settings for the MongoDB-backed store.
///
/// The URI is only parsed when connecting, so a bad URI surfaces through the
/// storage supervisor like any other connection failure.
#[derive(Debug, Clone)]
pub struct MongoConfig {
    /// Connection string.
    pub uri: String,
    /// Database holding the `kv` collection.
    pub database: String,
}

impl MongoConfig {
    /// Read `MONGO_URI` (required) and `MONGO_DB` (optional).
    pub fn from_env() -> MongoResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> MongoResult<Self> {
        let present = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let uri = present("MONGO_URI").ok_or(MongoDaoError::NotConfigured { var: "MONGO_URI" })?;
        Ok(Self {
            uri,
            database: present("MONGO_DB").unwrap_or_else(|| DEFAULT_DATABASE.to_owned()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uri_is_required_and_database_defaults() {
        assert!(matches!(
            MongoConfig::from_lookup(|_| None),
            Err(MongoDaoError::NotConfigured { var: "MONGO_URI" })
        ));

        let config = MongoConfig::from_lookup(|name| {
            (name == "MONGO_URI").then(|| "mongodb://localhost:27017".to_owned())
        })
        .unwrap();
        assert_eq!(config.database, "listening_party");
    }
}
