use mongodb::error::Error as MongoError;
use thiserror::Error;

/// Result alias for MongoDB calls.
pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

/// Failures talking to MongoDB.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// A required environment variable is missing.
    #[error("MongoDB is not configured: `{var}` is unset")]
    NotConfigured {
        /// Name of the unset variable.
        var: &'static str,
    },
    /// The URI was rejected by the driver.
    #[error("could not create a MongoDB client for `{uri}`")]
    Client {
        /// URI handed to the driver.
        uri: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The server never answered a ping.
    #[error("MongoDB did not answer a ping after {attempts} attempt(s)")]
    Unreachable {
        /// Pings attempted.
        attempts: u32,
        /// Last ping error.
        #[source]
        source: MongoError,
    },
    /// A read or write on the collection failed.
    #[error("MongoDB command on the `kv` collection failed")]
    Command(#[source] MongoError),
}
