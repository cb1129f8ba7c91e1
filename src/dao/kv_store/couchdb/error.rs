use reqwest::StatusCode;
use thiserror::Error;

/// Result alias for CouchDB calls.
pub type CouchResult<T> = Result<T, CouchDaoError>;

/// Failures talking to CouchDB. `target` is a store key or the database name.
#[derive(Debug, Error)]
pub enum CouchDaoError {
    /// A required environment variable is missing.
    #[error("CouchDB is not configured: `{var}` is unset")]
    NotConfigured {
        /// Name of the unset variable.
        var: &'static str,
    },
    /// The HTTP client could not be built.
    #[error("could not build the CouchDB HTTP client")]
    Client(#[source] reqwest::Error),
    /// The request never got an answer.
    #[error("CouchDB request for `{target}` did not complete")]
    Transport {
        /// Key or database the request addressed.
        target: String,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },
    /// Unexpected HTTP status.
    #[error("CouchDB answered {status} for `{target}`")]
    Status {
        /// Key or database the request addressed.
        target: String,
        /// Status returned by the server.
        status: StatusCode,
    },
    /// The body did not decode as a store document.
    #[error("CouchDB document for `{target}` is not a store entry")]
    Malformed {
        /// Key whose document failed to decode.
        target: String,
        /// Decode error.
        #[source]
        source: reqwest::Error,
    },
    /// Concurrent writers kept replacing the revision.
    #[error("revision of `{target}` kept moving; gave up after {attempts} writes")]
    RevisionConflict {
        /// Key being written.
        target: String,
        /// Writes attempted before giving up.
        attempts: u32,
    },
}
