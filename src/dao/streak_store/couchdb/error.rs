//! Error types for the CouchDB streak store.

use reqwest::StatusCode;
use thiserror::Error;

/// Convenient result alias returning [`CouchDaoError`] failures.
pub type CouchResult<T> = Result<T, CouchDaoError>;

/// Failures that can occur while talking to CouchDB.
#[derive(Debug, Error)]
pub enum CouchDaoError {
    /// Required environment variable is missing.
    #[error("missing CouchDB environment variable `{var}`")]
    MissingEnvVar {
        /// Variable name.
        var: &'static str,
    },
    /// `COUCH_BASE_URL` is not an absolute http(s) URL.
    #[error("invalid CouchDB base URL `{url}`: {reason}")]
    InvalidBaseUrl {
        /// Configured value.
        url: String,
        /// Why it was rejected.
        reason: String,
    },
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build CouchDB client")]
    ClientBuilder {
        /// Underlying error.
        #[source]
        source: reqwest::Error,
    },
    /// The database endpoint could not be reached.
    #[error("failed to reach CouchDB database `{database}`")]
    Database {
        /// Database name.
        database: String,
        /// Underlying error.
        #[source]
        source: reqwest::Error,
    },
    /// The database endpoint answered with an unexpected status.
    #[error("unexpected status {status} from CouchDB database `{database}`")]
    DatabaseStatus {
        /// Database name.
        database: String,
        /// Status returned.
        status: StatusCode,
    },
    /// A streak document request could not be sent or timed out.
    #[error("failed to send CouchDB request for `{doc_id}`")]
    Send {
        /// Document id.
        doc_id: String,
        /// Underlying error.
        #[source]
        source: reqwest::Error,
    },
    /// Someone else wrote the document between our read and our write.
    #[error("CouchDB revision conflict on `{doc_id}`")]
    Conflict {
        /// Document id.
        doc_id: String,
    },
    /// CouchDB refused or failed a document request.
    #[error("unexpected status {status} from CouchDB for `{doc_id}`")]
    Status {
        /// Document id.
        doc_id: String,
        /// Status returned.
        status: StatusCode,
    },
    /// The stored document is not a JSON object.
    #[error("failed to decode CouchDB document `{doc_id}`")]
    Decode {
        /// Document id.
        doc_id: String,
        /// Underlying error.
        #[source]
        source: reqwest::Error,
    },
}
