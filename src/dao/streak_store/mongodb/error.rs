//! Error types for the MongoDB streak store.

use mongodb::error::Error as MongoError;
use thiserror::Error;

/// Convenient result alias returning [`MongoDaoError`] failures.
pub type MongoResult<T> = Result<T, MongoDaoError>;

/// Failures that can occur while talking to MongoDB.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// Required environment variable is missing.
    #[error("missing MongoDB environment variable `{var}`")]
    MissingEnvVar {
        /// Variable name.
        var: &'static str,
    },
    /// The connection string could not be parsed.
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        /// Rejected connection string.
        uri: String,
        /// Underlying error.
        #[source]
        source: MongoError,
    },
    /// The driver refused the parsed options.
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        /// Underlying error.
        #[source]
        source: MongoError,
    },
    /// The server did not answer a ping.
    #[error("MongoDB ping failed")]
    Ping {
        /// Underlying error.
        #[source]
        source: MongoError,
    },
    /// Reading a streak document failed.
    #[error("failed to load streak for `{key}`")]
    LoadStreak {
        /// Identity key.
        key: String,
        /// Underlying error.
        #[source]
        source: MongoError,
    },
    /// Writing a streak document failed.
    #[error("failed to save streak for `{key}`")]
    SaveStreak {
        /// Identity key.
        key: String,
        /// Underlying error.
        #[source]
        source: MongoError,
    },
}
