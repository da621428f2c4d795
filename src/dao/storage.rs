use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by streak stores regardless of the underlying backend.
///
/// Never means "no record": a missing record loads as the default state.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached, refused the request or returned garbage.
    #[error("store unavailable: {message}")]
    Unavailable {
        /// Rendered backend failure.
        message: String,
        /// Backend error.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }
}
