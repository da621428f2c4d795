//! Data access: word providers, streak stores and the local key-value store.

/// Device-local key-value store.
pub mod local_store;
/// Domain records shared across layers.
pub mod models;
/// Storage error boundary.
pub mod storage;
/// Streak persistence backends.
pub mod streak_store;
/// Word of the day providers.
pub mod word_source;
