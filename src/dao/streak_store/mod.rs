//! Persistence of streak state per identity.

#[cfg(feature = "couch-store")]
pub mod couchdb;
pub mod local;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use futures::future::BoxFuture;

use crate::{
    dao::{models::Identity, storage::StorageResult},
    state::streak::StreakState,
};

/// Persistence for streak counters, one record per identity.
///
/// `load` returns the default state when no record exists; `save` overwrites
/// every tracked field of the record at once.
pub trait StreakStore: Send + Sync {
    /// Read the streak record of `identity`.
    fn load(&self, identity: &Identity) -> BoxFuture<'static, StorageResult<StreakState>>;
    /// Replace the streak record of `identity`.
    fn save(&self, identity: &Identity, state: StreakState) -> BoxFuture<'static, StorageResult<()>>;
    /// Cheap connectivity probe.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the backend connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
