//! Streak store for device identities, kept in the local key-value store.

use std::sync::Arc;

use futures::future::BoxFuture;

use super::StreakStore;
use crate::{
    dao::{
        local_store::{LocalKvStore, STREAK_NAMESPACE},
        models::Identity,
        storage::StorageResult,
    },
    state::streak::StreakState,
};

/// Streak records kept in the device-local store, keyed by device id.
#[derive(Clone)]
pub struct LocalStreakStore {
    kv: Arc<LocalKvStore>,
}

impl LocalStreakStore {
    /// Store records in the `streak` namespace of `kv`.
    pub fn new(kv: Arc<LocalKvStore>) -> Self {
        Self { kv }
    }
}

impl StreakStore for LocalStreakStore {
    fn load(&self, identity: &Identity) -> BoxFuture<'static, StorageResult<StreakState>> {
        let kv = self.kv.clone();
        let key = identity.key().to_owned();
        Box::pin(async move {
            let stored = kv.get::<StreakState>(STREAK_NAMESPACE, &key).await?;
            Ok(stored.unwrap_or_default())
        })
    }

    fn save(&self, identity: &Identity, state: StreakState) -> BoxFuture<'static, StorageResult<()>> {
        let kv = self.kv.clone();
        let key = identity.key().to_owned();
        Box::pin(async move {
            kv.put(STREAK_NAMESPACE, &key, &state)
                .await
                .map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
