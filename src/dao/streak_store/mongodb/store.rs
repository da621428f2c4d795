//! Driver side of the MongoDB streak store.

use std::sync::Arc;

use futures::future::BoxFuture;
use mongodb::{Client, Collection, Database, bson::doc};
use tokio::sync::RwLock;
use tracing::debug;

use super::{
    config::MongoConfig,
    error::{MongoDaoError, MongoResult},
    models::{MongoStreakDocument, doc_id, tracked_fields_update},
};
use crate::{
    dao::{models::Identity, storage::StorageResult, streak_store::StreakStore},
    state::streak::StreakState,
};

const STREAK_COLLECTION_NAME: &str = "streaks";

/// Cloud streak store keeping one document per user in the `streaks` collection.
#[derive(Clone)]
pub struct MongoStreakStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    database: RwLock<Database>,
    config: MongoConfig,
}

async fn open_database(config: &MongoConfig) -> MongoResult<Database> {
    let client = Client::with_options(config.options.clone())
        .map_err(|source| MongoDaoError::ClientConstruction { source })?;
    let database = client.database(&config.database_name);
    database
        .run_command(doc! { "ping": 1 })
        .await
        .map_err(|source| MongoDaoError::Ping { source })?;
    Ok(database)
}

impl MongoInner {
    async fn collection(&self) -> Collection<MongoStreakDocument> {
        self.database
            .read()
            .await
            .collection::<MongoStreakDocument>(STREAK_COLLECTION_NAME)
    }

    async fn ping(&self) -> MongoResult<()> {
        let database = self.database.read().await.clone();
        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::Ping { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let database = open_database(&self.config).await?;
        *self.database.write().await = database;
        Ok(())
    }
}

impl MongoStreakStore {
    /// Connect and ping once; retries are left to the caller.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let database = open_database(&config).await?;
        Ok(Self {
            inner: Arc::new(MongoInner {
                database: RwLock::new(database),
                config,
            }),
        })
    }
}

impl StreakStore for MongoStreakStore {
    fn load(&self, identity: &Identity) -> BoxFuture<'static, StorageResult<StreakState>> {
        let inner = self.inner.clone();
        let key = identity.key().to_owned();
        Box::pin(async move {
            let found = inner
                .collection()
                .await
                .find_one(doc_id(&key))
                .await
                .map_err(|source| MongoDaoError::LoadStreak {
                    key: key.clone(),
                    source,
                })?;
            Ok(found.map(StreakState::from).unwrap_or_default())
        })
    }

    fn save(&self, identity: &Identity, state: StreakState) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        let key = identity.key().to_owned();
        let update = tracked_fields_update(&state, identity.email());
        Box::pin(async move {
            inner
                .collection()
                .await
                .update_one(doc_id(&key), update)
                .upsert(true)
                .await
                .map_err(|source| MongoDaoError::SaveStreak {
                    key: key.clone(),
                    source,
                })?;
            debug!(%key, current = state.current_streak, "saved streak document");
            Ok(())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move { inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move { inner.reconnect().await.map_err(Into::into) })
    }
}
