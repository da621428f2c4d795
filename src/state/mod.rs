//! Shared application state and the per-identity bookkeeping around it.

pub mod daily_cache;
pub mod date_key;
pub mod streak;

use std::{num::NonZeroUsize, sync::Arc, time::Duration};

use dashmap::DashMap;
use lru::LruCache;
use tokio::sync::{Mutex, RwLock, watch};

use crate::dao::{
    local_store::LocalKvStore,
    streak_store::{StreakStore, local::LocalStreakStore},
    word_source::WordSource,
};

use self::{
    daily_cache::DailyCache,
    date_key::{Clock, DateKey},
    streak::StreakSummary,
};

/// Handle to [`AppState`] shared by handlers and background tasks.
pub type SharedState = Arc<AppState>;
/// Default bound on every store call made while serving a session.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(8);
/// Default time a session waits for the word of the day.
pub const DEFAULT_WORD_DEADLINE: Duration = Duration::from_secs(15);
/// Identities whose last reported streak is retained for store outages.
pub const RETAINED_STREAKS: NonZeroUsize = match NonZeroUsize::new(1024) {
    Some(capacity) => capacity,
    None => NonZeroUsize::MIN,
};

/// Everything [`AppState`] needs that is decided at startup.
pub struct AppComponents {
    /// Source of "today".
    pub clock: Arc<dyn Clock>,
    /// Strategy producing the word of the day.
    pub word_source: Arc<dyn WordSource>,
    /// Cache shared by every request.
    pub daily_cache: DailyCache,
    /// Device-local key-value store.
    pub local_kv: Arc<LocalKvStore>,
    /// Bound applied to streak store calls.
    pub store_timeout: Duration,
    /// Time a session waits for the word flow before reporting it failed.
    pub word_deadline: Duration,
}

/// Central application state: the word pipeline, the streak stores and the
/// per-identity bookkeeping.
pub struct AppState {
    clock: Arc<dyn Clock>,
    word_source: Arc<dyn WordSource>,
    daily_cache: DailyCache,
    local_kv: Arc<LocalKvStore>,
    local_streaks: Arc<dyn StreakStore>,
    cloud_streaks: RwLock<Option<Arc<dyn StreakStore>>>,
    degraded: watch::Sender<bool>,
    identity_gates: DashMap<String, Arc<Mutex<()>>>,
    last_streaks: Mutex<LruCache<String, StreakSummary>>,
    store_timeout: Duration,
    word_deadline: Duration,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a cloud store is installed.
    pub fn new(components: AppComponents) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        let local_streaks: Arc<dyn StreakStore> =
            Arc::new(LocalStreakStore::new(components.local_kv.clone()));
        Arc::new(Self {
            clock: components.clock,
            word_source: components.word_source,
            daily_cache: components.daily_cache,
            local_kv: components.local_kv,
            local_streaks,
            cloud_streaks: RwLock::new(None),
            degraded: degraded_tx,
            identity_gates: DashMap::new(),
            last_streaks: Mutex::new(LruCache::new(RETAINED_STREAKS)),
            store_timeout: components.store_timeout,
            word_deadline: components.word_deadline,
        })
    }

    /// Current calendar day according to the configured clock.
    pub fn today(&self) -> DateKey {
        self.clock.today()
    }

    /// Configured word source.
    pub fn word_source(&self) -> &dyn WordSource {
        self.word_source.as_ref()
    }

    /// Cache of the word of the day.
    pub fn daily_cache(&self) -> &DailyCache {
        &self.daily_cache
    }

    /// Device-local key-value store.
    pub fn local_kv(&self) -> &Arc<LocalKvStore> {
        &self.local_kv
    }

    /// Streak store used for device identities.
    pub fn local_streaks(&self) -> Arc<dyn StreakStore> {
        self.local_streaks.clone()
    }

    /// Obtain a handle to the cloud streak store, if one is installed.
    pub async fn cloud_streaks(&self) -> Option<Arc<dyn StreakStore>> {
        let guard = self.cloud_streaks.read().await;
        guard.as_ref().cloned()
    }

    /// Install a cloud streak store and leave degraded mode.
    pub async fn install_cloud_store(&self, store: Arc<dyn StreakStore>) {
        {
            let mut guard = self.cloud_streaks.write().await;
            *guard = Some(store);
        }
        self.set_degraded(false);
    }

    /// Remove the cloud streak store and enter degraded mode.
    pub async fn clear_cloud_store(&self) {
        {
            let mut guard = self.cloud_streaks.write().await;
            guard.take();
        }
        self.set_degraded(true);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub fn set_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }

    /// Gate serializing streak updates for one identity key.
    pub fn identity_gate(&self, scope_key: &str) -> Arc<Mutex<()>> {
        self.identity_gates
            .entry(scope_key.to_owned())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop the gate of `scope_key` once no session holds or awaits it.
    ///
    /// Callers release their own handle first; the entry goes away only when
    /// the map holds the last reference.
    pub fn release_identity_gate(&self, scope_key: &str) {
        self.identity_gates
            .remove_if(scope_key, |_, gate| Arc::strong_count(gate) == 1);
    }

    /// Number of identities with a live gate.
    pub fn identity_gate_count(&self) -> usize {
        self.identity_gates.len()
    }

    /// Last streak reported for an identity key.
    pub async fn last_streak(&self, scope_key: &str) -> Option<StreakSummary> {
        self.last_streaks.lock().await.get(scope_key).copied()
    }

    /// Remember the streak just reported for an identity key, evicting the
    /// least recently used identity when full.
    pub async fn remember_streak(&self, scope_key: &str, summary: StreakSummary) {
        self.last_streaks
            .lock()
            .await
            .put(scope_key.to_owned(), summary);
    }

    /// Number of identities whose last streak is retained.
    pub async fn retained_streak_count(&self) -> usize {
        self.last_streaks.lock().await.len()
    }

    /// Bound applied to streak store calls.
    pub fn store_timeout(&self) -> Duration {
        self.store_timeout
    }

    /// Time a session waits for the word of the day.
    pub fn word_deadline(&self) -> Duration {
        self.word_deadline
    }
}

#[cfg(test)]
mod tests {
    use futures::future::BoxFuture;

    use super::*;
    use crate::dao::{
        models::{Identity, WordRecord},
        storage::StorageResult,
        word_source::{WordSourceError, WordSourceResult},
    };
    use crate::state::{date_key::FixedClock, streak::StreakState};

    struct NoWords;

    impl WordSource for NoWords {
        fn acquire(&self) -> BoxFuture<'static, WordSourceResult<WordRecord>> {
            Box::pin(async { Err(WordSourceError::NoDefinitionFound { attempts: 1 }) })
        }

        fn name(&self) -> &'static str {
            "none"
        }
    }

    struct NullStore;

    impl StreakStore for NullStore {
        fn load(&self, _identity: &Identity) -> BoxFuture<'static, StorageResult<StreakState>> {
            Box::pin(async { Ok(StreakState::default()) })
        }

        fn save(&self, _identity: &Identity, _state: StreakState) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(async { Ok(()) })
        }

        fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(async { Ok(()) })
        }

        fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(async { Ok(()) })
        }
    }

    async fn state(dir: &tempfile::TempDir) -> SharedState {
        AppState::new(AppComponents {
            clock: Arc::new(FixedClock::new("2024-01-01".parse().unwrap())),
            word_source: Arc::new(NoWords),
            daily_cache: DailyCache::new(),
            local_kv: Arc::new(LocalKvStore::open(dir.path()).await.unwrap()),
            store_timeout: DEFAULT_STORE_TIMEOUT,
            word_deadline: DEFAULT_WORD_DEADLINE,
        })
    }

    #[tokio::test]
    async fn installing_a_cloud_store_leaves_degraded_mode() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir).await;
        let mut watcher = state.degraded_watcher();
        assert!(state.is_degraded());
        assert!(state.cloud_streaks().await.is_none());

        state.install_cloud_store(Arc::new(NullStore)).await;
        assert!(!state.is_degraded());
        assert!(watcher.has_changed().unwrap());
        assert!(!*watcher.borrow_and_update());

        state.clear_cloud_store().await;
        assert!(state.is_degraded());
        assert!(state.cloud_streaks().await.is_none());
    }

    #[tokio::test]
    async fn identity_gates_are_per_key() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir).await;

        let first = state.identity_gate("user:a");
        let again = state.identity_gate("user:a");
        let other = state.identity_gate("device:a");

        assert!(Arc::ptr_eq(&first, &again));
        assert!(!Arc::ptr_eq(&first, &other));

        let _held = first.lock().await;
        assert!(other.try_lock().is_ok());
    }

    #[tokio::test]
    async fn released_gates_leave_the_map_once_unused() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir).await;

        let held = state.identity_gate("device:a");
        let waiting = state.identity_gate("device:a");
        drop(held);
        state.release_identity_gate("device:a");
        assert_eq!(state.identity_gate_count(), 1);

        drop(waiting);
        state.release_identity_gate("device:a");
        assert_eq!(state.identity_gate_count(), 0);
    }

    #[tokio::test]
    async fn retained_streaks_evict_the_least_recent_identity() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir).await;
        let summary = StreakState::default().summary();

        state.remember_streak("device:first", summary).await;
        for n in 0..RETAINED_STREAKS.get() {
            state.remember_streak(&format!("device:{n}"), summary).await;
        }

        assert_eq!(state.retained_streak_count().await, RETAINED_STREAKS.get());
        assert!(state.last_streak("device:first").await.is_none());
        assert!(state.last_streak("device:0").await.is_some());
    }
}
