#![allow(dead_code)]

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use daily_word_back::{
    dao::{
        local_store::LocalKvStore,
        models::{Identity, WordRecord},
        storage::{StorageError, StorageResult},
        streak_store::StreakStore,
        word_source::{WordSource, WordSourceError, WordSourceResult},
    },
    state::{
        AppComponents, AppState, DEFAULT_STORE_TIMEOUT, DEFAULT_WORD_DEADLINE, SharedState,
        daily_cache::DailyCache,
        date_key::{DateKey, FixedClock},
        streak::StreakState,
    },
};
use futures::future::BoxFuture;

pub fn day(text: &str) -> DateKey {
    text.parse().unwrap()
}

pub fn record(word: &str) -> WordRecord {
    WordRecord::validated(
        Some(word.into()),
        Some(format!("meaning of {word}")),
        Some(format!("an example using {word}")),
    )
    .unwrap()
}

/// Hands out `word1`, `word2`, ... and can be switched to failing or slow.
pub struct ScriptedSource {
    calls: AtomicUsize,
    failing: AtomicBool,
    delay: Mutex<Option<Duration>>,
}

impl ScriptedSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
            delay: Mutex::new(None),
        })
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        let source = Self::new();
        *source.delay.lock().unwrap() = Some(delay);
        source
    }

    pub fn failing() -> Arc<Self> {
        let source = Self::new();
        source.set_failing(true);
        source
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl WordSource for ScriptedSource {
    fn acquire(&self) -> BoxFuture<'static, WordSourceResult<WordRecord>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let failing = self.failing.load(Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if failing {
                Err(WordSourceError::unavailable("scripted", "upstream down"))
            } else {
                Ok(record(&format!("word{call}")))
            }
        })
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// In-memory cloud store that can be switched offline.
#[derive(Default)]
pub struct MemoryCloudStore {
    records: Mutex<std::collections::HashMap<String, StreakState>>,
    offline: AtomicBool,
}

#[derive(Debug, thiserror::Error)]
#[error("connection refused")]
struct Offline;

impl MemoryCloudStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn stored(&self, user_id: &str) -> Option<StreakState> {
        self.records.lock().unwrap().get(user_id).copied()
    }

    fn check(&self) -> StorageResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StorageError::unavailable("connection refused".into(), Offline))
        } else {
            Ok(())
        }
    }
}

impl StreakStore for MemoryCloudStore {
    fn load(&self, identity: &Identity) -> BoxFuture<'static, StorageResult<StreakState>> {
        let result = self
            .check()
            .map(|()| self.stored(identity.key()).unwrap_or_default());
        Box::pin(async move { result })
    }

    fn save(&self, identity: &Identity, state: StreakState) -> BoxFuture<'static, StorageResult<()>> {
        let result = self.check().map(|()| {
            self.records
                .lock()
                .unwrap()
                .insert(identity.key().to_owned(), state);
        });
        Box::pin(async move { result })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let result = self.check();
        Box::pin(async move { result })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let result = self.check();
        Box::pin(async move { result })
    }
}

/// Cloud store whose calls never complete.
pub struct HangingStore;

impl StreakStore for HangingStore {
    fn load(&self, _identity: &Identity) -> BoxFuture<'static, StorageResult<StreakState>> {
        Box::pin(futures::future::pending())
    }

    fn save(&self, _identity: &Identity, _state: StreakState) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(futures::future::pending())
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

pub struct Limits {
    pub store_timeout: Duration,
    pub word_deadline: Duration,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            store_timeout: DEFAULT_STORE_TIMEOUT,
            word_deadline: DEFAULT_WORD_DEADLINE,
        }
    }
}

pub struct Harness {
    pub state: SharedState,
    pub clock: Arc<FixedClock>,
    pub source: Arc<ScriptedSource>,
    _dir: tempfile::TempDir,
}

pub async fn harness(today: &str, source: Arc<ScriptedSource>) -> Harness {
    harness_with(today, source, Limits::default()).await
}

pub async fn harness_with(today: &str, source: Arc<ScriptedSource>, limits: Limits) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(FixedClock::new(day(today)));
    let state = AppState::new(AppComponents {
        clock: clock.clone(),
        word_source: source.clone(),
        daily_cache: DailyCache::new(),
        local_kv: Arc::new(LocalKvStore::open(dir.path()).await.unwrap()),
        store_timeout: limits.store_timeout,
        word_deadline: limits.word_deadline,
    });

    Harness {
        state,
        clock,
        source,
        _dir: dir,
    }
}
