//! Single-slot cache of the word of the day.

use std::sync::Arc;

use futures::{
    FutureExt,
    future::{BoxFuture, Shared},
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    dao::{
        local_store::{DAILY_WORD_NAMESPACE, LocalKvStore},
        models::WordRecord,
        word_source::{WordSource, WordSourceResult},
    },
    state::date_key::DateKey,
};

const CURRENT_ENTRY_KEY: &str = "current";

type Acquisition = Shared<BoxFuture<'static, WordSourceResult<WordRecord>>>;

/// The word served for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// Day the record belongs to.
    pub date_key: DateKey,
    /// Record served for that day.
    pub record: WordRecord,
}

enum Slot {
    Empty,
    Ready(CacheEntry),
    Pending {
        date_key: DateKey,
        acquisition: Acquisition,
    },
}

/// Single-slot cache of the word of the day.
///
/// Only one day is remembered: observing a new day replaces the entry. Misses
/// for the same day share one in-flight acquisition, and a failed acquisition
/// leaves the slot empty so the next call tries again.
pub struct DailyCache {
    slot: Mutex<Slot>,
    persistence: Option<Arc<LocalKvStore>>,
}

impl Default for DailyCache {
    fn default() -> Self {
        Self::new()
    }
}

impl DailyCache {
    /// In-memory cache starting empty.
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot::Empty),
            persistence: None,
        }
    }

    /// Cache mirrored into the `daily_word` namespace of `kv`, warmed from
    /// whatever entry was persisted last.
    pub async fn with_persistence(kv: Arc<LocalKvStore>) -> Self {
        let slot = match kv
            .get::<CacheEntry>(DAILY_WORD_NAMESPACE, CURRENT_ENTRY_KEY)
            .await
        {
            Ok(Some(entry)) => {
                info!(date = %entry.date_key, word = %entry.record.word, "restored cached word");
                Slot::Ready(entry)
            }
            Ok(None) => Slot::Empty,
            Err(err) => {
                warn!(error = %err, "ignoring unreadable cached word");
                Slot::Empty
            }
        };

        Self {
            slot: Mutex::new(slot),
            persistence: Some(kv),
        }
    }

    /// Record cached for `key`, if the slot holds that day.
    pub async fn get(&self, key: DateKey) -> Option<WordRecord> {
        match &*self.slot.lock().await {
            Slot::Ready(entry) if entry.date_key == key => Some(entry.record.clone()),
            _ => None,
        }
    }

    /// Replace the slot with `record` for `key`.
    pub async fn put(&self, key: DateKey, record: WordRecord) {
        let entry = CacheEntry {
            date_key: key,
            record,
        };
        *self.slot.lock().await = Slot::Ready(entry.clone());
        self.persist(&entry).await;
    }

    /// Return the record for `key`, acquiring it from `source` on a miss.
    ///
    /// Concurrent callers asking for the same day await the same acquisition,
    /// so the provider is called once per day at most while it succeeds.
    pub async fn get_or_acquire(
        &self,
        key: DateKey,
        source: &dyn WordSource,
    ) -> WordSourceResult<WordRecord> {
        let acquisition = {
            let mut slot = self.slot.lock().await;
            match &*slot {
                Slot::Ready(entry) if entry.date_key == key => return Ok(entry.record.clone()),
                Slot::Pending {
                    date_key,
                    acquisition,
                } if *date_key == key => acquisition.clone(),
                _ => {
                    debug!(date = %key, source = source.name(), "acquiring word of the day");
                    let acquisition = source.acquire().shared();
                    *slot = Slot::Pending {
                        date_key: key,
                        acquisition: acquisition.clone(),
                    };
                    acquisition
                }
            }
        };

        let outcome = acquisition.clone().await;
        self.settle(key, &acquisition, &outcome).await;
        outcome
    }

    /// Resolve the pending placeholder installed for `acquisition`. Later
    /// waiters find the slot already settled and leave it alone.
    async fn settle(
        &self,
        key: DateKey,
        acquisition: &Acquisition,
        outcome: &WordSourceResult<WordRecord>,
    ) {
        let settled = {
            let mut slot = self.slot.lock().await;
            let owns_slot = matches!(
                &*slot,
                Slot::Pending { date_key, acquisition: pending }
                    if *date_key == key && Shared::ptr_eq(pending, acquisition)
            );
            if !owns_slot {
                return;
            }

            match outcome {
                Ok(record) => {
                    let entry = CacheEntry {
                        date_key: key,
                        record: record.clone(),
                    };
                    *slot = Slot::Ready(entry.clone());
                    Some(entry)
                }
                Err(err) => {
                    warn!(date = %key, error = %err, "word acquisition failed");
                    *slot = Slot::Empty;
                    None
                }
            }
        };

        if let Some(entry) = settled {
            info!(date = %entry.date_key, word = %entry.record.word, "cached word of the day");
            self.persist(&entry).await;
        }
    }

    async fn persist(&self, entry: &CacheEntry) {
        let Some(kv) = &self.persistence else {
            return;
        };
        if let Err(err) = kv.put(DAILY_WORD_NAMESPACE, CURRENT_ENTRY_KEY, entry).await {
            warn!(error = %err, "failed to persist cached word");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    use super::*;
    use crate::dao::word_source::WordSourceError;

    fn record(word: &str) -> WordRecord {
        WordRecord::validated(
            Some(word.into()),
            Some(format!("meaning of {word}")),
            Some(format!("an example with {word}")),
        )
        .unwrap()
    }

    fn day(text: &str) -> DateKey {
        text.parse().unwrap()
    }

    /// Sleeps before answering so concurrent callers overlap; fails while `failures` > 0.
    struct CountingSource {
        calls: AtomicUsize,
        failures: AtomicUsize,
    }

    impl CountingSource {
        fn new(failures: usize) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                failures: AtomicUsize::new(failures),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl WordSource for CountingSource {
        fn acquire(&self) -> BoxFuture<'static, WordSourceResult<WordRecord>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            let fail = self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
                .is_ok();
            Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                if fail {
                    Err(WordSourceError::unavailable("counting", "boom"))
                } else {
                    Ok(record(&format!("word{call}")))
                }
            })
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }

    #[tokio::test]
    async fn put_then_get_round_trips_for_the_same_day() {
        let cache = DailyCache::new();
        cache.put(day("2024-03-01"), record("serendipity")).await;

        assert_eq!(cache.get(day("2024-03-01")).await, Some(record("serendipity")));
        assert_eq!(cache.get(day("2024-03-02")).await, None);
    }

    #[tokio::test]
    async fn new_day_replaces_the_entry() {
        let cache = DailyCache::new();
        cache.put(day("2024-03-01"), record("old")).await;
        cache.put(day("2024-03-02"), record("new")).await;

        assert_eq!(cache.get(day("2024-03-01")).await, None);
        assert_eq!(cache.get(day("2024-03-02")).await, Some(record("new")));
    }

    #[tokio::test]
    async fn concurrent_misses_share_one_acquisition() {
        let cache = Arc::new(DailyCache::new());
        let source = CountingSource::new(0);
        let today = day("2024-03-01");

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            let source = source.clone();
            handles.push(tokio::spawn(async move {
                cache.get_or_acquire(today, source.as_ref()).await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), record("word1"));
        }
        assert_eq!(source.calls(), 1);
        assert_eq!(cache.get(today).await, Some(record("word1")));
    }

    #[tokio::test]
    async fn failed_acquisition_does_not_poison_the_slot() {
        let cache = DailyCache::new();
        let source = CountingSource::new(1);
        let today = day("2024-03-01");

        let first = cache.get_or_acquire(today, source.as_ref()).await;
        assert!(matches!(first, Err(WordSourceError::ProviderUnavailable { .. })));
        assert_eq!(cache.get(today).await, None);

        let second = cache.get_or_acquire(today, source.as_ref()).await.unwrap();
        assert_eq!(second, record("word2"));
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn cached_day_skips_the_source() {
        let cache = DailyCache::new();
        let source = CountingSource::new(0);
        cache.put(day("2024-03-01"), record("kept")).await;

        let got = cache
            .get_or_acquire(day("2024-03-01"), source.as_ref())
            .await
            .unwrap();
        assert_eq!(got, record("kept"));
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn persisted_entry_warms_a_new_cache() {
        let dir = tempfile::tempdir().unwrap();
        let kv = Arc::new(LocalKvStore::open(dir.path()).await.unwrap());

        let cache = DailyCache::with_persistence(kv.clone()).await;
        let source = CountingSource::new(0);
        cache
            .get_or_acquire(day("2024-03-01"), source.as_ref())
            .await
            .unwrap();

        let reopened = DailyCache::with_persistence(kv).await;
        assert_eq!(reopened.get(day("2024-03-01")).await, Some(record("word1")));
        assert_eq!(reopened.get(day("2024-03-02")).await, None);
    }
}
