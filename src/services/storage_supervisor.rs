use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{storage::StorageError, streak_store::StreakStore},
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECONNECT_ATTEMPTS: u32 = 3;

fn backoff(delay: Duration) -> Duration {
    (delay * 2).min(MAX_DELAY)
}

/// Keep a cloud streak store connected, flipping degraded mode as it comes and goes.
///
/// Authenticated sessions fail with a store error while degraded; device
/// sessions are unaffected.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn StreakStore>, StorageError>> + Send,
{
    let mut delay = INITIAL_DELAY;

    loop {
        match connect().await {
            Ok(store) => {
                state.install_cloud_store(store.clone()).await;
                info!("cloud store connected; leaving degraded mode");
                delay = INITIAL_DELAY;

                supervise(&state, store.as_ref()).await;
                warn!("exhausted cloud store reconnect attempts; reconnecting from scratch");
                state.clear_cloud_store().await;
            }
            Err(err) => {
                warn!(error = %err, "cloud store connection attempt failed");
            }
        }

        sleep(delay).await;
        delay = backoff(delay);
    }
}

/// Poll the store until it fails and cannot be revived in place.
async fn supervise(state: &SharedState, store: &dyn StreakStore) {
    loop {
        match store.health_check().await {
            Ok(()) => {
                if state.is_degraded() {
                    info!("cloud store healthy again; leaving degraded mode");
                    state.set_degraded(false);
                }
            }
            Err(err) => {
                warn!(error = %err, "cloud store health check failed; entering degraded mode");
                state.set_degraded(true);
                if !reconnect(store).await {
                    return;
                }
                state.set_degraded(false);
            }
        }
        sleep(HEALTH_POLL_INTERVAL).await;
    }
}

async fn reconnect(store: &dyn StreakStore) -> bool {
    let mut delay = INITIAL_DELAY;
    for attempt in 1..=MAX_RECONNECT_ATTEMPTS {
        match store.try_reconnect().await {
            Ok(()) => {
                info!(attempt, "cloud store reconnected");
                return true;
            }
            Err(err) => {
                warn!(attempt, error = %err, "cloud store reconnect attempt failed");
                sleep(delay).await;
                delay = backoff(delay);
            }
        }
    }
    false
}
