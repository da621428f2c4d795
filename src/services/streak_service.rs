use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use tokio::time::timeout;
use tracing::debug;

use crate::{
    dao::{models::Identity, storage::StorageResult, streak_store::StreakStore},
    error::ServiceError,
    state::{
        SharedState,
        date_key::DateKey,
        streak::{StreakState, StreakSummary, transition},
    },
};

/// Count a visit of `identity` on `today` and report the resulting counters.
///
/// Load, transition and save run under the identity's gate so two sessions of
/// the same identity never interleave; the save completes before the counters
/// are reported.
pub async fn record_visit(
    state: &SharedState,
    identity: &Identity,
    today: DateKey,
) -> Result<StreakSummary, ServiceError> {
    let store = select_store(state, identity).await?;
    let scope = identity.scope_key();

    let gate = state.identity_gate(&scope);
    let outcome = {
        let _guard = gate.lock().await;
        update(state.store_timeout(), store.as_ref(), identity, today).await
    };
    drop(gate);
    state.release_identity_gate(&scope);

    let next = outcome?;
    debug!(
        identity = %scope,
        current = next.current_streak,
        best = next.best_streak,
        "recorded visit"
    );
    Ok(next.summary())
}

async fn update(
    limit: Duration,
    store: &dyn StreakStore,
    identity: &Identity,
    today: DateKey,
) -> Result<StreakState, ServiceError> {
    let current = bounded(limit, store.load(identity)).await?;
    let next = transition(current, today);
    bounded(limit, store.save(identity, next)).await?;
    Ok(next)
}

/// Authenticated identities use the cloud store, everyone else the local one.
async fn select_store(
    state: &SharedState,
    identity: &Identity,
) -> Result<Arc<dyn StreakStore>, ServiceError> {
    if identity.is_authenticated() {
        state.cloud_streaks().await.ok_or(ServiceError::Degraded)
    } else {
        Ok(state.local_streaks())
    }
}

async fn bounded<T>(
    limit: Duration,
    call: BoxFuture<'static, StorageResult<T>>,
) -> Result<T, ServiceError> {
    match timeout(limit, call).await {
        Ok(result) => result.map_err(ServiceError::from),
        Err(_) => Err(ServiceError::Timeout),
    }
}
