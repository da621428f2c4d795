//! Session flow: the word of the day and the visitor's streak, computed side by side.

use tokio::{sync::watch, time::timeout};
use tokio_stream::{StreamExt, wrappers::WatchStream};
use tracing::{info, warn};

use crate::{
    dao::{
        models::{Identity, UserProfile, WordRecord},
        word_source::WordSourceError,
    },
    error::ServiceError,
    services::{streak_service, word_service},
    state::{SharedState, date_key::DateKey, streak::StreakSummary},
};

/// Outcome of the word flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordOutcome {
    /// Word of the day.
    Ready(WordRecord),
    /// Acquisition failed.
    Failed {
        /// Failure class.
        kind: &'static str,
        /// Rendered failure.
        message: String,
    },
}

/// Outcome of the streak flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreakOutcome {
    /// Counters after this visit.
    Ready(StreakSummary),
    /// The store could not be used; `retained` holds the counters last shown
    /// for the same identity, if any.
    Unavailable {
        /// Rendered failure.
        message: String,
        /// Previously displayed counters.
        retained: Option<StreakSummary>,
    },
}

/// Everything shown to a visitor when a session starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    /// Day both flows were computed for.
    pub date: DateKey,
    /// Who the session belongs to.
    pub identity: Identity,
    /// Word flow result.
    pub word: WordOutcome,
    /// Streak flow result.
    pub streak: StreakOutcome,
}

/// Identity transitions reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityEvent {
    /// A user signed in.
    SignedIn(UserProfile),
    /// Back to the anonymous device identity.
    SignedOut,
}

/// Run the word flow and the streak flow for `identity`.
///
/// The flows run concurrently and fail independently: a provider outage still
/// yields a streak, a store outage still yields a word. The word flow is cut
/// off after the state's word deadline so a slow provider cannot hold the
/// streak back; the acquisition itself stays pending in the daily cache.
pub async fn start_session(state: &SharedState, identity: Identity) -> SessionView {
    let date = state.today();
    let (word, streak) = tokio::join!(
        word_within_deadline(state, date),
        streak_service::record_visit(state, &identity, date),
    );

    let word = match word {
        Ok(record) => WordOutcome::Ready(record),
        Err(err) => {
            warn!(%date, error = %err, "word flow failed");
            WordOutcome::Failed {
                kind: err.kind(),
                message: err.to_string(),
            }
        }
    };

    let scope = identity.scope_key();
    let streak = match streak {
        Ok(summary) => {
            state.remember_streak(&scope, summary).await;
            StreakOutcome::Ready(summary)
        }
        Err(err) => {
            warn!(identity = %scope, error = %err, "streak flow failed");
            StreakOutcome::Unavailable {
                message: err.to_string(),
                retained: state.last_streak(&scope).await,
            }
        }
    };

    SessionView {
        date,
        identity,
        word,
        streak,
    }
}

async fn word_within_deadline(
    state: &SharedState,
    date: DateKey,
) -> Result<WordRecord, ServiceError> {
    let deadline = state.word_deadline();
    match timeout(deadline, word_service::word_for(state, date)).await {
        Ok(result) => result,
        Err(_) => Err(WordSourceError::unavailable(
            state.word_source().name(),
            format!("no word within {}ms", deadline.as_millis()),
        )
        .into()),
    }
}

/// Re-run the session every time the identity changes, publishing each view.
///
/// The current event is handled first. Returns once the event sender is gone
/// or nobody listens to the views anymore.
pub async fn follow_identity(
    state: SharedState,
    events: watch::Receiver<IdentityEvent>,
    views: watch::Sender<Option<SessionView>>,
) -> Result<(), ServiceError> {
    let device_id = state
        .local_kv()
        .device_id()
        .await
        .map_err(|err| ServiceError::Store(err.into()))?;
    let mut events = WatchStream::new(events);

    while let Some(event) = events.next().await {
        let identity = match event {
            IdentityEvent::SignedIn(profile) => Identity::User(profile),
            IdentityEvent::SignedOut => Identity::Device {
                device_id: device_id.clone(),
            },
        };
        info!(identity = %identity.scope_key(), "identity changed; starting session");

        let view = start_session(&state, identity).await;
        if views.send(Some(view)).is_err() {
            break;
        }
    }

    Ok(())
}
