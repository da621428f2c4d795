//! Daily Word Back binary entrypoint wiring the word pipeline, streak stores and REST layer.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use daily_word_back::{
    config::AppConfig,
    dao::{local_store::LocalKvStore, word_source},
    routes,
    state::{
        AppComponents, AppState, SharedState, daily_cache::DailyCache, date_key::SystemClock,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let client = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()
        .context("building HTTP client")?;
    let word_source = word_source::from_config(&config.word_source, client);
    info!(source = word_source.name(), "word source ready");

    let local_kv = Arc::new(
        LocalKvStore::open(&config.data_dir)
            .await
            .context("opening local store")?,
    );
    let daily_cache = if config.persist_daily_word {
        DailyCache::with_persistence(local_kv.clone()).await
    } else {
        DailyCache::new()
    };

    let app_state = AppState::new(AppComponents {
        clock: Arc::new(SystemClock),
        word_source,
        daily_cache,
        local_kv,
        store_timeout: config.request_timeout,
        word_deadline: config.word_deadline,
    });

    spawn_cloud_supervisor(app_state.clone(), &config);
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Start supervising the cloud streak store selected by the environment.
///
/// MongoDB wins when both backends are compiled in and `MONGO_URI` is set.
/// Without any cloud store the server stays degraded: device sessions work,
/// authenticated sessions report the store as unavailable.
#[allow(unused_variables)]
fn spawn_cloud_supervisor(state: SharedState, config: &AppConfig) {
    #[cfg(feature = "mongo-store")]
    {
        use daily_word_back::{
            dao::{
                storage::StorageError,
                streak_store::{
                    StreakStore,
                    mongodb::{MongoConfig, MongoStreakStore},
                },
            },
            services::storage_supervisor,
        };

        if env::var_os("MONGO_URI").is_some() {
            info!("supervising MongoDB streak store");
            tokio::spawn(storage_supervisor::run(state, || async {
                let config = MongoConfig::from_env().await?;
                let store = MongoStreakStore::connect(config).await?;
                Ok::<Arc<dyn StreakStore>, StorageError>(Arc::new(store))
            }));
            return;
        }
    }

    #[cfg(feature = "couch-store")]
    {
        use daily_word_back::{
            dao::{
                storage::StorageError,
                streak_store::{
                    StreakStore,
                    couchdb::{CouchConfig, CouchStreakStore},
                },
            },
            services::storage_supervisor,
        };

        match CouchConfig::from_env(config.request_timeout) {
            Ok(couch) => {
                info!(base_url = %couch.base_url, database = %couch.database, "supervising CouchDB streak store");
                tokio::spawn(storage_supervisor::run(state, move || {
                    let couch = couch.clone();
                    async move {
                        let store = CouchStreakStore::connect(couch).await?;
                        Ok::<Arc<dyn StreakStore>, StorageError>(Arc::new(store))
                    }
                }));
                return;
            }
            Err(err) => info!(reason = %err, "CouchDB streak store not configured"),
        }
    }

    warn!("no cloud store configured; running in degraded mode for signed-in users");
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler; waiting for Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
