use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;
use tokio::net::TcpListener;

use daily_word_back::{
    config::{WordListConfig, WordSourceConfig},
    dao::word_source::{self, WordSourceError},
};

#[derive(Clone, Default)]
struct Upstream {
    draws: Arc<AtomicUsize>,
    lookups: Arc<AtomicUsize>,
    /// Lookup number that finally finds an entry; 0 never finds one.
    found_on: usize,
}

async fn draw(State(upstream): State<Upstream>) -> Json<Vec<String>> {
    let n = upstream.draws.fetch_add(1, Ordering::SeqCst) + 1;
    Json(vec![format!("candidate{n}")])
}

async fn lookup(State(upstream): State<Upstream>, Path(word): Path<String>) -> Response {
    let n = upstream.lookups.fetch_add(1, Ordering::SeqCst) + 1;
    if n != upstream.found_on {
        return (StatusCode::NOT_FOUND, Json(json!({ "title": "No Definitions Found" })))
            .into_response();
    }

    Json(json!([{
        "word": word,
        "phonetics": [
            { "text": "/ˈkænd/", "audio": "" },
            { "audio": "https://audio.example/candidate.mp3" }
        ],
        "meanings": [
            {
                "partOfSpeech": "noun",
                "definitions": [
                    { "definition": "A person put forward." },
                    { "definition": "Another sense.", "example": "She was the strongest candidate." }
                ]
            }
        ]
    }]))
    .into_response()
}

async fn serve(upstream: Upstream) -> String {
    let app = Router::new()
        .route("/word", get(draw))
        .route("/entries/{word}", get(lookup))
        .with_state(upstream);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn lookup_config(base: &str) -> WordSourceConfig {
    WordSourceConfig::Lookup {
        word_list: WordListConfig::Http {
            url: format!("{base}/word"),
        },
        dictionary_url: format!("{base}/entries/"),
        max_attempts: 10,
    }
}

#[tokio::test]
async fn nine_misses_then_a_hit_yields_the_tenth_candidate() {
    let upstream = Upstream {
        found_on: 10,
        ..Default::default()
    };
    let base = serve(upstream.clone()).await;
    let source = word_source::from_config(&lookup_config(&base), reqwest::Client::new());

    let record = source.acquire().await.unwrap();

    assert_eq!(record.word, "candidate10");
    assert_eq!(record.meaning, "A person put forward.");
    assert_eq!(record.example, "She was the strongest candidate.");
    assert_eq!(record.phonetic.as_deref(), Some("/ˈkænd/"));
    assert_eq!(record.part_of_speech.as_deref(), Some("noun"));
    assert_eq!(
        record.audio_url.as_deref(),
        Some("https://audio.example/candidate.mp3")
    );
    assert_eq!(upstream.draws.load(Ordering::SeqCst), 10);
}

#[tokio::test]
async fn exhausted_budget_reports_no_definition() {
    let upstream = Upstream::default();
    let base = serve(upstream.clone()).await;
    let source = word_source::from_config(&lookup_config(&base), reqwest::Client::new());

    let err = source.acquire().await.unwrap_err();

    assert_eq!(err, WordSourceError::NoDefinitionFound { attempts: 10 });
    assert_eq!(upstream.lookups.load(Ordering::SeqCst), 10);
}

#[tokio::test]
async fn unreachable_word_list_is_provider_unavailable() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let source = word_source::from_config(&lookup_config(&base), reqwest::Client::new());
    let err = source.acquire().await.unwrap_err();

    assert!(matches!(err, WordSourceError::ProviderUnavailable { .. }));
}
