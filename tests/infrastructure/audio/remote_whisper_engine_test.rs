use std::collections::HashMap;
use std::sync::Arc;

use axum::Router;
use axum::extract::{Multipart, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use parakeet_gateway::application::ports::{InferenceError, SpeechModel};
use parakeet_gateway::domain::NormalizedAudio;
use parakeet_gateway::infrastructure::audio::RemoteWhisperEngine;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

#[derive(Default)]
struct Captured {
    fields: HashMap<String, String>,
    file_len: usize,
    authorization: Option<String>,
}

type Shared = Arc<Mutex<Captured>>;

async fn fake_transcriptions(
    State(captured): State<Shared>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let mut captured = captured.lock().await;
    captured.authorization = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            captured.file_len = field.bytes().await.unwrap().len();
        } else {
            let value = field.text().await.unwrap();
            captured.fields.insert(name, value);
        }
    }

    axum::Json(json!({
        "text": "Hallo Welt",
        "segments": [
            {"id": 0, "start": 0.0, "end": 0.6, "text": " Hallo"},
            {"id": 1, "start": 0.6, "end": 1.0, "text": " Welt"}
        ]
    }))
}

async fn spawn_upstream(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}/v1", addr)
}

#[tokio::test]
async fn given_upstream_when_transcribing_then_sends_wav_and_parses_segments() {
    let captured: Shared = Arc::default();
    let router = Router::new()
        .route("/v1/audio/transcriptions", post(fake_transcriptions))
        .with_state(Arc::clone(&captured));
    let base_url = spawn_upstream(router).await;

    let engine = RemoteWhisperEngine::new(
        reqwest::Client::new(),
        Some("upstream-key".to_string()),
        Some(format!("{}/", base_url)),
        "whisper-1".to_string(),
    );

    let result = engine
        .transcribe(NormalizedAudio::new(vec![0.1; 16_000]), "de")
        .await
        .unwrap();

    assert_eq!(result.text, "Hallo Welt");
    assert_eq!(result.segments.len(), 2);
    assert_eq!(result.segments[1].start, 0.6);

    let captured = captured.lock().await;
    assert_eq!(captured.fields.get("model").map(String::as_str), Some("whisper-1"));
    assert_eq!(captured.fields.get("language").map(String::as_str), Some("de"));
    assert_eq!(
        captured.fields.get("response_format").map(String::as_str),
        Some("verbose_json")
    );
    assert_eq!(captured.authorization.as_deref(), Some("Bearer upstream-key"));
    assert!(captured.file_len > 16_000 * 2 && captured.file_len < 16_000 * 2 + 128);
}

#[tokio::test]
async fn given_upstream_error_status_when_transcribing_then_backend_unavailable() {
    let router = Router::new().route(
        "/v1/audio/transcriptions",
        post(|| async { (StatusCode::BAD_GATEWAY, "overloaded") }),
    );
    let base_url = spawn_upstream(router).await;

    let engine = RemoteWhisperEngine::new(
        reqwest::Client::new(),
        None,
        Some(base_url),
        "whisper-1".to_string(),
    );

    let result = engine
        .transcribe(NormalizedAudio::new(vec![0.0; 1_600]), "en")
        .await;

    assert!(matches!(result, Err(InferenceError::BackendUnavailable(_))));
}
