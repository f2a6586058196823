use std::sync::Arc;

use axum::http::StatusCode;
use parakeet_gateway::application::ports::ModelLoadError;
use parakeet_gateway::domain::ModelState;
use parakeet_gateway::infrastructure::audio::MockSpeechModel;
use tokio::sync::Notify;

use crate::helpers::{
    FailingLoader, GatedLoader, Part, TEST_API_KEY, TestApp, body_json, get_request,
    greeting_result, short_wav, transcription_request,
};

#[tokio::test]
async fn given_api_key_configured_when_getting_health_without_key_then_ok() {
    let app = TestApp::builder().api_key(TEST_API_KEY).build();

    let response = app.send(get_request("/health", &[])).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "unloaded");
    assert_eq!(body["model"], "test-model");
}

#[tokio::test]
async fn given_model_loading_when_getting_health_then_reports_loading_without_blocking() {
    let release = Arc::new(Notify::new());
    let loader = Arc::new(GatedLoader {
        release: Arc::clone(&release),
        model: Arc::new(MockSpeechModel::new(greeting_result())),
    });
    let app = TestApp::builder().loader(loader).build();

    let session = app.session.clone();
    let pending_load = tokio::spawn(async move { session.ensure_loaded().await.is_ok() });

    for _ in 0..200 {
        if app.session.state() == ModelState::Loading {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    assert_eq!(app.session.state(), ModelState::Loading);

    let response = app.send(get_request("/health", &[])).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "loading");

    release.notify_one();
    assert!(pending_load.await.unwrap());

    let response = app.send(get_request("/health", &[])).await;
    assert_eq!(body_json(response).await["status"], "ready");
}

#[tokio::test]
async fn given_model_failed_to_load_when_getting_health_then_503_with_error_code_only() {
    let app = TestApp::builder()
        .api_key(TEST_API_KEY)
        .loader(Arc::new(FailingLoader(ModelLoadError::LoadFailed(
            "open /home/svc/.cache/huggingface/model.safetensors: No such file".to_string(),
        ))))
        .build();

    let response = app
        .send(transcription_request(
            &[Part::wav("a.wav", short_wav())],
            &[("x-api-key", TEST_API_KEY)],
        ))
        .await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(response).await["error"]["code"], "model-unavailable");

    let response = app.send(get_request("/health", &[])).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert_eq!(body["status"], "failed");
    assert_eq!(body["error"], "model-load-failed");
    assert!(!body.to_string().contains("huggingface"));
}

#[tokio::test]
async fn given_root_when_model_not_loaded_then_error_status_with_200() {
    let app = TestApp::builder().build();

    let response = app.send(get_request("/", &[])).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "error");
}

#[tokio::test]
async fn given_root_after_successful_transcription_then_ok_status() {
    let app = TestApp::builder().build();

    let response = app
        .send(transcription_request(&[Part::wav("a.wav", short_wav())], &[]))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.send(get_request("/", &[])).await;
    assert_eq!(body_json(response).await["status"], "ok");
}

#[tokio::test]
async fn given_any_response_when_inspecting_headers_then_hardening_and_request_id_present() {
    let app = TestApp::builder().build();

    let response = app
        .send(get_request("/health", &[("x-request-id", "probe-1")]))
        .await;

    let headers = response.headers();
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["referrer-policy"], "no-referrer");
    assert_eq!(headers["x-request-id"], "probe-1");
}
