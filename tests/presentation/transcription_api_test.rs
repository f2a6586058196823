use axum::http::StatusCode;
use parakeet_gateway::domain::{RawResult, Segment};

use crate::helpers::{
    Part, TestApp, body_bytes, body_json, short_wav, temp_file_count, transcription_request,
};

#[tokio::test]
async fn given_zero_byte_wav_when_uploading_then_400_empty_file_and_no_inference() {
    let app = TestApp::builder().build();

    let response = app
        .send(transcription_request(&[Part::wav("x.wav", Vec::new())], &[]))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], "empty-file");
    assert_eq!(app.model.calls(), 0);
    assert_eq!(app.loader.loads(), 0);
}

#[tokio::test]
async fn given_upload_over_ceiling_when_streaming_then_413_too_large() {
    let app = TestApp::builder().max_upload_bytes(4 * 1024).build();

    let response = app
        .send(transcription_request(&[Part::wav("big.wav", short_wav())], &[]))
        .await;

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body_json(response).await["error"]["code"], "too-large");
    assert_eq!(app.model.calls(), 0);
    assert_eq!(temp_file_count(&app.temp_dir), 0);
}

#[tokio::test]
async fn given_announced_length_far_over_ceiling_when_uploading_then_413_without_reading() {
    let app = TestApp::builder().max_upload_bytes(4 * 1024).build();
    let length = (10 * 1024 * 1024).to_string();

    let response = app
        .send(transcription_request(
            &[Part::wav("a.wav", vec![1, 2, 3])],
            &[("content-length", length.as_str())],
        ))
        .await;

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn given_traversal_filename_when_uploading_then_transcribed_and_temp_dir_clean() {
    let app = TestApp::builder().build();

    let response = app
        .send(transcription_request(
            &[Part::wav("../../etc/passwd.wav", short_wav())],
            &[],
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["text"], "Hallo Welt");
    assert_eq!(temp_file_count(&app.temp_dir), 0);
}

#[tokio::test]
async fn given_disallowed_extension_when_uploading_then_415_bad_extension() {
    let app = TestApp::builder().build();

    let response = app
        .send(transcription_request(
            &[Part::file("notes.txt", Some("text/plain"), b"hello".to_vec())],
            &[],
        ))
        .await;

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body_json(response).await["error"]["code"], "bad-extension");
}

#[tokio::test]
async fn given_wav_declared_as_image_when_uploading_then_415_bad_mime() {
    let app = TestApp::builder().build();

    let response = app
        .send(transcription_request(
            &[Part::file("clip.wav", Some("image/png"), short_wav())],
            &[],
        ))
        .await;

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body_json(response).await["error"]["code"], "bad-mime");
}

#[tokio::test]
async fn given_unknown_response_format_when_uploading_then_400_before_inference() {
    let app = TestApp::builder().build();

    let response = app
        .send(transcription_request(
            &[
                Part::wav("a.wav", short_wav()),
                Part::text("response_format", "srt"),
            ],
            &[],
        ))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"]["code"],
        "unsupported-response-format"
    );
    assert_eq!(app.model.calls(), 0);
}

#[tokio::test]
async fn given_no_file_field_when_uploading_then_400_missing_file() {
    let app = TestApp::builder().build();

    let response = app
        .send(transcription_request(&[Part::text("language", "en")], &[]))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], "missing-file");
}

#[tokio::test]
async fn given_undecodable_audio_when_uploading_then_400_decode_error_and_temp_dir_clean() {
    let app = TestApp::builder().build();

    let response = app
        .send(transcription_request(
            &[Part::wav("noise.wav", b"this is not audio at all".to_vec())],
            &[],
        ))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "decode-error");
    assert_eq!(body["error"]["message"], "audio could not be decoded");
    assert_eq!(temp_file_count(&app.temp_dir), 0);
}

#[tokio::test]
async fn given_temp_dir_missing_when_uploading_then_500_staging_failure_not_client_error() {
    let app = TestApp::builder().build();
    std::fs::remove_dir_all(app.temp_dir.path()).unwrap();

    let response = app
        .send(transcription_request(&[Part::wav("a.wav", short_wav())], &[]))
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "audio-staging-failed");
    assert!(!body.to_string().contains(&*app.temp_dir.path().to_string_lossy()));
    assert_eq!(app.model.calls(), 0);
}

#[tokio::test]
async fn given_text_format_when_uploading_then_plain_body_is_clean_text() {
    let app = TestApp::builder()
        .model_response(RawResult::new(
            "",
            vec![Segment::new("Hallo  Welt", 0.0, 1.0)],
        ))
        .build();

    let response = app
        .send(transcription_request(
            &[
                Part::wav("a.wav", short_wav()),
                Part::text("response_format", "text"),
            ],
            &[],
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/plain")
    );
    assert_eq!(&body_bytes(response).await[..], b"Hallo Welt");
}

#[tokio::test]
async fn given_json_format_with_timestamp_when_uploading_then_segments_and_timestamp_returned() {
    let app = TestApp::builder().build();

    let response = app
        .send(transcription_request(
            &[
                Part::text("model", "whisper-1"),
                Part::text("language", "de"),
                Part::text("recording_timestamp", "2024-05-01T10:00:00Z"),
                Part::wav("meeting.wav", short_wav()),
            ],
            &[],
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["text"], "Hallo Welt");
    assert_eq!(body["recording_timestamp"], "2024-05-01T10:00:00Z");
    let segments = body["segments"].as_array().unwrap();
    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0]["text"], "Hallo");
    assert_eq!(segments[1]["start"], 0.4);
}

#[tokio::test]
async fn given_no_timestamp_when_uploading_then_field_is_omitted() {
    let app = TestApp::builder().build();

    let response = app
        .send(transcription_request(&[Part::wav("a.wav", short_wav())], &[]))
        .await;

    let body = body_json(response).await;
    assert!(body.get("recording_timestamp").is_none());
}

#[tokio::test]
async fn given_backend_with_broken_timeline_when_uploading_then_500_inference_error() {
    let app = TestApp::builder()
        .model_response(RawResult::new(
            "",
            vec![Segment::new("later", 5.0, 6.0), Segment::new("earlier", 1.0, 2.0)],
        ))
        .build();

    let response = app
        .send(transcription_request(&[Part::wav("a.wav", short_wav())], &[]))
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "inference-error");
    assert_eq!(body["error"]["message"], "transcription failed");
}

#[tokio::test]
async fn given_several_uploads_when_transcribing_then_model_loaded_once() {
    let app = TestApp::builder().build();

    for _ in 0..3 {
        let response = app
            .send(transcription_request(&[Part::wav("a.wav", short_wav())], &[]))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(app.loader.loads(), 1);
    assert_eq!(app.model.calls(), 3);
}
