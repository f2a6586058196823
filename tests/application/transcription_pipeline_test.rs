use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parakeet_gateway::application::ports::{InferenceError, ModelLoadError};
use parakeet_gateway::application::services::{
    ModelSession, PipelineError, TranscriptionPipeline, UploadValidator,
};
use parakeet_gateway::domain::{
    AssembledResponse, RejectionReason, ResponseFormat, TranscriptionOptions, UploadedFile,
};
use parakeet_gateway::infrastructure::audio::{MockModelLoader, MockSpeechModel};

use crate::helpers::{
    CountingNormalizer, FailingLoader, FailingSpeechModel, SlowSpeechModel, StaticLoader,
    greeting_result,
};

fn wav_upload(data: &'static [u8]) -> UploadedFile {
    UploadedFile::new(Bytes::from_static(data), "clip.wav", Some("audio/wav".to_string()))
}

fn options(response_format: ResponseFormat) -> TranscriptionOptions {
    TranscriptionOptions {
        response_format,
        ..TranscriptionOptions::default()
    }
}

struct Fixture {
    pipeline: TranscriptionPipeline,
    normalizer: Arc<CountingNormalizer>,
    loader: Arc<MockModelLoader>,
    model: Arc<MockSpeechModel>,
}

fn fixture() -> Fixture {
    let model = Arc::new(MockSpeechModel::new(greeting_result()));
    let loader = Arc::new(MockModelLoader::new(Arc::clone(&model)));
    let normalizer = Arc::new(CountingNormalizer::default());
    let session = ModelSession::new("test-model", loader.clone(), None);

    Fixture {
        pipeline: TranscriptionPipeline::new(
            UploadValidator::default(),
            normalizer.clone(),
            session,
            None,
        ),
        normalizer,
        loader,
        model,
    }
}

#[tokio::test]
async fn given_empty_upload_when_processing_then_rejected_before_any_work() {
    let fixture = fixture();

    let result = fixture
        .pipeline
        .process(wav_upload(b""), options(ResponseFormat::Json))
        .await;

    assert!(matches!(
        result,
        Err(PipelineError::Validation(RejectionReason::EmptyFile))
    ));
    assert_eq!(fixture.normalizer.calls(), 0);
    assert_eq!(fixture.loader.loads(), 0);
    assert_eq!(fixture.model.calls(), 0);
}

#[tokio::test]
async fn given_valid_upload_when_processing_then_stages_run_once_and_text_is_clean() {
    let fixture = fixture();

    let result = fixture
        .pipeline
        .process(wav_upload(b"RIFF"), options(ResponseFormat::Text))
        .await
        .unwrap();

    assert_eq!(result, AssembledResponse::Text("Hallo Welt".to_string()));
    assert_eq!(fixture.normalizer.calls(), 1);
    assert_eq!(fixture.loader.loads(), 1);
    assert_eq!(fixture.model.calls(), 1);
}

#[tokio::test]
async fn given_loaded_model_when_processing_twice_then_model_loaded_once() {
    let fixture = fixture();

    for _ in 0..2 {
        fixture
            .pipeline
            .process(wav_upload(b"RIFF"), options(ResponseFormat::Json))
            .await
            .unwrap();
    }

    assert_eq!(fixture.loader.loads(), 1);
    assert_eq!(fixture.model.calls(), 2);
}

#[tokio::test]
async fn given_slow_backend_when_timeout_elapses_then_timeout_error() {
    let session = ModelSession::new(
        "slow-model",
        Arc::new(StaticLoader(Arc::new(SlowSpeechModel(Duration::from_millis(500))))),
        None,
    );
    let pipeline = TranscriptionPipeline::new(
        UploadValidator::default(),
        Arc::new(CountingNormalizer::default()),
        session,
        Some(Duration::from_millis(20)),
    );

    let result = pipeline
        .process(wav_upload(b"RIFF"), options(ResponseFormat::Json))
        .await;

    assert!(matches!(result, Err(PipelineError::Timeout(_))));
}

#[tokio::test]
async fn given_failing_backend_when_processing_then_inference_error_and_session_stays_ready() {
    let session = ModelSession::new(
        "failing-model",
        Arc::new(StaticLoader(Arc::new(FailingSpeechModel))),
        None,
    );
    let pipeline = TranscriptionPipeline::new(
        UploadValidator::default(),
        Arc::new(CountingNormalizer::default()),
        session.clone(),
        None,
    );

    let result = pipeline
        .process(wav_upload(b"RIFF"), options(ResponseFormat::Json))
        .await;

    assert!(matches!(
        result,
        Err(PipelineError::Inference(InferenceError::BackendUnavailable(_)))
    ));
    assert_eq!(
        session.state(),
        parakeet_gateway::domain::ModelState::Ready
    );
}

#[tokio::test]
async fn given_unloadable_model_when_processing_then_model_load_error() {
    let session = ModelSession::new(
        "missing-model",
        Arc::new(FailingLoader(ModelLoadError::LoadFailed("not found".to_string()))),
        None,
    );
    let pipeline = TranscriptionPipeline::new(
        UploadValidator::default(),
        Arc::new(CountingNormalizer::default()),
        session,
        None,
    );

    let result = pipeline
        .process(wav_upload(b"RIFF"), options(ResponseFormat::Json))
        .await;

    assert!(matches!(result, Err(PipelineError::ModelLoad(_))));
}
