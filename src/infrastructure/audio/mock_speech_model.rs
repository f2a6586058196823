use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::application::ports::{
    InferenceError, LoadedModel, ModelLoadError, ModelLoader, SpeechModel,
};
use crate::domain::{NormalizedAudio, RawResult, Segment};

const SCAFFOLD_TEXT: &str = "scaffold transcription";

/// Stub backend. Returns a fixed result, or in scaffold mode one segment
/// spanning the whole input.
pub struct MockSpeechModel {
    response: Option<RawResult>,
    calls: AtomicUsize,
}

impl MockSpeechModel {
    pub fn new(response: RawResult) -> Self {
        Self {
            response: Some(response),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn scaffold() -> Self {
        Self {
            response: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechModel for MockSpeechModel {
    async fn transcribe(
        &self,
        audio: NormalizedAudio,
        _language: &str,
    ) -> Result<RawResult, InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        Ok(match &self.response {
            Some(response) => response.clone(),
            None => RawResult::new(
                SCAFFOLD_TEXT,
                vec![Segment::new(SCAFFOLD_TEXT, 0.0, audio.duration_secs())],
            ),
        })
    }
}

/// Hands out one shared [`MockSpeechModel`] and counts how often it was asked.
pub struct MockModelLoader {
    model: Arc<MockSpeechModel>,
    load_delay: Duration,
    loads: AtomicUsize,
}

impl MockModelLoader {
    pub fn new(model: Arc<MockSpeechModel>) -> Self {
        Self {
            model,
            load_delay: Duration::ZERO,
            loads: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(model: Arc<MockSpeechModel>, load_delay: Duration) -> Self {
        Self {
            model,
            load_delay,
            loads: AtomicUsize::new(0),
        }
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelLoader for MockModelLoader {
    async fn load(&self, model_id: &str) -> Result<LoadedModel, ModelLoadError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(model = model_id, "Loading mock speech model");

        if !self.load_delay.is_zero() {
            tokio::time::sleep(self.load_delay).await;
        }

        Ok(LoadedModel {
            model: Arc::clone(&self.model) as Arc<dyn SpeechModel>,
            artifact: None,
        })
    }
}
