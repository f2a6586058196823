use async_trait::async_trait;

use crate::domain::{NormalizedAudio, RawResult};

/// A loaded speech-recognition backend.
///
/// Calls run to completion once started; the backend is not cancelled when
/// the caller stops waiting.
#[async_trait]
pub trait SpeechModel: Send + Sync {
    async fn transcribe(
        &self,
        audio: NormalizedAudio,
        language: &str,
    ) -> Result<RawResult, InferenceError>;
}

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("transcription failed: {0}")]
    TranscriptionFailed(String),
    #[error("backend request failed: {0}")]
    BackendUnavailable(String),
    #[error("malformed segment timeline: {0}")]
    MalformedTimeline(String),
}
