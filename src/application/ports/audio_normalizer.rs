use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::{AudioFormat, NormalizedAudio, SanitizedFilename};

#[async_trait]
pub trait AudioNormalizer: Send + Sync {
    /// Decodes `data` into 16 kHz mono PCM.
    ///
    /// Any temporary storage used while decoding is released before this
    /// returns, on success and on error.
    async fn normalize(
        &self,
        data: Bytes,
        format: AudioFormat,
        filename: &SanitizedFilename,
    ) -> Result<NormalizedAudio, AudioDecodeError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AudioDecodeError {
    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),
    #[error("audio decoding failed: {0}")]
    DecodingFailed(String),
    #[error("no audio samples decoded")]
    NoSamples,
    #[error("resampling failed: {0}")]
    ResamplingFailed(String),
    #[error("temporary file error: {0}")]
    Io(#[from] std::io::Error),
}

impl AudioDecodeError {
    /// Failures of local storage rather than of the uploaded bytes.
    pub fn is_server_fault(&self) -> bool {
        matches!(self, AudioDecodeError::Io(_))
    }
}
