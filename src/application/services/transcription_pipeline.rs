use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::application::ports::{AudioDecodeError, AudioNormalizer, InferenceError, ModelLoadError};
use crate::domain::{
    AssembledResponse, RejectionReason, TranscriptionOptions, TranscriptionRequest, UploadedFile,
};

use super::model_session::ModelSession;
use super::response_assembler::ResponseAssembler;
use super::upload_validator::UploadValidator;

/// Runs one upload through validation, normalization, inference and
/// response assembly. Authentication happens before this, at the HTTP layer.
pub struct TranscriptionPipeline {
    validator: UploadValidator,
    normalizer: Arc<dyn AudioNormalizer>,
    session: ModelSession,
    inference_timeout: Option<Duration>,
}

impl TranscriptionPipeline {
    pub fn new(
        validator: UploadValidator,
        normalizer: Arc<dyn AudioNormalizer>,
        session: ModelSession,
        inference_timeout: Option<Duration>,
    ) -> Self {
        Self {
            validator,
            normalizer,
            session,
            inference_timeout,
        }
    }

    pub fn validator(&self) -> &UploadValidator {
        &self.validator
    }

    pub fn session(&self) -> &ModelSession {
        &self.session
    }

    pub async fn process(
        &self,
        upload: UploadedFile,
        options: TranscriptionOptions,
    ) -> Result<AssembledResponse, PipelineError> {
        let started = Instant::now();
        let (filename, format) = self.validator.validate(&upload).into_result()?;

        tracing::debug!(
            filename = %filename,
            format = %format,
            mime = %upload
                .declared_mime()
                .unwrap_or_else(|| format.inferred_mime().to_string()),
            bytes = upload.size_bytes(),
            "Upload accepted"
        );

        let audio = self
            .normalizer
            .normalize(upload.data, format, &filename)
            .await?;

        let request = TranscriptionRequest {
            audio,
            language: options.language,
            response_format: options.response_format,
            model: options.model,
        };

        let model = self.session.ensure_loaded().await?;
        let inference = self
            .session
            .transcribe(&model, request.audio, &request.language);

        let raw = match self.inference_timeout {
            Some(limit) => tokio::time::timeout(limit, inference)
                .await
                .map_err(|_| PipelineError::Timeout(limit))??,
            None => inference.await?,
        };

        let response =
            ResponseAssembler::assemble(raw, request.response_format, options.recording_timestamp)?;

        tracing::info!(
            filename = %filename,
            requested_model = request.model.as_deref().unwrap_or("default"),
            response_format = %request.response_format,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Transcription request completed"
        );

        Ok(response)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("upload rejected: {0}")]
    Validation(#[from] RejectionReason),
    #[error(transparent)]
    Decode(#[from] AudioDecodeError),
    #[error(transparent)]
    ModelLoad(#[from] ModelLoadError),
    #[error(transparent)]
    Inference(#[from] InferenceError),
    #[error("inference exceeded {0:?}")]
    Timeout(Duration),
}
