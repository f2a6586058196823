use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use super::speech_model::SpeechModel;

pub struct LoadedModel {
    pub model: Arc<dyn SpeechModel>,
    /// Primary on-disk artifact, used for checksum verification.
    pub artifact: Option<PathBuf>,
}

#[async_trait]
pub trait ModelLoader: Send + Sync {
    async fn load(&self, model_id: &str) -> Result<LoadedModel, ModelLoadError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelLoadError {
    #[error("model loading failed: {0}")]
    LoadFailed(String),
    #[error("model artifact checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },
    #[error("checksum configured but the backend exposes no model artifact")]
    ArtifactUnavailable,
}

impl ModelLoadError {
    /// Fatal failures are cached and never retried.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ModelLoadError::ChecksumMismatch { .. } | ModelLoadError::ArtifactUnavailable
        )
    }

    /// Stable, detail-free identifier safe to show unauthenticated callers.
    pub fn code(&self) -> &'static str {
        match self {
            ModelLoadError::LoadFailed(_) => "model-load-failed",
            ModelLoadError::ChecksumMismatch { .. } => "checksum-mismatch",
            ModelLoadError::ArtifactUnavailable => "artifact-unavailable",
        }
    }
}
