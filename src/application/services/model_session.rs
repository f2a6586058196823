use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use crate::application::ports::{InferenceError, ModelLoadError, ModelLoader, SpeechModel};
use crate::domain::{ModelState, NormalizedAudio, RawResult};

enum SessionState {
    Unloaded,
    Loading,
    Ready(Arc<dyn SpeechModel>),
    Failed(ModelLoadError),
}

struct SessionInner {
    model_id: String,
    expected_checksum: Option<String>,
    loader: Arc<dyn ModelLoader>,
    state: RwLock<SessionState>,
    // Single-flight guard for the unloaded -> ready transition.
    load_guard: Mutex<()>,
    // Bumped under `load_guard` whenever an attempt settles.
    settled_attempts: AtomicU64,
}

/// Owns the speech model for the lifetime of the process.
///
/// The first caller of [`ModelSession::ensure_loaded`] performs the load,
/// concurrent callers wait for the same outcome, and afterwards the ready
/// model is handed out without locking beyond a brief read. A non-fatal
/// failure is shared with every caller that queued behind that attempt and
/// retried only by callers arriving after it; fatal failures stick.
#[derive(Clone)]
pub struct ModelSession {
    inner: Arc<SessionInner>,
}

impl ModelSession {
    /// `expected_checksum` is a hex SHA-256 digest of the model artifact.
    pub fn new(
        model_id: impl Into<String>,
        loader: Arc<dyn ModelLoader>,
        expected_checksum: Option<String>,
    ) -> Self {
        let expected_checksum = expected_checksum
            .map(|c| c.trim().to_ascii_lowercase())
            .filter(|c| !c.is_empty());

        Self {
            inner: Arc::new(SessionInner {
                model_id: model_id.into(),
                expected_checksum,
                loader,
                state: RwLock::new(SessionState::Unloaded),
                load_guard: Mutex::new(()),
                settled_attempts: AtomicU64::new(0),
            }),
        }
    }

    pub fn model_id(&self) -> &str {
        &self.inner.model_id
    }

    pub fn state(&self) -> ModelState {
        match &*self.inner.state.read() {
            SessionState::Unloaded => ModelState::Unloaded,
            SessionState::Loading => ModelState::Loading,
            SessionState::Ready(_) => ModelState::Ready,
            SessionState::Failed(_) => ModelState::Failed,
        }
    }

    pub fn last_error(&self) -> Option<ModelLoadError> {
        match &*self.inner.state.read() {
            SessionState::Failed(error) => Some(error.clone()),
            _ => None,
        }
    }

    pub async fn ensure_loaded(&self) -> Result<Arc<dyn SpeechModel>, ModelLoadError> {
        if let Some(model) = self.inner.ready_model() {
            return Ok(model);
        }

        let observed = self.inner.settled_attempts.load(Ordering::SeqCst);

        // The load runs in its own task so a caller that goes away mid-load
        // cannot leave the session stuck in `Loading`.
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.load_once(observed).await })
            .await
            .map_err(|e| ModelLoadError::LoadFailed(format!("load task aborted: {}", e)))?
    }

    pub async fn transcribe(
        &self,
        model: &Arc<dyn SpeechModel>,
        audio: NormalizedAudio,
        language: &str,
    ) -> Result<RawResult, InferenceError> {
        let started = Instant::now();
        let duration_secs = audio.duration_secs();

        let result = model.transcribe(audio, language).await?;

        tracing::info!(
            model = %self.inner.model_id,
            language = language,
            audio_secs = duration_secs,
            segments = result.segments.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Inference completed"
        );

        Ok(result)
    }
}

impl SessionInner {
    fn ready_model(&self) -> Option<Arc<dyn SpeechModel>> {
        match &*self.state.read() {
            SessionState::Ready(model) => Some(Arc::clone(model)),
            _ => None,
        }
    }

    /// Outcome a waiter can reuse without loading again. `observed` is the
    /// settled-attempt count seen when the caller arrived; any attempt that
    /// settled since then answers for it.
    fn settled_outcome(
        &self,
        observed: u64,
    ) -> Option<Result<Arc<dyn SpeechModel>, ModelLoadError>> {
        let settled_since_arrival = self.settled_attempts.load(Ordering::SeqCst) != observed;
        match &*self.state.read() {
            SessionState::Ready(model) => Some(Ok(Arc::clone(model))),
            SessionState::Failed(error) if error.is_fatal() || settled_since_arrival => {
                Some(Err(error.clone()))
            }
            _ => None,
        }
    }

    async fn load_once(&self, observed: u64) -> Result<Arc<dyn SpeechModel>, ModelLoadError> {
        let _guard = self.load_guard.lock().await;

        if let Some(settled) = self.settled_outcome(observed) {
            return settled;
        }

        *self.state.write() = SessionState::Loading;
        tracing::info!(model = %self.model_id, "Loading speech model");
        let started = Instant::now();

        let result = match self.load_and_verify().await {
            Ok(model) => {
                *self.state.write() = SessionState::Ready(Arc::clone(&model));
                tracing::info!(
                    model = %self.model_id,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Speech model ready"
                );
                Ok(model)
            }
            Err(error) => {
                tracing::error!(
                    model = %self.model_id,
                    error = %error,
                    fatal = error.is_fatal(),
                    "Speech model failed to load"
                );
                *self.state.write() = SessionState::Failed(error.clone());
                Err(error)
            }
        };

        self.settled_attempts.fetch_add(1, Ordering::SeqCst);
        result
    }

    async fn load_and_verify(&self) -> Result<Arc<dyn SpeechModel>, ModelLoadError> {
        let loaded = self.loader.load(&self.model_id).await?;

        if let Some(expected) = &self.expected_checksum {
            let artifact = loaded.artifact.ok_or(ModelLoadError::ArtifactUnavailable)?;
            let actual = tokio::task::spawn_blocking(move || sha256_file(&artifact))
                .await
                .map_err(|e| ModelLoadError::LoadFailed(format!("checksum task: {}", e)))??;

            if &actual != expected {
                return Err(ModelLoadError::ChecksumMismatch {
                    expected: expected.clone(),
                    actual,
                });
            }
            tracing::debug!(model = %self.model_id, "Model artifact checksum verified");
        }

        Ok(loaded.model)
    }
}

fn sha256_file(path: &Path) -> Result<String, ModelLoadError> {
    let file = File::open(path).map_err(|e| {
        ModelLoadError::LoadFailed(format!("open {}: {}", path.display(), e))
    })?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();

    let mut buffer = [0u8; 8192];
    loop {
        let bytes_read = reader
            .read(&mut buffer)
            .map_err(|e| ModelLoadError::LoadFailed(format!("read {}: {}", path.display(), e)))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}
