use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::multipart;
use serde::Deserialize;

use crate::application::ports::{
    InferenceError, LoadedModel, ModelLoadError, ModelLoader, SpeechModel,
};
use crate::domain::{NormalizedAudio, RawResult, Segment, TARGET_SAMPLE_RATE};

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080/v1";

/// Forwards normalized audio to an OpenAI-compatible transcription server.
pub struct RemoteWhisperEngine {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct VerboseTranscription {
    #[serde(default)]
    text: String,
    #[serde(default)]
    segments: Vec<VerboseSegment>,
}

#[derive(Debug, Deserialize)]
struct VerboseSegment {
    start: f64,
    end: f64,
    text: String,
}

impl RemoteWhisperEngine {
    pub fn new(
        client: reqwest::Client,
        api_key: Option<String>,
        base_url: Option<String>,
        model: String,
    ) -> Self {
        Self {
            client,
            api_key: api_key.filter(|key| !key.is_empty()),
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            model,
        }
    }
}

#[async_trait]
impl SpeechModel for RemoteWhisperEngine {
    async fn transcribe(
        &self,
        audio: NormalizedAudio,
        language: &str,
    ) -> Result<RawResult, InferenceError> {
        let url = format!("{}/audio/transcriptions", self.base_url);
        let wav = encode_wav(&audio)?;

        let file_part = multipart::Part::bytes(wav)
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(|e| InferenceError::TranscriptionFailed(format!("mime: {}", e)))?;

        let form = multipart::Form::new()
            .text("model", self.model.clone())
            .text("language", language.to_string())
            .text("response_format", "verbose_json")
            .part("file", file_part);

        tracing::debug!(model = %self.model, url = %url, "Sending audio to remote transcription backend");

        let mut request = self.client.post(&url).multipart(form);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| InferenceError::BackendUnavailable(format!("request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(InferenceError::BackendUnavailable(format!(
                "status {}: {}",
                status, body
            )));
        }

        let body: VerboseTranscription = response
            .json()
            .await
            .map_err(|e| InferenceError::TranscriptionFailed(format!("body: {}", e)))?;

        Ok(RawResult::new(
            body.text,
            body.segments
                .into_iter()
                .map(|s| Segment::new(s.text, s.start, s.end))
                .collect(),
        ))
    }
}

fn encode_wav(audio: &NormalizedAudio) -> Result<Vec<u8>, InferenceError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: TARGET_SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::with_capacity(44 + audio.len() * 2));
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| InferenceError::TranscriptionFailed(format!("wav header: {}", e)))?;
        for &sample in audio.samples() {
            let pcm = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer
                .write_sample(pcm)
                .map_err(|e| InferenceError::TranscriptionFailed(format!("wav: {}", e)))?;
        }
        writer
            .finalize()
            .map_err(|e| InferenceError::TranscriptionFailed(format!("wav: {}", e)))?;
    }

    Ok(cursor.into_inner())
}

/// Builds a [`RemoteWhisperEngine`]; there is no local artifact to verify.
pub struct RemoteWhisperLoader {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: Option<String>,
}

impl RemoteWhisperLoader {
    pub fn new(api_key: Option<String>, base_url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url,
        }
    }
}

#[async_trait]
impl ModelLoader for RemoteWhisperLoader {
    async fn load(&self, model_id: &str) -> Result<LoadedModel, ModelLoadError> {
        let engine = RemoteWhisperEngine::new(
            self.client.clone(),
            self.api_key.clone(),
            self.base_url.clone(),
            model_id.to_string(),
        );

        tracing::info!(model = model_id, base_url = %engine.base_url, "Remote transcription backend configured");

        Ok(LoadedModel {
            model: Arc::new(engine),
            artifact: None,
        })
    }
}
