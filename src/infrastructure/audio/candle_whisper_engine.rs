use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use candle_core::{Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::whisper::{self as m, Config};
use hf_hub::api::sync::Api;
use hf_hub::{Repo, RepoType};
use parking_lot::Mutex;
use tokenizers::Tokenizer;

use crate::application::ports::{
    InferenceError, LoadedModel, ModelLoadError, ModelLoader, SpeechModel,
};
use crate::domain::{NormalizedAudio, RawResult, Segment, TARGET_SAMPLE_RATE};

const MEL_FILTER_REPO: &str = "FL33TW00D-HF/whisper-base";
const MAX_DECODE_TOKENS: usize = 224;

/// In-process Whisper on CPU. Each 30 s window becomes one segment.
pub struct CandleWhisperEngine {
    inner: Arc<WhisperInner>,
}

struct WhisperInner {
    model: Mutex<m::model::Whisper>,
    tokenizer: Tokenizer,
    config: Config,
    device: Device,
    mel_filters: Vec<f32>,
}

struct ModelFiles {
    config: PathBuf,
    tokenizer: PathBuf,
    weights: PathBuf,
    mel_filters: PathBuf,
}

impl ModelFiles {
    /// A model id naming an existing directory is read from disk; anything
    /// else is treated as a model-hub repository.
    fn resolve(model_id: &str) -> Result<Self, ModelLoadError> {
        let local = Path::new(model_id);
        if local.is_dir() {
            return Ok(Self {
                config: local.join("config.json"),
                tokenizer: local.join("tokenizer.json"),
                weights: local.join("model.safetensors"),
                mel_filters: local.join("melfilters.bytes"),
            });
        }

        let api = Api::new().map_err(|e| ModelLoadError::LoadFailed(e.to_string()))?;
        let repo = api.repo(Repo::new(model_id.to_string(), RepoType::Model));

        let config = repo
            .get("config.json")
            .map_err(|e| ModelLoadError::LoadFailed(format!("config.json: {}", e)))?;
        let tokenizer = repo
            .get("tokenizer.json")
            .map_err(|e| ModelLoadError::LoadFailed(format!("tokenizer.json: {}", e)))?;
        let weights = repo
            .get("model.safetensors")
            .map_err(|e| ModelLoadError::LoadFailed(format!("model.safetensors: {}", e)))?;

        let mel_repo = api.repo(Repo::new(MEL_FILTER_REPO.to_string(), RepoType::Model));
        let mel_filters = mel_repo
            .get("melfilters.bytes")
            .map_err(|e| ModelLoadError::LoadFailed(format!("melfilters.bytes: {}", e)))?;

        Ok(Self {
            config,
            tokenizer,
            weights,
            mel_filters,
        })
    }
}

impl CandleWhisperEngine {
    fn load(files: &ModelFiles) -> Result<Self, ModelLoadError> {
        let device = Device::Cpu;

        let config_contents = std::fs::read_to_string(&files.config)
            .map_err(|e| ModelLoadError::LoadFailed(format!("read config: {}", e)))?;
        let config: Config = serde_json::from_str(&config_contents)
            .map_err(|e| ModelLoadError::LoadFailed(format!("parse config: {}", e)))?;

        let tokenizer = Tokenizer::from_file(&files.tokenizer)
            .map_err(|e| ModelLoadError::LoadFailed(format!("tokenizer: {}", e)))?;

        let mel_bytes = std::fs::read(&files.mel_filters)
            .map_err(|e| ModelLoadError::LoadFailed(format!("mel filters: {}", e)))?;
        let mel_filters = read_mel_filters(&mel_bytes, &config)?;

        // SAFETY: safetensors files are memory-mapped read-only
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[&files.weights], m::DTYPE, &device)
                .map_err(|e| ModelLoadError::LoadFailed(format!("weights: {}", e)))?
        };

        let model = m::model::Whisper::load(&vb, config.clone())
            .map_err(|e| ModelLoadError::LoadFailed(format!("model: {}", e)))?;

        Ok(Self {
            inner: Arc::new(WhisperInner {
                model: Mutex::new(model),
                tokenizer,
                config,
                device,
                mel_filters,
            }),
        })
    }
}

#[async_trait]
impl SpeechModel for CandleWhisperEngine {
    async fn transcribe(
        &self,
        audio: NormalizedAudio,
        language: &str,
    ) -> Result<RawResult, InferenceError> {
        let inner = Arc::clone(&self.inner);
        let language = language.to_string();

        tokio::task::spawn_blocking(move || inner.transcribe_blocking(audio.samples(), &language))
            .await
            .map_err(|e| InferenceError::TranscriptionFailed(format!("inference task: {}", e)))?
    }
}

impl WhisperInner {
    fn transcribe_blocking(&self, pcm: &[f32], language: &str) -> Result<RawResult, InferenceError> {
        let chunk_samples = m::N_SAMPLES;
        let prompt = self.prompt_tokens(language)?;
        let mut segments: Vec<Segment> = Vec::new();

        let mut model = self.model.lock();

        for (i, chunk) in pcm.chunks(chunk_samples).enumerate() {
            let start = (i * chunk_samples) as f64 / TARGET_SAMPLE_RATE as f64;
            let end = start + chunk.len() as f64 / TARGET_SAMPLE_RATE as f64;

            let mut samples = chunk.to_vec();
            samples.resize(chunk_samples, 0.0);

            let mel_data = m::audio::pcm_to_mel(&self.config, &samples, &self.mel_filters);
            let n_mel = self.config.num_mel_bins;
            let n_frames = mel_data.len() / n_mel;

            let mel = Tensor::from_vec(mel_data, (1, n_mel, n_frames), &self.device)
                .map_err(|e| InferenceError::TranscriptionFailed(format!("mel tensor: {}", e)))?;

            tracing::debug!(window = i, start = start, "Decoding audio window");
            let text = decode_window(&mut model, &self.tokenizer, &self.device, &mel, &prompt)?;
            if !text.is_empty() {
                segments.push(Segment::new(text, start, end));
            }
        }

        let text = segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        Ok(RawResult::new(text, segments))
    }

    fn prompt_tokens(&self, language: &str) -> Result<Vec<u32>, InferenceError> {
        let mut tokens = vec![token_id(&self.tokenizer, m::SOT_TOKEN)?];

        match self.tokenizer.token_to_id(&format!("<|{}|>", language)) {
            Some(language_token) => tokens.push(language_token),
            None => tracing::debug!(language = language, "No language token, letting the model detect it"),
        }

        tokens.push(token_id(&self.tokenizer, m::TRANSCRIBE_TOKEN)?);
        tokens.push(token_id(&self.tokenizer, m::NO_TIMESTAMPS_TOKEN)?);
        Ok(tokens)
    }
}

fn decode_window(
    model: &mut m::model::Whisper,
    tokenizer: &Tokenizer,
    device: &Device,
    mel: &Tensor,
    prompt: &[u32],
) -> Result<String, InferenceError> {
    let eot_token = token_id(tokenizer, m::EOT_TOKEN)?;
    let failed = |e: candle_core::Error| InferenceError::TranscriptionFailed(e.to_string());

    let audio_features = model.encoder.forward(mel, true).map_err(failed)?;

    let mut tokens = prompt.to_vec();
    let mut generated: Vec<u32> = Vec::new();

    for _ in 0..MAX_DECODE_TOKENS {
        let token_tensor = Tensor::new(tokens.as_slice(), device)
            .map_err(failed)?
            .unsqueeze(0)
            .map_err(failed)?;

        let decoder_output = model
            .decoder
            .forward(&token_tensor, &audio_features, tokens.len() == prompt.len())
            .map_err(failed)?;

        let logits = model
            .decoder
            .final_linear(&decoder_output.squeeze(0).map_err(failed)?)
            .map_err(failed)?;

        let seq_len = logits.dim(0).map_err(failed)?;
        let next_token = logits
            .get(seq_len - 1)
            .map_err(failed)?
            .argmax(0)
            .map_err(failed)?
            .to_scalar::<u32>()
            .map_err(failed)?;

        if next_token == eot_token {
            break;
        }

        tokens.push(next_token);
        generated.push(next_token);
    }

    model.reset_kv_cache();

    let text = tokenizer
        .decode(&generated, true)
        .map_err(|e| InferenceError::TranscriptionFailed(format!("detokenize: {}", e)))?;

    Ok(text.trim().to_string())
}

fn token_id(tokenizer: &Tokenizer, token: &str) -> Result<u32, InferenceError> {
    tokenizer.token_to_id(token).ok_or_else(|| {
        InferenceError::TranscriptionFailed(format!("token not found: {}", token))
    })
}

fn read_mel_filters(bytes: &[u8], config: &Config) -> Result<Vec<f32>, ModelLoadError> {
    let expected_len = config.num_mel_bins * (m::N_FFT / 2 + 1);
    if bytes.len() < expected_len * 4 {
        return Err(ModelLoadError::LoadFailed(format!(
            "mel filters file too small: {} bytes, expected at least {}",
            bytes.len(),
            expected_len * 4
        )));
    }

    Ok(bytes
        .chunks_exact(4)
        .take(expected_len)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

/// Resolves model files (local directory or hub download) and loads the
/// weights on a blocking thread. The weights file is the checksummed artifact.
pub struct CandleWhisperLoader;

#[async_trait]
impl ModelLoader for CandleWhisperLoader {
    async fn load(&self, model_id: &str) -> Result<LoadedModel, ModelLoadError> {
        let model_id = model_id.to_string();

        tokio::task::spawn_blocking(move || -> Result<LoadedModel, ModelLoadError> {
            tracing::info!(model = %model_id, device = "cpu", "Initializing Candle Whisper engine");
            let files = ModelFiles::resolve(&model_id)?;
            let engine = CandleWhisperEngine::load(&files)?;

            Ok(LoadedModel {
                model: Arc::new(engine),
                artifact: Some(files.weights),
            })
        })
        .await
        .map_err(|e| ModelLoadError::LoadFailed(format!("load task: {}", e)))?
    }
}
