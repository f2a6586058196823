use std::sync::Arc;

use serde::Deserialize;

use crate::application::ports::{ModelLoadError, ModelLoader};

use super::mock_speech_model::{MockModelLoader, MockSpeechModel};
use super::remote_whisper_engine::RemoteWhisperLoader;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelProvider {
    Local,
    Remote,
    Scaffold,
}

pub struct ModelLoaderFactory;

impl ModelLoaderFactory {
    pub fn create(
        provider: ModelProvider,
        api_key: Option<String>,
        base_url: Option<String>,
    ) -> Result<Arc<dyn ModelLoader>, ModelLoadError> {
        match provider {
            ModelProvider::Local => local_loader(),
            ModelProvider::Remote => Ok(Arc::new(RemoteWhisperLoader::new(api_key, base_url))),
            ModelProvider::Scaffold => {
                tracing::warn!("Scaffold model provider active, transcripts are placeholders");
                Ok(Arc::new(MockModelLoader::new(Arc::new(
                    MockSpeechModel::scaffold(),
                ))))
            }
        }
    }
}

#[cfg(feature = "candle")]
fn local_loader() -> Result<Arc<dyn ModelLoader>, ModelLoadError> {
    Ok(Arc::new(super::candle_whisper_engine::CandleWhisperLoader))
}

#[cfg(not(feature = "candle"))]
fn local_loader() -> Result<Arc<dyn ModelLoader>, ModelLoadError> {
    Err(ModelLoadError::LoadFailed(
        "local provider requires the `candle` feature".to_string(),
    ))
}
