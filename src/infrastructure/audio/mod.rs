#[cfg(feature = "candle")]
mod candle_whisper_engine;
mod mock_speech_model;
mod model_loader_factory;
mod remote_whisper_engine;
mod symphonia_normalizer;

#[cfg(feature = "candle")]
pub use candle_whisper_engine::{CandleWhisperEngine, CandleWhisperLoader};
pub use mock_speech_model::{MockModelLoader, MockSpeechModel};
pub use model_loader_factory::{ModelLoaderFactory, ModelProvider};
pub use remote_whisper_engine::{RemoteWhisperEngine, RemoteWhisperLoader};
pub use symphonia_normalizer::SymphoniaAudioNormalizer;
