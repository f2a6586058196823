mod audio_normalizer;
mod model_loader;
mod speech_model;

pub use audio_normalizer::{AudioDecodeError, AudioNormalizer};
pub use model_loader::{LoadedModel, ModelLoadError, ModelLoader};
pub use speech_model::{InferenceError, SpeechModel};
