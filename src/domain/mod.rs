mod audio_format;
mod model_state;
mod normalized_audio;
mod response_format;
mod transcript;
mod transcription_request;
mod upload;

pub use audio_format::AudioFormat;
pub use model_state::ModelState;
pub use normalized_audio::{NormalizedAudio, TARGET_SAMPLE_RATE};
pub use response_format::ResponseFormat;
pub use transcript::{AssembledResponse, RawResult, Segment, TranscriptionResponse};
pub use transcription_request::{DEFAULT_LANGUAGE, TranscriptionOptions, TranscriptionRequest};
pub use upload::{RejectionReason, SanitizedFilename, UploadedFile, ValidationVerdict};
