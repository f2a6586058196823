use super::normalized_audio::NormalizedAudio;
use super::response_format::ResponseFormat;

pub const DEFAULT_LANGUAGE: &str = "de";

/// Form options of one transcription call, resolved at the HTTP boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptionOptions {
    pub language: String,
    pub response_format: ResponseFormat,
    pub model: Option<String>,
    pub recording_timestamp: Option<String>,
}

impl Default for TranscriptionOptions {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            response_format: ResponseFormat::default(),
            model: None,
            recording_timestamp: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptionRequest {
    pub audio: NormalizedAudio,
    pub language: String,
    pub response_format: ResponseFormat,
    pub model: Option<String>,
}
