/// A span of recognized speech, times in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub text: String,
    pub start: f64,
    pub end: f64,
}

impl Segment {
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            text: text.into(),
            start,
            end,
        }
    }
}

/// Backend output before cleaning.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawResult {
    pub text: String,
    pub segments: Vec<Segment>,
}

impl RawResult {
    pub fn new(text: impl Into<String>, segments: Vec<Segment>) -> Self {
        Self {
            text: text.into(),
            segments,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptionResponse {
    pub text: String,
    pub recording_timestamp: Option<String>,
    pub segments: Vec<Segment>,
}

/// Final response body in the representation the client asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum AssembledResponse {
    Json(TranscriptionResponse),
    Text(String),
}
