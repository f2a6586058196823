use serde::Serialize;

use crate::domain::{Segment, TranscriptionResponse};

/// `POST /v1/audio/transcriptions` body for `response_format=json`.
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptionJson {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recording_timestamp: Option<String>,
    pub segments: Vec<SegmentJson>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SegmentJson {
    pub text: String,
    pub start: f64,
    pub end: f64,
}

impl From<TranscriptionResponse> for TranscriptionJson {
    fn from(response: TranscriptionResponse) -> Self {
        Self {
            text: response.text,
            recording_timestamp: response.recording_timestamp,
            segments: response.segments.into_iter().map(SegmentJson::from).collect(),
        }
    }
}

impl From<Segment> for SegmentJson {
    fn from(segment: Segment) -> Self {
        Self {
            text: segment.text,
            start: segment.start,
            end: segment.end,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}
