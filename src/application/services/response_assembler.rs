use crate::application::ports::InferenceError;
use crate::domain::{
    AssembledResponse, RawResult, ResponseFormat, Segment, TranscriptionResponse,
};

use super::transcript_cleaner::clean_transcript_text;

/// Turns backend output into the client-facing response.
pub struct ResponseAssembler;

impl ResponseAssembler {
    pub fn assemble(
        raw: RawResult,
        format: ResponseFormat,
        recording_timestamp: Option<String>,
    ) -> Result<AssembledResponse, InferenceError> {
        validate_timeline(&raw.segments)?;

        let had_segments = !raw.segments.is_empty();
        let segments = clean_segments(raw.segments);

        // Segment text wins over the backend's own full text whenever
        // segments exist, so `text` is never blank while a segment has words.
        let text = if had_segments {
            segments
                .iter()
                .map(|segment| segment.text.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        } else {
            clean_transcript_text(&raw.text)
        };

        Ok(match format {
            ResponseFormat::Text => AssembledResponse::Text(text),
            ResponseFormat::Json => AssembledResponse::Json(TranscriptionResponse {
                text,
                recording_timestamp,
                segments,
            }),
        })
    }
}

/// Cleans each segment's text and drops the ones left empty. Timing of the
/// remaining segments is not adjusted.
pub fn clean_segments(segments: Vec<Segment>) -> Vec<Segment> {
    segments
        .into_iter()
        .filter_map(|segment| {
            let text = clean_transcript_text(&segment.text);
            (!text.is_empty()).then_some(Segment { text, ..segment })
        })
        .collect()
}

/// Backend segments must be finite, non-negative, `start <= end`, and
/// ordered by start. Overlap between neighbours is tolerated.
pub fn validate_timeline(segments: &[Segment]) -> Result<(), InferenceError> {
    let mut previous: Option<&Segment> = None;

    for (index, segment) in segments.iter().enumerate() {
        if !segment.start.is_finite() || !segment.end.is_finite() || segment.start < 0.0 {
            return Err(InferenceError::MalformedTimeline(format!(
                "segment {} has invalid bounds {}..{}",
                index, segment.start, segment.end
            )));
        }
        if segment.start > segment.end {
            return Err(InferenceError::MalformedTimeline(format!(
                "segment {} starts after it ends ({} > {})",
                index, segment.start, segment.end
            )));
        }
        if let Some(prev) = previous {
            if segment.start < prev.start {
                return Err(InferenceError::MalformedTimeline(format!(
                    "segment {} starts before segment {}",
                    index,
                    index - 1
                )));
            }
            if segment.start < prev.end {
                tracing::warn!(
                    segment = index,
                    start = segment.start,
                    previous_end = prev.end,
                    "Backend segments overlap"
                );
            }
        }
        previous = Some(segment);
    }

    Ok(())
}
