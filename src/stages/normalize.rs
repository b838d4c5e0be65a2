use tracing::debug;

use crate::error::ParseError;
use crate::models::{RawSegment, Utterance};

/// What to do with segments whose transcript is empty after normalization
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EmptyTranscriptPolicy {
    /// Keep them as empty strings, one utterance per segment
    #[default]
    Retain,
    /// Drop them from the output
    Discard,
}

/// Configuration for utterance normalization
#[derive(Debug, Clone, Default)]
pub struct NormalizeConfig {
    pub empty_transcripts: EmptyTranscriptPolicy,
}

/// Collapse whitespace runs to single spaces and trim
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Convert one raw segment into an utterance
pub fn normalize_segment(segment: &RawSegment, audio_file_name: &str) -> Result<Utterance, ParseError> {
    let start_ms = segment.start.to_millis()?;
    let stop_ms = segment.end.to_millis()?;
    if start_ms > stop_ms {
        return Err(ParseError::InvertedRange { start_ms, stop_ms });
    }

    Ok(Utterance {
        audio_file_name: audio_file_name.to_string(),
        transcript: normalize_text(&segment.text),
        start_ms,
        stop_ms,
        speaker_id: segment
            .speaker
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
    })
}

/// Normalize all segments of one file, keeping their order
pub fn normalize(
    segments: &[RawSegment],
    audio_file_name: &str,
    config: &NormalizeConfig,
) -> Result<Vec<Utterance>, ParseError> {
    let mut utterances = Vec::with_capacity(segments.len());

    for segment in segments {
        let utterance = normalize_segment(segment, audio_file_name)?;
        if utterance.transcript.is_empty() {
            debug!(
                "Empty transcript in {} at {}-{}ms",
                audio_file_name, utterance.start_ms, utterance.stop_ms
            );
            if config.empty_transcripts == EmptyTranscriptPolicy::Discard {
                continue;
            }
        }
        utterances.push(utterance);
    }

    Ok(utterances)
}
