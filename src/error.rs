use std::path::PathBuf;

use thiserror::Error;

/// A document could not be turned into segments.
///
/// Carries no path; file-level callers wrap it in [`PrepError::Parse`].
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("<{element}> is missing the `{attribute}` attribute")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    #[error("<{element}> has an invalid `{attribute}` value {value:?}")]
    InvalidAttribute {
        element: &'static str,
        attribute: &'static str,
        value: String,
    },

    #[error("invalid time value {0:?}")]
    InvalidTime(String),

    #[error("segment starts at {start_ms}ms but stops at {stop_ms}ms")]
    InvertedRange { start_ms: u64, stop_ms: u64 },

    #[error("time slot {0:?} is undefined or has no time value")]
    UnresolvedTimeSlot(String),

    #[error("annotation {0:?} references an unknown annotation")]
    UnknownAnnotationRef(String),

    #[error("line {line}: expected at least {expected} fields, found {found}")]
    ShortRow {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: {message}")]
    InvalidRow { line: usize, message: String },

    #[error("interval {text:?} starts at {xmin}s, before the previous interval ends at {previous_xmax}s")]
    OverlappingIntervals {
        text: String,
        xmin: f64,
        previous_xmax: f64,
    },

    #[error("CTM segment {0:?} does not appear in the segments table")]
    UnknownSegment(String),
}

/// Errors surfaced at file and run level.
#[derive(Debug, Error)]
pub enum PrepError {
    #[error("failed to access {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("audio file not found: expected {expected:?} next to {annotation:?}")]
    MissingAudio {
        annotation: PathBuf,
        expected: PathBuf,
    },

    #[error("tier {tier:?} not found in {path:?} (available: {available:?})")]
    UnknownTier {
        path: PathBuf,
        tier: String,
        available: Vec<String>,
    },

    #[error("no file matching any of {patterns:?}")]
    NotFound { patterns: Vec<String> },

    #[error("utterance {0:?} has no aligned tokens in the CTM")]
    MissingAlignment(String),

    #[error("failed to write JSON to {path:?}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read WAV header of {path:?}")]
    Wav {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },

    #[error("failed to walk {path:?}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

impl PrepError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, source: ParseError) -> Self {
        Self::Parse {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, PrepError>;
