use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Canonical output record shared by the Transcriber and ELAN paths
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utterance {
    /// WAV file the utterance belongs to, relative to the annotation file
    pub audio_file_name: String,
    /// Whitespace-normalized transcript text
    pub transcript: String,
    /// Start timestamp in milliseconds
    pub start_ms: u64,
    /// Stop timestamp in milliseconds
    pub stop_ms: u64,
    /// Speaker, only when the source declares one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker_id: Option<String>,
}

impl Utterance {
    /// Duration of this utterance in milliseconds
    pub fn duration_ms(&self) -> u64 {
        self.stop_ms.saturating_sub(self.start_ms)
    }
}

/// A timestamp as found in the source document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeValue {
    /// Decimal seconds, kept as the attribute string (Transcriber)
    Seconds(String),
    /// Integer milliseconds (ELAN time slots)
    Millis(u64),
}

impl TimeValue {
    pub fn to_millis(&self) -> Result<u64, ParseError> {
        match self {
            TimeValue::Seconds(raw) => seconds_to_ms(raw),
            TimeValue::Millis(ms) => Ok(*ms),
        }
    }
}

/// One speech span before normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSegment {
    pub start: TimeValue,
    pub end: TimeValue,
    /// Text as collected from the document, whitespace untouched
    pub text: String,
    pub speaker: Option<String>,
}

/// Convert a decimal-seconds string to milliseconds, rounding half up.
///
/// Works on the decimal digits directly so `1.2345` gives 1235 regardless of
/// how the value would round-trip through `f64`.
pub fn seconds_to_ms(value: &str) -> Result<u64, ParseError> {
    let invalid = || ParseError::InvalidTime(value.to_string());
    let trimmed = value.trim();

    let (whole, frac) = trimmed.split_once('.').unwrap_or((trimmed, ""));
    if whole.is_empty() && frac.is_empty() {
        return Err(invalid());
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let whole_secs: u64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid())?
    };

    let digits = frac.as_bytes();
    let mut millis = 0u64;
    for i in 0..3 {
        millis = millis * 10 + digits.get(i).map_or(0, |d| u64::from(d - b'0'));
    }
    if digits.get(3).is_some_and(|&d| d >= b'5') {
        millis += 1;
    }

    whole_secs
        .checked_mul(1000)
        .and_then(|ms| ms.checked_add(millis))
        .ok_or_else(invalid)
}
