//! Readers for the whitespace-delimited Kaldi tables used by the aligner:
//! `segments`, `wav.scp` and CTM.

use std::path::Path;

use crate::error::{ParseError, PrepError, Result};
use crate::models::{CtmEntry, SegmentMap, WavScp};

/// Non-blank lines split on whitespace, with 1-based line numbers
fn rows(content: &str) -> impl Iterator<Item = (usize, Vec<&str>)> {
    content
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.split_whitespace().collect::<Vec<_>>()))
        .filter(|(_, fields)| !fields.is_empty())
}

fn check_width(line: usize, fields: &[&str], expected: usize) -> std::result::Result<(), ParseError> {
    if fields.len() < expected {
        return Err(ParseError::ShortRow {
            line,
            expected,
            found: fields.len(),
        });
    }
    Ok(())
}

fn read_table(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| PrepError::io(path, e))
}

pub fn parse_segments_file(path: &Path) -> Result<SegmentMap> {
    parse_segments_str(&read_table(path)?).map_err(|e| PrepError::parse(path, e))
}

/// `<segment-id> <utterance-id> [start end]` rows
pub fn parse_segments_str(content: &str) -> std::result::Result<SegmentMap, ParseError> {
    let mut segments = SegmentMap::new();
    for (line, fields) in rows(content) {
        check_width(line, &fields, 2)?;
        segments.insert(fields[0].to_string(), fields[1].to_string());
    }
    Ok(segments)
}

pub fn parse_wav_scp_file(path: &Path) -> Result<WavScp> {
    parse_wav_scp_str(&read_table(path)?).map_err(|e| PrepError::parse(path, e))
}

/// `<utterance-id> <wav-path>` rows
pub fn parse_wav_scp_str(content: &str) -> std::result::Result<WavScp, ParseError> {
    let mut scp = WavScp::default();
    for (line, fields) in rows(content) {
        check_width(line, &fields, 2)?;
        scp.insert(fields[0].to_string(), fields[1].to_string());
    }
    Ok(scp)
}

pub fn parse_ctm_file(path: &Path) -> Result<Vec<CtmEntry>> {
    parse_ctm_str(&read_table(path)?).map_err(|e| PrepError::parse(path, e))
}

/// `<segment-id> <channel> <start> <duration> <token> [confidence]` rows
pub fn parse_ctm_str(content: &str) -> std::result::Result<Vec<CtmEntry>, ParseError> {
    rows(content)
        .map(|(line, fields)| {
            check_width(line, &fields, 5)?;
            let number = |field: &str, what: &str| {
                field
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite() && *v >= 0.0)
                    .ok_or_else(|| ParseError::InvalidRow {
                        line,
                        message: format!("invalid {} {:?}", what, field),
                    })
            };
            Ok(CtmEntry {
                segment_id: fields[0].to_string(),
                channel: fields[1].to_string(),
                start: number(fields[2], "start time")?,
                duration: number(fields[3], "duration")?,
                token: fields[4].to_string(),
            })
        })
        .collect()
}
