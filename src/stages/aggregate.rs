use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::error::{PrepError, Result};
use crate::io::{find_files_by_extension, list_files, parse_eaf_file, parse_trs_file};
use crate::models::{RawSegment, TimeValue, AUDIO_EXTENSION, Utterance};
use crate::stages::{extract_segments, normalize, NormalizeConfig};

/// How a batch reacts when one file fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum BatchPolicy {
    /// Stop at the first failing file; nothing is written
    #[default]
    Abort,
    /// Log the failure, leave the file out and carry on
    Skip,
}

/// Annotation format a batch reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceFormat {
    Transcriber,
    Elan { tier: String },
}

impl SourceFormat {
    pub fn patterns(&self) -> &'static [&'static str] {
        match self {
            SourceFormat::Transcriber => &["*.trs"],
            SourceFormat::Elan { .. } => &["*.eaf"],
        }
    }
}

/// Configuration for a directory batch
#[derive(Debug, Clone, Default)]
pub struct BatchConfig {
    pub policy: BatchPolicy,
    pub normalize: NormalizeConfig,
}

/// A file left out of a skip-on-error batch
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: PrepError,
}

/// Outcome of a directory batch
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Utterances in processing order (file order, then in-file order)
    pub utterances: Vec<Utterance>,
    pub files_processed: usize,
    pub failures: Vec<FileFailure>,
}

/// Convert one Transcriber file into utterances.
///
/// The WAV named by `audio_filename` must sit next to the `.trs` file; its
/// absence is reported before any segment is extracted.
pub fn process_trs_file(path: &Path, config: &NormalizeConfig) -> Result<Vec<Utterance>> {
    let doc = parse_trs_file(path)?;
    let audio_file_name = doc.audio_file_name();

    let expected = path.with_file_name(&audio_file_name);
    if !expected.is_file() {
        return Err(PrepError::MissingAudio {
            annotation: path.to_path_buf(),
            expected,
        });
    }

    let segments = extract_segments(&doc).map_err(|e| PrepError::parse(path, e))?;
    let utterances =
        normalize(&segments, &audio_file_name, config).map_err(|e| PrepError::parse(path, e))?;

    info!(
        "{:?}: {} turns, {} utterances",
        path,
        doc.turns.len(),
        utterances.len()
    );
    Ok(utterances)
}

/// Convert one tier of an ELAN file into utterances.
///
/// The companion `<stem>.wav` must sit next to the `.eaf` file; its absence is
/// reported before anything is read from the annotation.
pub fn process_eaf_file(path: &Path, tier_id: &str, config: &NormalizeConfig) -> Result<Vec<Utterance>> {
    let expected = path.with_extension(AUDIO_EXTENSION);
    if !expected.is_file() {
        return Err(PrepError::MissingAudio {
            annotation: path.to_path_buf(),
            expected,
        });
    }
    let audio_file_name = expected
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let doc = parse_eaf_file(path)?;
    let tier = doc.tier(tier_id).ok_or_else(|| PrepError::UnknownTier {
        path: path.to_path_buf(),
        tier: tier_id.to_string(),
        available: doc.tier_ids(),
    })?;
    let speaker = tier.participant().map(str::to_string);

    let segments: Vec<RawSegment> = doc
        .annotation_data(tier)
        .map_err(|e| PrepError::parse(path, e))?
        .into_iter()
        .map(|interval| RawSegment {
            start: TimeValue::Millis(interval.start_ms),
            end: TimeValue::Millis(interval.end_ms),
            text: interval.value,
            speaker: speaker.clone(),
        })
        .collect();

    let utterances =
        normalize(&segments, &audio_file_name, config).map_err(|e| PrepError::parse(path, e))?;

    info!(
        "{:?}: tier {:?}, {} utterances",
        path,
        tier_id,
        utterances.len()
    );
    Ok(utterances)
}

/// Convert every matching file under `dir` and concatenate the results.
///
/// Files are processed in sorted path order. Under [`BatchPolicy::Abort`] the
/// first failure is returned; under [`BatchPolicy::Skip`] it is recorded in the
/// report and the batch continues.
pub fn aggregate_directory(dir: &Path, source: &SourceFormat, config: &BatchConfig) -> Result<BatchReport> {
    let mut files = find_files_by_extension(list_files(dir)?, source.patterns());
    files.sort();

    if files.is_empty() {
        warn!("No files matching {:?} under {:?}", source.patterns(), dir);
    }

    let mut report = BatchReport::default();
    for path in files {
        let result = match source {
            SourceFormat::Transcriber => process_trs_file(&path, &config.normalize),
            SourceFormat::Elan { tier } => process_eaf_file(&path, tier, &config.normalize),
        };

        match result {
            Ok(utterances) => {
                report.utterances.extend(utterances);
                report.files_processed += 1;
            }
            Err(e) if config.policy == BatchPolicy::Skip => {
                error!("Skipping {:?}: {}", path, e);
                report.failures.push(FileFailure { path, error: e });
            }
            Err(e) => return Err(e),
        }
    }

    info!(
        "Aggregated {} utterances from {} files ({} skipped)",
        report.utterances.len(),
        report.files_processed,
        report.failures.len()
    );
    Ok(report)
}
