use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{ParseError, PrepError, Result};
use crate::io::{
    find_first_file_by_extension, list_files, parse_ctm_file, parse_segments_file,
    parse_wav_scp_file, write_textgrid,
};
use crate::models::{CtmEntry, Interval, IntervalTier, SegmentMap, TextGrid};

/// Name of the single tier written to every TextGrid
pub const TIER_NAME: &str = "phones";

/// Pattern groups used to find a CTM file when none is given
pub const CTM_PATTERNS: &[&[&str]] = &[&["*.ctm"], &["ctm"]];

/// Paths of the three Kaldi tables the conversion reads
#[derive(Debug, Clone)]
pub struct AlignmentInputs {
    pub ctm: PathBuf,
    pub wav_scp: PathBuf,
    pub segments: PathBuf,
}

/// Find the CTM file under `dir` (`*.ctm` first, then a file named `ctm`)
pub fn locate_ctm(dir: &Path) -> Result<PathBuf> {
    let files = list_files(dir)?;
    find_first_file_by_extension(&files, CTM_PATTERNS)
}

/// Group CTM tokens by utterance id, resolving segment ids through `segments`
pub fn group_by_utterance(
    entries: &[CtmEntry],
    segments: &SegmentMap,
) -> std::result::Result<HashMap<String, Vec<Interval>>, ParseError> {
    let mut grouped: HashMap<String, Vec<Interval>> = HashMap::new();
    for entry in entries {
        let utterance_id = segments
            .get(&entry.segment_id)
            .ok_or_else(|| ParseError::UnknownSegment(entry.segment_id.clone()))?;
        grouped
            .entry(utterance_id.clone())
            .or_default()
            .push(Interval {
                xmin: entry.start(),
                xmax: entry.end(),
                text: entry.token.clone(),
            });
    }
    Ok(grouped)
}

/// Duration of a WAV file in seconds, from its header
pub fn wav_duration(path: &Path) -> Result<f64> {
    let reader = hound::WavReader::open(path).map_err(|e| PrepError::Wav {
        path: path.to_path_buf(),
        source: e,
    })?;
    let sample_rate = reader.spec().sample_rate;
    Ok(f64::from(reader.duration()) / f64::from(sample_rate))
}

/// Write one `utterance-<index>.TextGrid` per `wav.scp` entry, in `wav.scp` order.
///
/// WAV paths are resolved against the directory holding `wav.scp`. Returns the
/// written paths.
pub fn ctm_to_textgrids(inputs: &AlignmentInputs, output_dir: &Path) -> Result<Vec<PathBuf>> {
    let segments = parse_segments_file(&inputs.segments)?;
    let entries = parse_ctm_file(&inputs.ctm)?;
    let wav_scp = parse_wav_scp_file(&inputs.wav_scp)?;
    info!(
        "Loaded {} segments, {} CTM tokens, {} recordings",
        segments.len(),
        entries.len(),
        wav_scp.len()
    );

    let mut grouped = group_by_utterance(&entries, &segments)
        .map_err(|e| PrepError::parse(&inputs.ctm, e))?;
    let wav_root = inputs.wav_scp.parent().unwrap_or_else(|| Path::new(""));

    std::fs::create_dir_all(output_dir).map_err(|e| PrepError::io(output_dir, e))?;

    let mut written = Vec::with_capacity(wav_scp.len());
    for (index, (utterance_id, wav_path)) in wav_scp.iter().enumerate() {
        let intervals = grouped
            .remove(utterance_id)
            .ok_or_else(|| PrepError::MissingAlignment(utterance_id.to_string()))?;

        let wav = wav_root.join(wav_path);
        let xmax = match wav_duration(&wav) {
            Ok(duration) => duration,
            Err(e) => {
                warn!("{}; using the last aligned token as the tier end", e);
                0.0
            }
        };

        let tier = IntervalTier::from_entries(TIER_NAME, intervals, xmax)
            .map_err(|e| PrepError::parse(&inputs.ctm, e))?;
        let grid = TextGrid::new(vec![tier]);
        let path = output_dir.join(format!("utterance-{}.TextGrid", index));
        write_textgrid(&grid, &path)?;

        debug!("Wrote {:?} for {} ({:?})", path, utterance_id, wav);
        written.push(path);
    }

    info!("Wrote {} TextGrids to {:?}", written.len(), output_dir);
    Ok(written)
}
