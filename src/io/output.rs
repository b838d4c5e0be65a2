use std::fmt::Write as _;
use std::path::Path;

use tracing::debug;

use crate::error::{PrepError, Result};
use crate::models::{TextGrid, Utterance};

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| PrepError::io(parent, e))?;
    }
    Ok(())
}

/// Write the utterance list as a pretty-printed JSON array
pub fn write_utterances_json(utterances: &[Utterance], path: &Path) -> Result<()> {
    ensure_parent(path)?;
    let file = std::fs::File::create(path).map_err(|e| PrepError::io(path, e))?;
    serde_json::to_writer_pretty(file, utterances).map_err(|e| PrepError::Json {
        path: path.to_path_buf(),
        source: e,
    })?;
    debug!("Wrote {} utterances to {:?}", utterances.len(), path);
    Ok(())
}

/// Escape text for a Praat string literal (quotes are doubled)
fn praat_string(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

/// Render a TextGrid in Praat's long text format
pub fn format_textgrid(grid: &TextGrid) -> String {
    let mut out = String::new();
    // writing into a String cannot fail
    let _ = write_textgrid_body(&mut out, grid);
    out
}

fn write_textgrid_body(out: &mut String, grid: &TextGrid) -> std::fmt::Result {
    writeln!(out, "File type = \"ooTextFile\"")?;
    writeln!(out, "Object class = \"TextGrid\"")?;
    writeln!(out)?;
    writeln!(out, "xmin = {} ", grid.xmin)?;
    writeln!(out, "xmax = {} ", grid.xmax)?;
    writeln!(out, "tiers? <exists> ")?;
    writeln!(out, "size = {} ", grid.tiers.len())?;
    writeln!(out, "item []: ")?;

    for (t, tier) in grid.tiers.iter().enumerate() {
        writeln!(out, "    item [{}]:", t + 1)?;
        writeln!(out, "        class = \"IntervalTier\" ")?;
        writeln!(out, "        name = {} ", praat_string(&tier.name))?;
        writeln!(out, "        xmin = {} ", tier.xmin)?;
        writeln!(out, "        xmax = {} ", tier.xmax)?;
        writeln!(out, "        intervals: size = {} ", tier.intervals.len())?;
        for (i, interval) in tier.intervals.iter().enumerate() {
            writeln!(out, "        intervals [{}]:", i + 1)?;
            writeln!(out, "            xmin = {} ", interval.xmin)?;
            writeln!(out, "            xmax = {} ", interval.xmax)?;
            writeln!(out, "            text = {} ", praat_string(&interval.text))?;
        }
    }
    Ok(())
}

/// Write a TextGrid file
pub fn write_textgrid(grid: &TextGrid, path: &Path) -> Result<()> {
    ensure_parent(path)?;
    std::fs::write(path, format_textgrid(grid)).map_err(|e| PrepError::io(path, e))
}
