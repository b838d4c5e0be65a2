/// Extension appended to `audio_filename` to name the playback file
pub const AUDIO_EXTENSION: &str = "wav";

/// A parsed Transcriber (`.trs`) document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrsDocument {
    /// `audio_filename` attribute of the root element, without extension
    pub audio_filename: String,
    /// Speaker table from `<Speakers>`
    pub speakers: Vec<SpeakerInfo>,
    /// All turns in document order
    pub turns: Vec<Turn>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeakerInfo {
    pub id: String,
    pub name: Option<String>,
}

/// A speaker turn with its timed content flattened into document order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Turn {
    /// Speaker references from the space-separated `speaker` attribute
    pub speakers: Vec<String>,
    /// `startTime` attribute, decimal seconds
    pub start_time: Option<String>,
    /// `endTime` attribute, decimal seconds
    pub end_time: Option<String>,
    pub nodes: Vec<TurnNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnNode {
    /// Synchronization point, `time` in decimal seconds
    Sync { time: String },
    /// Selects the `nb`-th (1-based) speaker of a multi-speaker turn
    Who { nb: usize },
    Text(String),
}

impl TrsDocument {
    /// Audio file name every utterance of this document refers to
    pub fn audio_file_name(&self) -> String {
        format!("{}.{}", self.audio_filename, AUDIO_EXTENSION)
    }

    /// Human-readable name for a speaker reference, falling back to the id
    pub fn speaker_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.speakers
            .iter()
            .find(|s| s.id == id)
            .and_then(|s| s.name.as_deref())
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(id)
    }

    /// Total number of `Sync` markers across all turns
    pub fn sync_count(&self) -> usize {
        self.turns.iter().map(Turn::sync_count).sum()
    }
}

impl Turn {
    pub fn sync_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, TurnNode::Sync { .. }))
            .count()
    }

    pub fn is_multi_speaker(&self) -> bool {
        self.speakers.len() > 1
    }
}
