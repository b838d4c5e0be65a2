use std::collections::HashMap;

/// One row of a Kaldi CTM file
#[derive(Debug, Clone, PartialEq)]
pub struct CtmEntry {
    pub segment_id: String,
    pub channel: String,
    /// Start time in seconds
    pub start: f64,
    /// Duration in seconds
    pub duration: f64,
    pub token: String,
}

/// Round seconds to whole microseconds, dropping binary noise such as
/// `0.1 + 0.2 == 0.30000000000000004`
pub fn round_micros(seconds: f64) -> f64 {
    (seconds * 1e6).round() / 1e6
}

impl CtmEntry {
    pub fn start(&self) -> f64 {
        round_micros(self.start)
    }

    pub fn end(&self) -> f64 {
        round_micros(self.start + self.duration)
    }
}

/// Kaldi `segments` table: segment id -> utterance id
pub type SegmentMap = HashMap<String, String>;

/// Kaldi `wav.scp` table, keeping file order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WavScp {
    entries: Vec<(String, String)>,
    /// utterance id -> position in `entries`
    index: HashMap<String, usize>,
}

impl WavScp {
    /// Insert an entry; a repeated id keeps its first position and takes the new path
    pub fn insert(&mut self, utterance_id: String, wav_path: String) {
        match self.index.get(&utterance_id) {
            Some(&position) => self.entries[position].1 = wav_path,
            None => {
                self.index.insert(utterance_id.clone(), self.entries.len());
                self.entries.push((utterance_id, wav_path));
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(id, path)| (id.as_str(), path.as_str()))
    }

    pub fn get(&self, utterance_id: &str) -> Option<&str> {
        self.index
            .get(utterance_id)
            .map(|&position| self.entries[position].1.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
