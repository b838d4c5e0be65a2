use std::collections::{BTreeMap, HashMap};

use crate::error::ParseError;

/// Parameter key naming the speaker of a tier
pub const PARTICIPANT: &str = "PARTICIPANT";

/// Reference chains deeper than this are treated as cycles
const MAX_REF_DEPTH: usize = 64;

/// A parsed ELAN (`.eaf`) document
#[derive(Debug, Clone, Default)]
pub struct EafDocument {
    /// `TIME_SLOT_ID` -> `TIME_VALUE` in milliseconds (unaligned slots have none)
    pub time_slots: HashMap<String, Option<u64>>,
    /// Tiers in document order
    pub tiers: Vec<EafTier>,
}

#[derive(Debug, Clone, Default)]
pub struct EafTier {
    pub id: String,
    /// Every attribute of the `<TIER>` element, e.g. `PARTICIPANT`
    pub parameters: BTreeMap<String, String>,
    pub annotations: Vec<EafAnnotation>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EafAnnotation {
    Alignable {
        id: String,
        start_slot: String,
        end_slot: String,
        value: String,
    },
    /// Inherits the time span of the annotation it refers to
    Reference {
        id: String,
        target: String,
        value: String,
    },
}

/// A timed annotation value, ordered by start, then end, then text
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct TierInterval {
    pub start_ms: u64,
    pub end_ms: u64,
    pub value: String,
}

impl EafAnnotation {
    pub fn id(&self) -> &str {
        match self {
            EafAnnotation::Alignable { id, .. } | EafAnnotation::Reference { id, .. } => id,
        }
    }

    pub fn value(&self) -> &str {
        match self {
            EafAnnotation::Alignable { value, .. } | EafAnnotation::Reference { value, .. } => {
                value
            }
        }
    }
}

impl EafTier {
    /// Speaker declared for this tier, if any
    pub fn participant(&self) -> Option<&str> {
        self.parameters
            .get(PARTICIPANT)
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
    }
}

impl EafDocument {
    pub fn tier(&self, tier_id: &str) -> Option<&EafTier> {
        self.tiers.iter().find(|t| t.id == tier_id)
    }

    pub fn tier_ids(&self) -> Vec<String> {
        self.tiers.iter().map(|t| t.id.clone()).collect()
    }

    /// Timed values of a tier, sorted by `(start, end, text)`
    pub fn annotation_data(&self, tier: &EafTier) -> Result<Vec<TierInterval>, ParseError> {
        let index: HashMap<&str, &EafAnnotation> = self
            .tiers
            .iter()
            .flat_map(|t| t.annotations.iter())
            .map(|a| (a.id(), a))
            .collect();

        let mut intervals = tier
            .annotations
            .iter()
            .map(|annotation| {
                let (start_ms, end_ms) = self.resolve_span(annotation, &index, 0)?;
                Ok(TierInterval {
                    start_ms,
                    end_ms,
                    value: annotation.value().to_string(),
                })
            })
            .collect::<Result<Vec<_>, ParseError>>()?;

        intervals.sort();
        Ok(intervals)
    }

    fn slot_time(&self, slot: &str) -> Result<u64, ParseError> {
        self.time_slots
            .get(slot)
            .copied()
            .flatten()
            .ok_or_else(|| ParseError::UnresolvedTimeSlot(slot.to_string()))
    }

    fn resolve_span(
        &self,
        annotation: &EafAnnotation,
        index: &HashMap<&str, &EafAnnotation>,
        depth: usize,
    ) -> Result<(u64, u64), ParseError> {
        match annotation {
            EafAnnotation::Alignable {
                start_slot,
                end_slot,
                ..
            } => Ok((self.slot_time(start_slot)?, self.slot_time(end_slot)?)),
            EafAnnotation::Reference { id, target, .. } => {
                let parent = index
                    .get(target.as_str())
                    .filter(|_| depth < MAX_REF_DEPTH)
                    .ok_or_else(|| ParseError::UnknownAnnotationRef(id.clone()))?;
                self.resolve_span(parent, index, depth + 1)
            }
        }
    }
}
