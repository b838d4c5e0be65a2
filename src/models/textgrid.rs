use crate::error::ParseError;

/// A Praat TextGrid holding interval tiers only
#[derive(Debug, Clone, PartialEq)]
pub struct TextGrid {
    pub xmin: f64,
    pub xmax: f64,
    pub tiers: Vec<IntervalTier>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntervalTier {
    pub name: String,
    pub xmin: f64,
    pub xmax: f64,
    /// Contiguous intervals covering `xmin..xmax`
    pub intervals: Vec<Interval>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Interval {
    pub xmin: f64,
    pub xmax: f64,
    pub text: String,
}

impl IntervalTier {
    /// Build a tier from labelled entries, sorting them and filling gaps with
    /// empty intervals. `xmax` is widened to the last entry if it ends later.
    ///
    /// Entries that overlap once sorted are rejected; touching boundaries are fine.
    pub fn from_entries(
        name: &str,
        mut entries: Vec<Interval>,
        xmax: f64,
    ) -> Result<Self, ParseError> {
        entries.sort_by(|a, b| a.xmin.total_cmp(&b.xmin));

        let xmax = entries.iter().map(|e| e.xmax).fold(xmax, f64::max);
        let mut intervals = Vec::with_capacity(entries.len() * 2 + 1);
        let mut cursor = 0.0;

        for entry in entries {
            if entry.xmin < cursor {
                return Err(ParseError::OverlappingIntervals {
                    text: entry.text,
                    xmin: entry.xmin,
                    previous_xmax: cursor,
                });
            }
            if entry.xmin > cursor {
                intervals.push(Interval {
                    xmin: cursor,
                    xmax: entry.xmin,
                    text: String::new(),
                });
            }
            cursor = entry.xmax;
            intervals.push(entry);
        }
        if cursor < xmax {
            intervals.push(Interval {
                xmin: cursor,
                xmax,
                text: String::new(),
            });
        }

        Ok(Self {
            name: name.to_string(),
            xmin: 0.0,
            xmax,
            intervals,
        })
    }
}

impl TextGrid {
    pub fn new(tiers: Vec<IntervalTier>) -> Self {
        let xmin = tiers.iter().map(|t| t.xmin).fold(0.0, f64::min);
        let xmax = tiers.iter().map(|t| t.xmax).fold(0.0, f64::max);
        Self { xmin, xmax, tiers }
    }
}
