use tracing::debug;

use crate::error::ParseError;
use crate::models::{RawSegment, TimeValue, TrsDocument, Turn, TurnNode};

/// Text and markers collected between two synchronization points
#[derive(Debug, Default)]
struct Span<'a> {
    start: Option<&'a str>,
    texts: Vec<&'a str>,
    who: Vec<usize>,
}

/// Extract raw segments from every turn, in document order.
///
/// Each `Sync` opens a segment; a turn without any `Sync` yields one segment
/// spanning the whole turn.
pub fn extract_segments(doc: &TrsDocument) -> Result<Vec<RawSegment>, ParseError> {
    let mut segments = Vec::with_capacity(doc.sync_count() + doc.turns.len());
    for turn in &doc.turns {
        segments.extend(extract_turn(doc, turn)?);
    }
    debug!(
        "Extracted {} segments from {} turns of {:?}",
        segments.len(),
        doc.turns.len(),
        doc.audio_filename
    );
    Ok(segments)
}

/// Extract the segments of a single turn.
///
/// Segment `i` stops where segment `i + 1` starts; the last one stops at the
/// turn's `endTime`.
pub fn extract_turn(doc: &TrsDocument, turn: &Turn) -> Result<Vec<RawSegment>, ParseError> {
    let spans = split_at_syncs(turn);

    let turn_end = || {
        turn.end_time.as_deref().ok_or(ParseError::MissingAttribute {
            element: "Turn",
            attribute: "endTime",
        })
    };
    let turn_start = || {
        turn.start_time.as_deref().ok_or(ParseError::MissingAttribute {
            element: "Turn",
            attribute: "startTime",
        })
    };

    let mut segments = Vec::with_capacity(spans.len());
    for (i, span) in spans.iter().enumerate() {
        let start = match span.start {
            Some(time) => time,
            None => turn_start()?,
        };
        let end = match spans.get(i + 1).and_then(|next| next.start) {
            Some(time) => time,
            None => turn_end()?,
        };

        segments.push(RawSegment {
            start: TimeValue::Seconds(start.to_string()),
            end: TimeValue::Seconds(end.to_string()),
            text: span.texts.join(" "),
            speaker: attribute_speaker(doc, turn, span),
        });
    }

    Ok(segments)
}

/// Group a turn's nodes by `Sync`.
///
/// Anything before the first `Sync` belongs to the first span, so no text is
/// lost; a turn with no `Sync` becomes a single span with no start.
fn split_at_syncs(turn: &Turn) -> Vec<Span<'_>> {
    let mut spans: Vec<Span> = Vec::new();
    let mut pending = Span::default();

    for node in &turn.nodes {
        match node {
            TurnNode::Sync { time } => {
                if spans.is_empty() {
                    pending.start = Some(time.as_str());
                    spans.push(std::mem::take(&mut pending));
                } else {
                    spans.push(Span {
                        start: Some(time.as_str()),
                        ..Default::default()
                    });
                }
            }
            TurnNode::Who { nb } => current(&mut spans, &mut pending).who.push(*nb),
            TurnNode::Text(text) => current(&mut spans, &mut pending).texts.push(text.as_str()),
        }
    }

    if spans.is_empty() {
        spans.push(pending);
    }
    spans
}

fn current<'s, 'a>(spans: &'s mut [Span<'a>], pending: &'s mut Span<'a>) -> &'s mut Span<'a> {
    match spans.last_mut() {
        Some(span) => span,
        None => pending,
    }
}

/// Speaker of a segment.
///
/// A single-speaker turn resolves to that speaker's name. In a multi-speaker
/// turn the segment's `Who` markers decide, and only when they all select the
/// same speaker; otherwise the speaker is left unset.
fn attribute_speaker(doc: &TrsDocument, turn: &Turn, span: &Span) -> Option<String> {
    match turn.speakers.as_slice() {
        [] => None,
        [only] => Some(doc.speaker_name(only).to_string()),
        several => {
            let mut selected: Option<&str> = None;
            for &nb in &span.who {
                let id = several.get(nb.checked_sub(1)?)?.as_str();
                match selected {
                    Some(previous) if previous != id => return None,
                    _ => selected = Some(id),
                }
            }
            selected.map(|id| doc.speaker_name(id).to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::parse_trs_str;

    fn trs(turns: &str) -> TrsDocument {
        let xml = format!(
            r#"<Trans audio_filename="story">
<Speakers>
<Speaker id="spk1" name="Alice"/>
<Speaker id="spk2" name="Bob"/>
</Speakers>
<Episode><Section type="report" startTime="0" endTime="100">
{turns}
</Section></Episode>
</Trans>"#
        );
        parse_trs_str(&xml).unwrap()
    }

    fn seconds(raw: &str) -> TimeValue {
        TimeValue::Seconds(raw.to_string())
    }

    #[test]
    fn test_segments_bounded_by_syncs() {
        let doc = trs(r#"<Turn speaker="spk1" startTime="0" endTime="4.5">
<Sync time="0"/>
first part
<Sync time="1.23"/>
second part
</Turn>"#);
        let segments = extract_segments(&doc).unwrap();

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].start, seconds("0"));
        assert_eq!(segments[0].end, seconds("1.23"));
        assert_eq!(segments[1].start, seconds("1.23"));
        assert_eq!(segments[1].end, seconds("4.5"));
        assert_eq!(segments[0].text.trim(), "first part");
        assert_eq!(segments[1].speaker.as_deref(), Some("Alice"));
    }

    #[test]
    fn test_turn_without_sync_is_one_segment() {
        let doc = trs(r#"<Turn speaker="spk2" startTime="5" endTime="7.25">
no sync here
</Turn>"#);
        let segments = extract_segments(&doc).unwrap();

        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].start, seconds("5"));
        assert_eq!(segments[0].end, seconds("7.25"));
        assert_eq!(segments[0].speaker.as_deref(), Some("Bob"));
    }

    #[test]
    fn test_turn_without_sync_needs_times() {
        let doc = trs(r#"<Turn speaker="spk2" endTime="7.25">text</Turn>"#);
        assert!(matches!(
            extract_segments(&doc),
            Err(ParseError::MissingAttribute {
                attribute: "startTime",
                ..
            })
        ));
    }

    #[test]
    fn test_last_segment_needs_turn_end() {
        let doc = trs(r#"<Turn speaker="spk1" startTime="0"><Sync time="0"/>text</Turn>"#);
        assert!(matches!(
            extract_segments(&doc),
            Err(ParseError::MissingAttribute {
                attribute: "endTime",
                ..
            })
        ));
    }

    #[test]
    fn test_text_before_first_sync_is_kept() {
        let doc = trs(r#"<Turn speaker="spk1" startTime="0" endTime="2">lead <Sync time="0.5"/>rest</Turn>"#);
        let segments = extract_segments(&doc).unwrap();

        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].start, seconds("0.5"));
        assert!(segments[0].text.contains("lead"));
        assert!(segments[0].text.contains("rest"));
    }

    #[test]
    fn test_multi_speaker_attribution() {
        let doc = trs(r#"<Turn speaker="spk1 spk2" startTime="0" endTime="6">
<Sync time="0"/>
<Who nb="2"/>
only bob
<Sync time="2"/>
<Who nb="1"/>
alice
<Who nb="2"/>
bob
<Sync time="4"/>
nobody marked
</Turn>"#);
        let segments = extract_segments(&doc).unwrap();

        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].speaker.as_deref(), Some("Bob"));
        assert_eq!(segments[1].speaker, None);
        assert_eq!(segments[2].speaker, None);
    }

    #[test]
    fn test_who_out_of_range_leaves_speaker_unset() {
        let doc = trs(r#"<Turn speaker="spk1 spk2" startTime="0" endTime="1">
<Sync time="0"/><Who nb="3"/>who
</Turn>"#);
        let segments = extract_segments(&doc).unwrap();
        assert_eq!(segments[0].speaker, None);
    }

    #[test]
    fn test_turn_without_speaker() {
        let doc = trs(r#"<Turn startTime="0" endTime="1"><Sync time="0"/>music</Turn>"#);
        let segments = extract_segments(&doc).unwrap();
        assert_eq!(segments[0].speaker, None);
    }

    #[test]
    fn test_unknown_speaker_falls_back_to_id() {
        let doc = trs(r#"<Turn speaker="spk7" startTime="0" endTime="1"><Sync time="0"/>x</Turn>"#);
        let segments = extract_segments(&doc).unwrap();
        assert_eq!(segments[0].speaker.as_deref(), Some("spk7"));
    }

    #[test]
    fn test_segments_follow_document_order() {
        let doc = trs(r#"<Turn speaker="spk1" startTime="0" endTime="2">
<Sync time="0"/>a<Sync time="1"/>b
</Turn>
<Turn speaker="spk2" startTime="2" endTime="3">c</Turn>
<Turn speaker="spk1" startTime="3" endTime="5">
<Sync time="3"/>d<Sync time="4"/>e
</Turn>"#);
        let segments = extract_segments(&doc).unwrap();
        let texts: Vec<String> = segments.iter().map(|s| s.text.trim().to_string()).collect();

        assert_eq!(texts, vec!["a", "b", "c", "d", "e"]);
        assert_eq!(segments.len(), doc.sync_count() + 1);
    }
}
