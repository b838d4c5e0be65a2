use std::path::Path;

use roxmltree::{Document, Node, ParsingOptions};

use crate::error::{ParseError, PrepError, Result};
use crate::models::{EafAnnotation, EafDocument, EafTier, SpeakerInfo, TrsDocument, Turn, TurnNode};

/// Read an annotation file as text.
///
/// Transcriber files are commonly ISO-8859-1; anything that is not valid
/// UTF-8 is decoded as Latin-1.
pub fn read_document(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|e| PrepError::io(path, e))?;
    Ok(String::from_utf8(bytes)
        .unwrap_or_else(|e| e.into_bytes().iter().map(|&b| char::from(b)).collect()))
}

fn parse_xml(xml: &str) -> std::result::Result<Document<'_>, ParseError> {
    let mut options = ParsingOptions::default();
    options.allow_dtd = true;
    Ok(Document::parse_with_options(xml, options)?)
}

fn required<'a>(
    node: Node<'a, '_>,
    element: &'static str,
    attribute: &'static str,
) -> std::result::Result<&'a str, ParseError> {
    node.attribute(attribute)
        .ok_or(ParseError::MissingAttribute { element, attribute })
}

/// Parse a Transcriber file into a TrsDocument
pub fn parse_trs_file(path: &Path) -> Result<TrsDocument> {
    let content = read_document(path)?;
    parse_trs_str(&content).map_err(|e| PrepError::parse(path, e))
}

/// Parse Transcriber XML into a TrsDocument
pub fn parse_trs_str(xml: &str) -> std::result::Result<TrsDocument, ParseError> {
    let doc = parse_xml(xml)?;
    let root = doc.root_element();

    let audio_filename = required(root, "Trans", "audio_filename")?.to_string();

    let speakers = root
        .descendants()
        .filter(|n| n.has_tag_name("Speaker"))
        .map(|n| {
            Ok(SpeakerInfo {
                id: required(n, "Speaker", "id")?.to_string(),
                name: n.attribute("name").map(str::to_string),
            })
        })
        .collect::<std::result::Result<Vec<_>, ParseError>>()?;

    let turns = root
        .descendants()
        .filter(|n| n.has_tag_name("Turn"))
        .map(parse_turn)
        .collect::<std::result::Result<Vec<_>, ParseError>>()?;

    Ok(TrsDocument {
        audio_filename,
        speakers,
        turns,
    })
}

/// Flatten a `<Turn>` into Sync/Who/Text nodes in document order
fn parse_turn(turn: Node) -> std::result::Result<Turn, ParseError> {
    let speakers = turn
        .attribute("speaker")
        .map(|s| s.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default();

    let mut nodes = Vec::new();
    for node in turn.descendants().skip(1) {
        if node.is_text() {
            if let Some(text) = node.text() {
                nodes.push(TurnNode::Text(text.to_string()));
            }
        } else if node.has_tag_name("Sync") {
            nodes.push(TurnNode::Sync {
                time: required(node, "Sync", "time")?.to_string(),
            });
        } else if node.has_tag_name("Who") {
            let raw = required(node, "Who", "nb")?;
            let nb = raw
                .trim()
                .parse()
                .map_err(|_| ParseError::InvalidAttribute {
                    element: "Who",
                    attribute: "nb",
                    value: raw.to_string(),
                })?;
            nodes.push(TurnNode::Who { nb });
        }
    }

    Ok(Turn {
        speakers,
        start_time: turn.attribute("startTime").map(str::to_string),
        end_time: turn.attribute("endTime").map(str::to_string),
        nodes,
    })
}

/// Parse an ELAN file into an EafDocument
pub fn parse_eaf_file(path: &Path) -> Result<EafDocument> {
    let content = read_document(path)?;
    parse_eaf_str(&content).map_err(|e| PrepError::parse(path, e))
}

/// Parse ELAN XML into an EafDocument
pub fn parse_eaf_str(xml: &str) -> std::result::Result<EafDocument, ParseError> {
    let doc = parse_xml(xml)?;
    let root = doc.root_element();

    let time_slots = root
        .descendants()
        .filter(|n| n.has_tag_name("TIME_SLOT"))
        .map(|n| {
            let id = required(n, "TIME_SLOT", "TIME_SLOT_ID")?.to_string();
            let value = n
                .attribute("TIME_VALUE")
                .map(|v| {
                    v.trim()
                        .parse::<u64>()
                        .map_err(|_| ParseError::InvalidTime(v.to_string()))
                })
                .transpose()?;
            Ok((id, value))
        })
        .collect::<std::result::Result<_, ParseError>>()?;

    let tiers = root
        .children()
        .filter(|n| n.has_tag_name("TIER"))
        .map(parse_tier)
        .collect::<std::result::Result<Vec<_>, ParseError>>()?;

    Ok(EafDocument { time_slots, tiers })
}

fn parse_tier(tier: Node) -> std::result::Result<EafTier, ParseError> {
    let id = required(tier, "TIER", "TIER_ID")?.to_string();
    let parameters = tier
        .attributes()
        .map(|a| (a.name().to_string(), a.value().to_string()))
        .collect();

    let mut annotations = Vec::new();
    for node in tier.descendants() {
        if node.has_tag_name("ALIGNABLE_ANNOTATION") {
            annotations.push(EafAnnotation::Alignable {
                id: required(node, "ALIGNABLE_ANNOTATION", "ANNOTATION_ID")?.to_string(),
                start_slot: required(node, "ALIGNABLE_ANNOTATION", "TIME_SLOT_REF1")?.to_string(),
                end_slot: required(node, "ALIGNABLE_ANNOTATION", "TIME_SLOT_REF2")?.to_string(),
                value: annotation_value(node),
            });
        } else if node.has_tag_name("REF_ANNOTATION") {
            annotations.push(EafAnnotation::Reference {
                id: required(node, "REF_ANNOTATION", "ANNOTATION_ID")?.to_string(),
                target: required(node, "REF_ANNOTATION", "ANNOTATION_REF")?.to_string(),
                value: annotation_value(node),
            });
        }
    }

    Ok(EafTier {
        id,
        parameters,
        annotations,
    })
}

fn annotation_value(annotation: Node) -> String {
    annotation
        .children()
        .find(|n| n.has_tag_name("ANNOTATION_VALUE"))
        .map(|n| {
            n.descendants()
                .filter(|d| d.is_text())
                .filter_map(|d| d.text())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRS: &str = r#"<?xml version="1.0" encoding="ISO-8859-1"?>
<!DOCTYPE Trans SYSTEM "trans-14.dtd">
<Trans scribe="anon" audio_filename="story" version="1">
<Speakers>
<Speaker id="spk1" name="Alice" check="no" dialect="native" accent="" scope="local"/>
<Speaker id="spk2" name="Bob" check="no" dialect="native" accent="" scope="local"/>
</Speakers>
<Episode>
<Section type="report" startTime="0" endTime="6">
<Turn speaker="spk1" startTime="0" endTime="3.5">
<Sync time="0"/>
once upon
<Event desc="laugh" type="noise" extent="instantaneous"/>
a time
<Sync time="1.25"/>
there was
</Turn>
<Turn speaker="spk1 spk2" startTime="3.5" endTime="6">
<Sync time="3.5"/>
<Who nb="1"/>
hello
<Who nb="2"/>
hi
</Turn>
</Section>
</Episode>
</Trans>"#;

    #[test]
    fn test_parse_trs_str() {
        let doc = parse_trs_str(TRS).unwrap();

        assert_eq!(doc.audio_filename, "story");
        assert_eq!(doc.speakers.len(), 2);
        assert_eq!(doc.speakers[1].name.as_deref(), Some("Bob"));
        assert_eq!(doc.turns.len(), 2);
        assert_eq!(doc.sync_count(), 3);

        let first = &doc.turns[0];
        assert_eq!(first.speakers, vec!["spk1"]);
        assert_eq!(first.start_time.as_deref(), Some("0"));
        assert_eq!(first.end_time.as_deref(), Some("3.5"));
        assert_eq!(
            first.nodes[0],
            TurnNode::Sync {
                time: "0".to_string()
            }
        );

        let second = &doc.turns[1];
        assert!(second.is_multi_speaker());
        assert!(second.nodes.contains(&TurnNode::Who { nb: 2 }));
    }

    #[test]
    fn test_parse_trs_missing_audio_filename() {
        let xml = r#"<Trans><Episode/></Trans>"#;
        assert!(matches!(
            parse_trs_str(xml),
            Err(ParseError::MissingAttribute {
                attribute: "audio_filename",
                ..
            })
        ));
    }

    #[test]
    fn test_parse_trs_invalid_who_nb() {
        let xml = r#"<Trans audio_filename="x"><Turn><Sync time="0"/><Who nb="x"/>hi</Turn></Trans>"#;
        match parse_trs_str(xml) {
            Err(ParseError::InvalidAttribute {
                element,
                attribute,
                value,
            }) => {
                assert_eq!((element, attribute), ("Who", "nb"));
                assert_eq!(value, "x");
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let xml = r#"<Trans audio_filename="x"><Turn><Who/></Turn></Trans>"#;
        assert!(matches!(
            parse_trs_str(xml),
            Err(ParseError::MissingAttribute { attribute: "nb", .. })
        ));
    }

    #[test]
    fn test_parse_trs_malformed() {
        let xml = r#"<Trans audio_filename="x"><Turn></Trans>"#;
        assert!(matches!(parse_trs_str(xml), Err(ParseError::Xml(_))));
    }

    #[test]
    fn test_read_document_latin1_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin.trs");
        let mut bytes = br#"<Trans audio_filename="caf"#.to_vec();
        bytes.push(0xE9);
        bytes.extend_from_slice(br#""/>"#);
        std::fs::write(&path, bytes).unwrap();

        let doc = parse_trs_file(&path).unwrap();
        assert_eq!(doc.audio_filename, "café");
    }

    const EAF: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ANNOTATION_DOCUMENT AUTHOR="" DATE="2018-01-01T00:00:00+10:00" FORMAT="3.0" VERSION="3.0">
    <HEADER MEDIA_FILE="" TIME_UNITS="milliseconds">
        <MEDIA_DESCRIPTOR MEDIA_URL="file:///speech.wav" MIME_TYPE="audio/x-wav"/>
    </HEADER>
    <TIME_ORDER>
        <TIME_SLOT TIME_SLOT_ID="ts1" TIME_VALUE="100"/>
        <TIME_SLOT TIME_SLOT_ID="ts2" TIME_VALUE="1500"/>
        <TIME_SLOT TIME_SLOT_ID="ts3"/>
    </TIME_ORDER>
    <TIER LINGUISTIC_TYPE_REF="default-lt" PARTICIPANT="Nell" TIER_ID="Phrase">
        <ANNOTATION>
            <ALIGNABLE_ANNOTATION ANNOTATION_ID="a1" TIME_SLOT_REF1="ts1" TIME_SLOT_REF2="ts2">
                <ANNOTATION_VALUE>ngayi &amp; nyinta</ANNOTATION_VALUE>
            </ALIGNABLE_ANNOTATION>
        </ANNOTATION>
    </TIER>
    <TIER LINGUISTIC_TYPE_REF="translation" PARENT_REF="Phrase" TIER_ID="Translation">
        <ANNOTATION>
            <REF_ANNOTATION ANNOTATION_ID="a2" ANNOTATION_REF="a1">
                <ANNOTATION_VALUE>me and you</ANNOTATION_VALUE>
            </REF_ANNOTATION>
        </ANNOTATION>
    </TIER>
</ANNOTATION_DOCUMENT>"#;

    #[test]
    fn test_parse_eaf_str() {
        let doc = parse_eaf_str(EAF).unwrap();

        assert_eq!(doc.tier_ids(), vec!["Phrase", "Translation"]);
        assert_eq!(doc.time_slots.get("ts1"), Some(&Some(100)));
        assert_eq!(doc.time_slots.get("ts3"), Some(&None));

        let phrase = doc.tier("Phrase").unwrap();
        assert_eq!(phrase.participant(), Some("Nell"));
        assert_eq!(
            phrase.parameters.get("LINGUISTIC_TYPE_REF").map(String::as_str),
            Some("default-lt")
        );
        assert_eq!(phrase.annotations[0].value(), "ngayi & nyinta");

        let translation = doc.tier("Translation").unwrap();
        let data = doc.annotation_data(translation).unwrap();
        assert_eq!((data[0].start_ms, data[0].end_ms), (100, 1500));
        assert_eq!(data[0].value, "me and you");
    }

    #[test]
    fn test_parse_eaf_invalid_time_value() {
        let xml = r#"<ANNOTATION_DOCUMENT><TIME_ORDER>
            <TIME_SLOT TIME_SLOT_ID="ts1" TIME_VALUE="soon"/>
        </TIME_ORDER></ANNOTATION_DOCUMENT>"#;
        assert!(matches!(
            parse_eaf_str(xml),
            Err(ParseError::InvalidTime(v)) if v == "soon"
        ));
    }
}
