use log::debug;
use serde::Serialize;

use crate::Segment;
use crate::layout;

/// How caption text entities are handled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EntityMode {
    /// Decode HTML/XML entities (`&amp;#39;` becomes `'`)
    #[default]
    Decode,
    /// Keep the text exactly as it appears in the document
    Raw,
}

/// One `<text>` element, with timing kept as written in the document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimedText {
    pub start: String,
    pub duration: String,
    pub text: String,
}

impl From<&Segment> for TimedText {
    fn from(segment: &Segment) -> Self {
        TimedText {
            start: segment.start.to_string(),
            duration: segment.duration.to_string(),
            text: segment.text.clone(),
        }
    }
}

/// Pull every single-line `<text start=".." dur="..">..</text>` element out of a
/// timed-text document, in document order.
pub fn parse_timed_text(xml: &str, entities: EntityMode) -> Vec<TimedText> {
    let texts: Vec<TimedText> = layout::TIMED_TEXT
        .captures_iter(xml)
        .map(|caps| TimedText {
            start: caps[1].to_string(),
            duration: caps[2].to_string(),
            text: apply_entities(&caps[3], entities),
        })
        .collect();
    debug!("Parsed {} timed text element(s)", texts.len());
    texts
}

/// Caption text is escaped once for XML and again for HTML, so decoding runs twice.
pub(crate) fn apply_entities(text: &str, entities: EntityMode) -> String {
    match entities {
        EntityMode::Decode => {
            let once = html_escape::decode_html_entities(text);
            html_escape::decode_html_entities(&once).into_owned()
        }
        EntityMode::Raw => text.to_string(),
    }
}

/// Plain transcript: every text field, space-separated, in document order.
pub fn join_text(texts: &[TimedText]) -> String {
    texts.iter().map(|t| t.text.as_str()).collect::<Vec<_>>().join(" ")
}
