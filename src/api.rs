//! Caption retrieval through YouTube's InnerTube player endpoint.
//!
//! This is the client the batch driver talks to: look up the tracks a video has,
//! pick one by language and kind, and fetch it as timed segments.

use async_trait::async_trait;
use eyre::{Result, WrapErr, bail, eyre};
use log::debug;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde_json::Value;

use crate::captions::{CaptionTrack, unescape_track_url};
use crate::fetch::fetch_page;
use crate::timedtext::{EntityMode, apply_entities};
use crate::{Segment, Transcript, layout};

const PLAYER_TRACKS: &str = "/captions/playerCaptionsTracklistRenderer/captionTracks";
const PLAYER_TITLE: &str = "/videoDetails/title";

/// Source of generated transcripts for the batch driver
#[async_trait]
pub trait TranscriptProvider {
    /// Automatically generated transcript in the first of `langs` that has one
    async fn generated_transcript(&self, video_id: &str, langs: &[String]) -> Result<Transcript>;
}

/// Caption tracks available for one video
#[derive(Debug, Clone)]
pub struct TranscriptList {
    pub video_id: String,
    pub title: String,
    pub tracks: Vec<CaptionTrack>,
}

impl TranscriptList {
    /// Read the title and caption tracks out of a player response.
    pub fn from_player(video_id: &str, player: &Value) -> Result<Self> {
        let tracks: Vec<CaptionTrack> = match player.pointer(PLAYER_TRACKS) {
            Some(tracks) => serde_json::from_value(tracks.clone())
                .wrap_err_with(|| format!("malformed caption tracks for video {video_id}"))?,
            None => Vec::new(),
        };
        if tracks.is_empty() {
            bail!("no captions available for video {video_id}");
        }

        let title = player
            .pointer(PLAYER_TITLE)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Ok(Self {
            video_id: video_id.to_string(),
            title,
            tracks,
        })
    }

    /// First generated track matching `langs`, tried in order.
    pub fn find_generated<S: AsRef<str>>(&self, langs: &[S]) -> Result<&CaptionTrack> {
        self.find_where(langs, |t| t.is_generated(), "generated")
    }

    /// First manually created track matching `langs`, tried in order.
    pub fn find_manual<S: AsRef<str>>(&self, langs: &[S]) -> Result<&CaptionTrack> {
        self.find_where(langs, |t| !t.is_generated(), "manually created")
    }

    /// Manually created tracks win over generated ones for the same language.
    pub fn find<S: AsRef<str>>(&self, langs: &[S]) -> Result<&CaptionTrack> {
        self.find_manual(langs).or_else(|_| self.find_generated(langs))
    }

    fn find_where<S, F>(&self, langs: &[S], pred: F, kind: &str) -> Result<&CaptionTrack>
    where
        S: AsRef<str>,
        F: Fn(&CaptionTrack) -> bool,
    {
        if let Some(track) = langs.iter().find_map(|lang| {
            self.tracks
                .iter()
                .find(|t| t.language_code == lang.as_ref() && pred(t))
        }) {
            return Ok(track);
        }

        let wanted: Vec<&str> = langs.iter().map(|l| l.as_ref()).collect();
        let available: Vec<String> = self
            .tracks
            .iter()
            .map(|t| {
                if t.is_generated() {
                    format!("{} (generated)", t.language_code)
                } else {
                    t.language_code.clone()
                }
            })
            .collect();
        bail!(
            "no {kind} transcript in {wanted:?} for video {}; available: [{}]",
            self.video_id,
            available.join(", ")
        );
    }
}

/// InnerTube-backed caption client
#[derive(Debug, Clone)]
pub struct CaptionApi {
    client: reqwest::Client,
    entities: EntityMode,
}

impl CaptionApi {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            entities: EntityMode::default(),
        }
    }

    /// How entities in fetched caption text are handled
    pub fn with_entities(mut self, entities: EntityMode) -> Self {
        self.entities = entities;
        self
    }

    /// List every caption track the player reports for `video_id`.
    pub async fn list_transcripts(&self, video_id: &str) -> Result<TranscriptList> {
        let watch_url = format!("{}{video_id}", layout::WATCH_URL_PREFIX);
        let page_html = fetch_page(&self.client, &watch_url).await?;

        let api_key = extract_api_key(&page_html)?;
        debug!("InnerTube API key for {video_id}: {api_key}");

        let player_url = format!("{}?key={api_key}&prettyPrint=false", layout::PLAYER_ENDPOINT);
        let body = serde_json::json!({
            "context": {
                "client": {
                    "hl": "en",
                    "gl": "US",
                    "clientName": layout::CLIENT_NAME,
                    "clientVersion": layout::CLIENT_VERSION
                }
            },
            "videoId": video_id
        });

        let player: Value = self
            .client
            .post(&player_url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .wrap_err_with(|| format!("decoding player response for {video_id}"))?;

        let list = TranscriptList::from_player(video_id, &player)?;
        debug!("Player lists {} caption track(s) for {video_id}", list.tracks.len());
        Ok(list)
    }

    /// Download and parse one track of `list`.
    pub async fn fetch(&self, list: &TranscriptList, track: &CaptionTrack) -> Result<Transcript> {
        debug!(
            "Fetching {} track {} for {}",
            if track.is_generated() { "generated" } else { "manual" },
            track.language_code,
            list.video_id
        );

        let url = unescape_track_url(&track.base_url);
        let caption_xml = fetch_page(&self.client, &url).await?;
        let segments = parse_caption_xml(&caption_xml, self.entities)?;

        Ok(Transcript {
            video_id: list.video_id.clone(),
            title: list.title.clone(),
            language: track.language_code.clone(),
            generated: track.is_generated(),
            segments,
        })
    }
}

#[async_trait]
impl TranscriptProvider for CaptionApi {
    async fn generated_transcript(&self, video_id: &str, langs: &[String]) -> Result<Transcript> {
        let list = self.list_transcripts(video_id).await?;
        let track = list.find_generated(langs)?;
        self.fetch(&list, track).await
    }
}

fn extract_api_key(html: &str) -> Result<String> {
    layout::INNERTUBE_API_KEY
        .captures(html)
        .or_else(|| layout::INNERTUBE_API_KEY_LEGACY.captures(html))
        .map(|caps| caps[1].to_string())
        .ok_or_else(|| eyre!("could not extract InnerTube API key from watch page"))
}

fn cue_timing(e: &BytesStart) -> (Option<f64>, Option<f64>) {
    let mut start = None;
    let mut dur = None;
    for attr in e.attributes().flatten() {
        let value = String::from_utf8_lossy(&attr.value);
        match attr.key.as_ref() {
            b"start" => start = value.parse::<f64>().ok(),
            b"dur" => dur = value.parse::<f64>().ok(),
            _ => {}
        }
    }
    (start, dur)
}

/// Timed segments of a caption document.
///
/// A cue spans one `<text>` element: any text inside it, including text nested in
/// inline elements, is collected until the element closes. Cues that are empty or
/// only whitespace produce no segment.
pub fn parse_caption_xml(xml: &str, entities: EntityMode) -> Result<Vec<Segment>> {
    let mut reader = Reader::from_str(xml);
    let mut segments = Vec::new();
    let mut cue: Option<(f64, f64, String)> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"text" => {
                let (start, dur) = cue_timing(e);
                // Some tracks omit `dur` on the final cue.
                cue = start.map(|start| (start, dur.unwrap_or(0.0), String::new()));
            }
            Ok(Event::Text(ref e)) => {
                if let Some((_, _, ref mut text)) = cue {
                    text.push_str(&String::from_utf8_lossy(e));
                }
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"text" => {
                if let Some((start, duration, raw)) = cue.take() {
                    let text = apply_entities(&raw, entities);
                    if !text.trim().is_empty() {
                        segments.push(Segment {
                            text,
                            start,
                            duration,
                        });
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => bail!("error parsing caption XML at byte {}: {e}", reader.buffer_position()),
            _ => {}
        }
    }

    debug!("Parsed {} caption segment(s)", segments.len());
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::render_batch_file;
    use serde_json::json;

    fn hindi_player() -> Value {
        json!({
            "videoDetails": { "videoId": "PnPc2xDwMvQ", "title": "Hindi lesson 1" },
            "captions": {
                "playerCaptionsTracklistRenderer": {
                    "captionTracks": [
                        {
                            "baseUrl": "https://www.youtube.com/api/timedtext?v=PnPc2xDwMvQ&lang=en",
                            "languageCode": "en",
                            "vssId": ".en"
                        },
                        {
                            "baseUrl": "https://www.youtube.com/api/timedtext?v=PnPc2xDwMvQ&kind=asr&lang=hi",
                            "languageCode": "hi",
                            "kind": "asr",
                            "vssId": "a.hi",
                            "name": { "runs": [{ "text": "Hindi (auto-generated)" }] }
                        }
                    ]
                }
            }
        })
    }

    #[test]
    fn test_hindi_generated_track_from_player() {
        let list = TranscriptList::from_player("PnPc2xDwMvQ", &hindi_player()).unwrap();
        assert_eq!(list.title, "Hindi lesson 1");
        assert_eq!(list.tracks.len(), 2);

        let hi = list.find_generated(&["hi"]).unwrap();
        assert!(hi.is_generated());
        assert!(hi.base_url.ends_with("kind=asr&lang=hi"));

        // English exists only as a manual track
        let err = list.find_generated(&["en"]).unwrap_err().to_string();
        assert!(err.contains("no generated transcript"));
        assert!(err.contains("hi (generated)"));
        assert_eq!(list.find(&["en", "hi"]).unwrap().language_code, "en");
        assert!(list.find_manual(&["hi"]).is_err());
    }

    #[test]
    fn test_player_without_captions() {
        let player = json!({ "videoDetails": { "title": "Silent" } });
        let err = TranscriptList::from_player("abcdefghijk", &player).unwrap_err();
        assert!(err.to_string().contains("no captions available"));

        let empty = json!({ "captions": { "playerCaptionsTracklistRenderer": { "captionTracks": [] } } });
        assert!(TranscriptList::from_player("abcdefghijk", &empty).is_err());
    }

    #[test]
    fn test_player_track_without_base_url() {
        let player = json!({
            "captions": { "playerCaptionsTracklistRenderer": { "captionTracks": [{ "languageCode": "hi" }] } }
        });
        let err = TranscriptList::from_player("abcdefghijk", &player).unwrap_err();
        assert!(format!("{err:#}").contains("malformed caption tracks"));
    }

    #[test]
    fn test_api_key_from_ytcfg() {
        let html = r#"<script>ytcfg.set({"INNERTUBE_API_KEY": "AIzaSyHindiKey", "INNERTUBE_CLIENT_NAME":"WEB"});</script>"#;
        assert_eq!(extract_api_key(html).unwrap(), "AIzaSyHindiKey");

        let legacy = r#"<script>var innertubeApiKey = "AIzaSyLegacy";</script>"#;
        assert_eq!(extract_api_key(legacy).unwrap(), "AIzaSyLegacy");

        assert!(extract_api_key("<html><body>consent wall</body></html>").is_err());
    }

    #[test]
    fn test_double_escaped_hindi_text() {
        let xml = r#"<?xml version="1.0" encoding="utf-8" ?><transcript><text start="0.4" dur="2.1">&amp;quot;नमस्ते&amp;quot; दोस्तों, it&amp;#39;s day one</text></transcript>"#;

        let decoded = parse_caption_xml(xml, EntityMode::Decode).unwrap();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].text, "\"नमस्ते\" दोस्तों, it's day one");
        assert!((decoded[0].start - 0.4).abs() < f64::EPSILON);
        assert!((decoded[0].duration - 2.1).abs() < f64::EPSILON);

        let raw = parse_caption_xml(xml, EntityMode::Raw).unwrap();
        assert_eq!(raw[0].text, "&amp;quot;नमस्ते&amp;quot; दोस्तों, it&amp;#39;s day one");
    }

    #[test]
    fn test_font_markup_stripped_in_batch_file() {
        let xml = r##"<transcript>
<text start="0" dur="1.5">&lt;font color=&quot;#E5E5E5&quot;&gt;namaste&lt;/font&gt; doston</text>
<text start="1.5" dur="2"><font color="#CCCCCC">aaj hum</font> seekhenge</text>
</transcript>"##;

        let segments = parse_caption_xml(xml, EntityMode::Decode).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, "<font color=\"#E5E5E5\">namaste</font> doston");
        assert_eq!(segments[1].text, "aaj hum seekhenge");
        assert_eq!(
            render_batch_file("Lesson", &segments),
            "Title: Lesson\n\nnamaste doston...aaj hum seekhenge..."
        );
    }

    #[test]
    fn test_empty_cue_then_indented_cues() {
        let xml = r#"<?xml version="1.0" encoding="utf-8" ?>
<transcript>
    <text start="0" dur="1"></text>
    <text start="1" dur="2">hello</text>
    <text start="3" dur="1">   </text>
</transcript>"#;

        let segments = parse_caption_xml(xml, EntityMode::Decode).unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "hello");
        assert!((segments[0].start - 1.0).abs() < f64::EPSILON);
        assert_eq!(render_batch_file("T", &segments), "Title: T\n\nhello...");
    }

    #[test]
    fn test_final_cue_without_dur() {
        let xml = r#"<transcript><text start="4.0">dhanyavaad</text></transcript>"#;
        let segments = parse_caption_xml(xml, EntityMode::Decode).unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].duration, 0.0);
    }

    #[test]
    fn test_mismatched_tags_error() {
        let xml = "<transcript><text start=\"0\" dur=\"1\">hi</para></transcript>";
        assert!(parse_caption_xml(xml, EntityMode::Decode).is_err());
    }
}
