//! Caption track discovery and subtitle document retrieval for the watch page flow.

use std::collections::BTreeMap;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::VideoRef;
use crate::error::{Result, ScrapeError};
use crate::fetch::fetch_page;
use crate::layout;

/// One entry of the page's embedded `captionTracks` array
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTrack {
    pub language_code: String,
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vss_id: Option<String>,
}

impl CaptionTrack {
    /// Automatically generated (speech recognition) captions
    pub fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some(layout::GENERATED_KIND)
    }
}

/// Decode the caption track array embedded in a watch page.
///
/// Only the first `"captionTracks":[` occurrence is considered. The array is
/// decoded up to its matching `]`, so nested arrays inside a track are fine.
pub fn list_tracks(html: &str) -> Result<Vec<CaptionTrack>> {
    let found = layout::CAPTION_TRACKS
        .find(html)
        .ok_or(ScrapeError::MissingPattern { what: "caption tracks" })?;

    // The match ends just past the opening bracket.
    let array = &html[found.end() - 1..];
    let mut de = serde_json::Deserializer::from_str(array);
    let tracks = Vec::<CaptionTrack>::deserialize(&mut de).map_err(|e| ScrapeError::Malformed {
        what: "caption tracks",
        reason: e.to_string(),
    })?;

    debug!("Found {} caption track(s)", tracks.len());
    Ok(tracks)
}

/// Language code to subtitle URL. A repeated code keeps the later track.
pub fn language_map(tracks: &[CaptionTrack]) -> BTreeMap<String, String> {
    tracks
        .iter()
        .map(|t| (t.language_code.clone(), t.base_url.clone()))
        .collect()
}

/// Fetch the watch page for `video` and list its caption tracks.
pub async fn fetch_tracks(client: &reqwest::Client, video: &VideoRef) -> Result<Vec<CaptionTrack>> {
    let page = fetch_page(client, &video.watch_url()).await?;
    list_tracks(&page)
}

/// Replace every escaped ampersand so the query string survives the request.
pub fn unescape_track_url(url: &str) -> String {
    url.replace(layout::ESCAPED_AMPERSAND, "&")
}

/// Download the subtitle document behind a track URL taken verbatim from page text.
pub async fn fetch_track(client: &reqwest::Client, base_url: &str) -> Result<String> {
    let url = unescape_track_url(base_url);
    let xml = fetch_page(client, &url).await?;
    if !looks_like_transcript(&xml) {
        warn!("Subtitle document from {url} has no transcript root");
    }
    Ok(xml)
}

/// Whether a subtitle response is a timed-text transcript document at all.
pub fn looks_like_transcript(xml: &str) -> bool {
    xml.contains(layout::TRANSCRIPT_ROOT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::test_server::serve_once;

    #[test]
    fn test_list_tracks_basic() {
        let html = r#"var p = {"captions":{"playerCaptionsTracklistRenderer":{"captionTracks":[{"languageCode":"en","baseUrl":"U1"},{"languageCode":"hi","baseUrl":"U2"}],"audioTracks":[]}}};"#;
        let tracks = list_tracks(html).unwrap();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].language_code, "en");
        assert_eq!(tracks[1].base_url, "U2");
    }

    #[test]
    fn test_language_map() {
        let html = r#""captionTracks":[{"languageCode":"en","baseUrl":"U1"},{"languageCode":"hi","baseUrl":"U2"}]"#;
        let map = language_map(&list_tracks(html).unwrap());
        let expected: BTreeMap<String, String> = [("en", "U1"), ("hi", "U2")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(map, expected);
    }

    #[test]
    fn test_language_map_last_write_wins() {
        let html = r#""captionTracks":[{"languageCode":"en","baseUrl":"U1"},{"languageCode":"en","baseUrl":"U3","kind":"asr"}]"#;
        let map = language_map(&list_tracks(html).unwrap());
        assert_eq!(map.len(), 1);
        assert_eq!(map["en"], "U3");
    }

    #[test]
    fn test_list_tracks_nested_arrays() {
        let html = r#""captionTracks":[{"baseUrl":"U1","name":{"runs":[{"text":"English"}]},"languageCode":"en","kind":"asr","vssId":"a.en"}],"#;
        let tracks = list_tracks(html).unwrap();
        assert_eq!(tracks.len(), 1);
        assert!(tracks[0].is_generated());
        assert_eq!(tracks[0].vss_id.as_deref(), Some("a.en"));
    }

    #[test]
    fn test_list_tracks_missing_marker() {
        let err = list_tracks("<html>no captions here</html>").unwrap_err();
        assert!(matches!(err, ScrapeError::MissingPattern { .. }));
    }

    #[test]
    fn test_list_tracks_malformed_json() {
        let err = list_tracks(r#""captionTracks":[{"languageCode":"en""#).unwrap_err();
        assert!(matches!(err, ScrapeError::Malformed { .. }));
    }

    #[test]
    fn test_list_tracks_missing_required_field() {
        let err = list_tracks(r#""captionTracks":[{"languageCode":"en"}]"#).unwrap_err();
        assert!(matches!(err, ScrapeError::Malformed { .. }));
    }

    #[test]
    fn test_unescape_track_url() {
        let raw = r"https://www.youtube.com/api/timedtext?v=abc\u0026lang=en\u0026fmt=srv1";
        let url = unescape_track_url(raw);
        assert_eq!(url, "https://www.youtube.com/api/timedtext?v=abc&lang=en&fmt=srv1");

        let parsed = url::Url::parse(&url).unwrap();
        let pairs: Vec<(String, String)> = parsed.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())).collect();
        assert_eq!(
            pairs,
            vec![
                ("v".to_string(), "abc".to_string()),
                ("lang".to_string(), "en".to_string()),
                ("fmt".to_string(), "srv1".to_string()),
            ]
        );
    }

    #[test]
    fn test_escaped_url_truncates_query() {
        let raw = r"https://www.youtube.com/api/timedtext?v=abc\u0026lang=en";
        let parsed = url::Url::parse(raw).unwrap();
        assert!(parsed.query_pairs().all(|(k, _)| k != "lang"));
    }

    #[test]
    fn test_looks_like_transcript() {
        assert!(looks_like_transcript(r#"<?xml version="1.0"?><transcript></transcript>"#));
        assert!(!looks_like_transcript(""));
        assert!(!looks_like_transcript("<html>error</html>"));
    }

    #[tokio::test]
    async fn test_fetch_track_requests_unescaped_query() {
        let (base, request) = serve_once("200 OK", "<transcript></transcript>").await;
        let client = crate::fetch::client(None).unwrap();

        let base_url = format!(r"{base}/api/timedtext?v=PnPc2xDwMvQ\u0026lang=hi\u0026kind=asr");
        let xml = fetch_track(&client, &base_url).await.unwrap();

        assert!(looks_like_transcript(&xml));
        assert_eq!(
            request.await.unwrap(),
            "GET /api/timedtext?v=PnPc2xDwMvQ&lang=hi&kind=asr HTTP/1.1"
        );
    }
}
