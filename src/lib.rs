pub mod api;
pub mod batch;
pub mod captions;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod layout;
pub mod output;
pub mod timedtext;

use serde::Serialize;
use url::Url;

pub use error::{Result, ScrapeError};

/// A single captioned segment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

/// Complete transcript for a video
#[derive(Debug, Clone, Serialize)]
pub struct Transcript {
    pub video_id: String,
    pub title: String,
    pub language: String,
    pub generated: bool,
    pub segments: Vec<Segment>,
}

/// A validated YouTube video id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct VideoRef(String);

impl VideoRef {
    /// Recognize a video id in any of the usual YouTube URL shapes or as a bare id.
    ///
    /// Returns `None` rather than guessing when the input has no recognizable id.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();

        if layout::BARE_VIDEO_ID.is_match(input) {
            return Some(VideoRef(input.to_string()));
        }

        let url = Url::parse(input)
            .or_else(|_| Url::parse(&format!("https://{input}")))
            .ok()?;
        let host = url.host_str()?;
        let host = host
            .strip_prefix("www.")
            .or_else(|| host.strip_prefix("m."))
            .unwrap_or(host);

        let id = match host {
            "youtube.com" | "music.youtube.com" => {
                let mut segments = url.path_segments()?;
                match segments.next()? {
                    "watch" => url
                        .query_pairs()
                        .find(|(k, _)| k == "v")
                        .map(|(_, v)| v.into_owned()),
                    "embed" | "shorts" | "live" | "v" => segments.next().map(str::to_string),
                    _ => None,
                }
            }
            "youtu.be" => url.path_segments()?.next().map(str::to_string),
            _ => None,
        }?;

        layout::VIDEO_ID.is_match(&id).then_some(VideoRef(id))
    }

    pub fn id(&self) -> &str {
        &self.0
    }

    pub fn watch_url(&self) -> String {
        format!("{}{}", layout::WATCH_URL_PREFIX, self.0)
    }
}

impl std::fmt::Display for VideoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything after the last `=` in `url`.
///
/// Only correct when the id is the final query value; `watch?v=ID&t=10` yields `10`.
/// Kept for spreadsheets prepared against that rule.
pub fn last_equals_id(url: &str) -> Option<String> {
    url.trim()
        .rsplit_once('=')
        .map(|(_, id)| id)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}
