//! Everything that depends on the current structure of YouTube's pages.
//!
//! YouTube does not document its watch page or its caption documents, so every
//! marker, CSS selector and regular expression the scrapers rely on lives here.
//! When the page format changes, this is the module to touch.

use std::sync::LazyLock;

use regex::Regex;
use scraper::Selector;

pub const SITE_ORIGIN: &str = "https://www.youtube.com";

pub const WATCH_URL_PREFIX: &str = "https://www.youtube.com/watch?v=";

pub const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

pub(crate) static BARE_VIDEO_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]{11}$").unwrap());

pub(crate) static VIDEO_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap());

// Watch page: <head> meta tags

pub(crate) static META_TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[property="og:title"]"#).unwrap());

pub(crate) static META_DESCRIPTION: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[property="og:description"]"#).unwrap());

pub(crate) static META_PUBLISHED: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[itemprop="datePublished"]"#).unwrap());

pub(crate) static META_AUTHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[itemprop="author"]"#).unwrap());

pub(crate) const META_CONTENT_ATTR: &str = "content";

// Watch page: inline scripts

pub(crate) static SCRIPT: LazyLock<Selector> = LazyLock::new(|| Selector::parse("script").unwrap());

pub(crate) const VIEW_COUNT_MARKER: &str = "viewCount";

pub(crate) static ENGAGEMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""viewCount":"(\d+)","likeCount":"(\d+)""#).unwrap());

pub(crate) const CONTINUATION_MARKER: &str = "continuation";

pub(crate) static CONTINUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""continuation":"([^"]+)""#).unwrap());

/// Start of the embedded caption track array, up to and including the `[`
pub(crate) static CAPTION_TRACKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""captionTracks"\s*:\s*\["#).unwrap());

pub(crate) static INNERTUBE_API_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""INNERTUBE_API_KEY"\s*:\s*"([^"]+)""#).unwrap());

pub(crate) static INNERTUBE_API_KEY_LEGACY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"innertubeApiKey\s*[=:]\s*"([^"]+)""#).unwrap());

// Watch page: related video thumbnails

pub(crate) static RELATED_ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a#thumbnail").unwrap());

// Caption tracks

/// `&` escaped as `\u0026`, as it appears inside URLs embedded in page script text
pub const ESCAPED_AMPERSAND: &str = r"\u0026";

/// Track `kind` of automatically generated captions
pub(crate) const GENERATED_KIND: &str = "asr";

// Timed-text caption documents

pub(crate) const TRANSCRIPT_ROOT: &str = "<transcript>";

pub(crate) static TIMED_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<text start="(.*?)" dur="(.*?)">(.*?)</text>"#).unwrap());

pub(crate) static INLINE_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

// InnerTube player endpoint

pub(crate) const PLAYER_ENDPOINT: &str = "https://www.youtube.com/youtubei/v1/player";

pub(crate) const CLIENT_NAME: &str = "WEB";

pub(crate) const CLIENT_VERSION: &str = "2.20241126.01.00";
