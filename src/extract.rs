//! Best-effort extraction of watch-page details.
//!
//! None of these functions fail. A missing tag, script or pattern turns into the
//! field's default so one absent value never hides the others.

use log::{debug, warn};
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

use crate::layout;

pub const NO_TITLE: &str = "No title found";
pub const NO_DESCRIPTION: &str = "No description found";
pub const NO_PUBLISH_DATE: &str = "No publish date found";
pub const NO_CHANNEL_NAME: &str = "No channel name found";
pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoMetadata {
    pub title: String,
    pub description: String,
    pub published_date: String,
    pub channel_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngagementMetrics {
    pub views: String,
    pub likes: String,
}

impl Default for EngagementMetrics {
    fn default() -> Self {
        Self {
            views: NOT_AVAILABLE.to_string(),
            likes: NOT_AVAILABLE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelatedVideo {
    pub title: String,
    pub link: String,
}

/// Everything scraped from a single watch page
#[derive(Debug, Clone, Serialize)]
pub struct PageReport {
    pub metadata: VideoMetadata,
    pub engagement: EngagementMetrics,
    pub related: Vec<RelatedVideo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_token: Option<String>,
}

/// Run every extractor over the same page text.
pub fn inspect_page(html: &str) -> PageReport {
    PageReport {
        metadata: extract_metadata(html),
        engagement: extract_engagement(html),
        related: extract_related(html),
        comment_token: extract_comment_token(html),
    }
}

pub fn extract_metadata(html: &str) -> VideoMetadata {
    let doc = Html::parse_document(html);
    let meta = VideoMetadata {
        title: meta_content(&doc, &layout::META_TITLE).unwrap_or_else(|| NO_TITLE.to_string()),
        description: meta_content(&doc, &layout::META_DESCRIPTION).unwrap_or_else(|| NO_DESCRIPTION.to_string()),
        published_date: meta_content(&doc, &layout::META_PUBLISHED).unwrap_or_else(|| NO_PUBLISH_DATE.to_string()),
        channel_name: meta_content(&doc, &layout::META_AUTHOR).unwrap_or_else(|| NO_CHANNEL_NAME.to_string()),
    };
    debug!("Metadata: {meta:?}");
    meta
}

fn meta_content(doc: &Html, selector: &Selector) -> Option<String> {
    doc.select(selector)
        .next()
        .and_then(|tag| tag.value().attr(layout::META_CONTENT_ATTR))
        .map(str::to_string)
}

/// View and like counters from the first inline script that carries them.
pub fn extract_engagement(html: &str) -> EngagementMetrics {
    let doc = Html::parse_document(html);
    for script in doc.select(&layout::SCRIPT) {
        let body = script_text(script);
        if !body.contains(layout::VIEW_COUNT_MARKER) {
            continue;
        }
        if let Some(caps) = layout::ENGAGEMENT.captures(&body) {
            return EngagementMetrics {
                views: caps[1].to_string(),
                likes: caps[2].to_string(),
            };
        }
    }
    warn!("No engagement counters found in page");
    EngagementMetrics::default()
}

pub fn extract_related(html: &str) -> Vec<RelatedVideo> {
    let doc = Html::parse_document(html);
    doc.select(&layout::RELATED_ANCHOR)
        .filter_map(|anchor| {
            let el = anchor.value();
            let title = el.attr("title")?;
            let href = el.attr("href")?;
            Some(RelatedVideo {
                title: title.to_string(),
                link: format!("{}{href}", layout::SITE_ORIGIN),
            })
        })
        .collect()
}

/// Continuation token for the comment section, if the page embeds one.
///
/// Comments themselves are loaded by a separate API call; this only reports
/// the token that call would start from.
pub fn extract_comment_token(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    doc.select(&layout::SCRIPT)
        .map(script_text)
        .filter(|body| body.contains(layout::CONTINUATION_MARKER))
        .find_map(|body| layout::CONTINUATION.captures(&body).map(|caps| caps[1].to_string()))
}

fn script_text(script: ElementRef<'_>) -> String {
    script.text().collect()
}
