use std::collections::BTreeMap;

use eyre::Result;
use serde::Serialize;

use crate::Segment;
use crate::extract::PageReport;
use crate::layout;
use crate::timedtext::{TimedText, join_text};

/// Render a transcript as plain text (all segments on one line, no timestamps)
pub fn render_text(texts: &[TimedText]) -> String {
    join_text(texts)
}

/// Render one `[start +duration] text` line per segment
pub fn render_timed(texts: &[TimedText]) -> String {
    texts
        .iter()
        .map(|t| format!("[{} +{}] {}", t.start, t.duration, t.text))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Human-readable summary of a scraped watch page
pub fn render_report(report: &PageReport, related_limit: usize) -> String {
    let meta = &report.metadata;
    let mut sections = vec![
        [
            format!("Title:      {}", meta.title),
            format!("Channel:    {}", meta.channel_name),
            format!("Published:  {}", meta.published_date),
            format!("Views:      {}", report.engagement.views),
            format!("Likes:      {}", report.engagement.likes),
        ]
        .join("\n"),
        meta.description.clone(),
    ];

    if !report.related.is_empty() {
        let mut related = String::from("Related videos:");
        for video in report.related.iter().take(related_limit) {
            related.push_str(&format!("\n  {} <{}>", video.title, video.link));
        }
        sections.push(related);
    }

    if let Some(ref token) = report.comment_token {
        sections.push(format!("Comments continuation token: {token}"));
    }

    sections.join("\n\n").trim_end().to_string()
}

/// One `code  url` line per available language
pub fn render_languages(languages: &BTreeMap<String, String>) -> String {
    languages
        .iter()
        .map(|(code, url)| format!("{code:<8} {url}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Remove inline markup such as `<font color="#E5E5E5">` from caption text
pub fn strip_tags(text: &str) -> String {
    layout::INLINE_TAG.replace_all(text, "").into_owned()
}

/// Saved transcript file: a title heading, then every segment followed by `...`
pub fn render_batch_file(title: &str, segments: &[Segment]) -> String {
    let mut out = format!("Title: {title}\n\n");
    for segment in segments {
        out.push_str(&strip_tags(&segment.text));
        out.push_str("...");
    }
    out
}
