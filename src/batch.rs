//! Turn a table of `(title, url)` rows into one transcript file per video.
//!
//! A failing row is logged and recorded, then the next row runs; nothing short
//! of an unusable output directory stops the batch.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use calamine::{Reader, open_workbook_auto};
use eyre::{Result, WrapErr, bail, eyre};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};

use crate::VideoRef;
use crate::api::TranscriptProvider;
use crate::output::render_batch_file;

/// How a row's URL is turned into a video id
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdRule {
    /// Recognized YouTube URL shapes only; anything else fails the row
    #[default]
    Canonical,
    /// Text after the last `=`, whatever the URL looks like
    LastEquals,
}

impl IdRule {
    pub fn video_id(self, url: &str) -> Option<String> {
        match self {
            IdRule::Canonical => VideoRef::parse(url).map(|v| v.id().to_string()),
            IdRule::LastEquals => crate::last_equals_id(url),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BatchRow {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub out_dir: PathBuf,
    pub langs: Vec<String>,
    pub id_rule: IdRule,
}

#[derive(Debug)]
pub struct RowOutcome {
    pub title: String,
    pub result: std::result::Result<PathBuf, String>,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<RowOutcome>,
}

impl BatchReport {
    pub fn saved(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok().map(|p| (o.title.as_str(), p.as_path())))
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &str)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.title.as_str(), e.as_str())))
    }
}

/// Read batch rows from a CSV file or the first sheet of a spreadsheet.
///
/// Both need a header row naming `url` and `title` columns.
pub fn read_rows(path: &Path) -> Result<Vec<BatchRow>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let rows = match ext.as_str() {
        "csv" => read_csv(path),
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_sheet(path),
        _ => bail!("unsupported table format: {} (expected .csv, .xlsx, .xls or .ods)", path.display()),
    }
    .wrap_err_with(|| format!("reading {}", path.display()))?;

    debug!("Read {} row(s) from {}", rows.len(), path.display());
    Ok(rows)
}

fn read_csv(path: &Path) -> Result<Vec<BatchRow>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;
    let rows = reader.deserialize().collect::<std::result::Result<Vec<BatchRow>, _>>()?;
    Ok(rows)
}

fn read_sheet(path: &Path) -> Result<Vec<BatchRow>> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| eyre!("workbook has no sheets"))??;

    let mut rows = range.rows();
    let header = rows.next().ok_or_else(|| eyre!("sheet is empty"))?;
    let column = |name: &str| {
        header
            .iter()
            .position(|cell| cell.to_string().trim().eq_ignore_ascii_case(name))
            .ok_or_else(|| eyre!("missing column `{name}`"))
    };
    let url_col = column("url")?;
    let title_col = column("title")?;

    let cell = |row: &[calamine::Data], idx: usize| row.get(idx).map(|c| c.to_string().trim().to_string()).unwrap_or_default();

    Ok(rows
        .map(|row| BatchRow {
            title: cell(row, title_col),
            url: cell(row, url_col),
        })
        .filter(|row| !(row.title.is_empty() && row.url.is_empty()))
        .collect())
}

/// Fetch, render and save a transcript for every row.
pub async fn run_batch<P>(provider: &P, rows: &[BatchRow], opts: &BatchOptions) -> Result<BatchReport>
where
    P: TranscriptProvider + ?Sized,
{
    std::fs::create_dir_all(&opts.out_dir)
        .wrap_err_with(|| format!("creating output directory {}", opts.out_dir.display()))?;

    let mut report = BatchReport::default();
    let mut used_names = HashSet::new();

    for row in rows {
        let result = match fetch_row(provider, row, opts).await {
            Ok(body) => {
                let path = opts.out_dir.join(unique_file_name(&row.title, &mut used_names));
                std::fs::write(&path, body)
                    .wrap_err_with(|| format!("writing {}", path.display()))
                    .map(|_| path)
            }
            Err(e) => Err(e),
        };

        let result = match result {
            Ok(path) => {
                info!("Transcript for '{}' saved to: {}", row.title, path.display());
                Ok(path)
            }
            Err(e) => {
                error!("Error processing video '{}': {e:#}", row.title);
                Err(format!("{e:#}"))
            }
        };

        report.outcomes.push(RowOutcome {
            title: row.title.clone(),
            result,
        });
    }

    Ok(report)
}

async fn fetch_row<P>(provider: &P, row: &BatchRow, opts: &BatchOptions) -> Result<String>
where
    P: TranscriptProvider + ?Sized,
{
    let video_id = opts
        .id_rule
        .video_id(&row.url)
        .ok_or_else(|| eyre!("could not derive a video id from {:?}", row.url))?;
    debug!("Row '{}': video id {video_id}", row.title);

    let transcript = provider.generated_transcript(&video_id, &opts.langs).await?;
    if !transcript.generated {
        bail!(
            "provider returned a manually created '{}' track for {video_id}",
            transcript.language
        );
    }
    info!(
        "Row '{}': '{}' ({}), {} segment(s)",
        row.title,
        transcript.title,
        transcript.language,
        transcript.segments.len()
    );
    if transcript.segments.is_empty() {
        warn!("Transcript for '{}' has no segments", row.title);
    }
    Ok(render_batch_file(&row.title, &transcript.segments))
}

/// `<title>.txt`, made safe for the filesystem and unique within this batch.
fn unique_file_name(title: &str, used: &mut HashSet<String>) -> String {
    let stem = sanitize_file_stem(title);
    let mut name = format!("{stem}.txt");
    let mut n = 2;
    while used.contains(&name) {
        name = format!("{stem} ({n}).txt");
        n += 1;
    }
    if n > 2 {
        warn!("Duplicate title '{title}', saving as {name}");
    }
    used.insert(name.clone());
    name
}

fn sanitize_file_stem(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim().trim_end_matches('.').trim_end();
    if cleaned.is_empty() {
        "untitled".to_string()
    } else {
        cleaned.to_string()
    }
}
