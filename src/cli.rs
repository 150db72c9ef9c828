use clap::{Parser, Subcommand};
use std::path::PathBuf;

use ytscrape::batch::IdRule;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Timed,
    Json,
}

/// Command-line spelling of the batch video-id rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum IdRuleArg {
    /// Recognized YouTube URL shapes only
    Canonical,
    /// Text after the last `=`
    LastEquals,
}

impl From<IdRuleArg> for IdRule {
    fn from(arg: IdRuleArg) -> Self {
        match arg {
            IdRuleArg::Canonical => IdRule::Canonical,
            IdRuleArg::LastEquals => IdRule::LastEquals,
        }
    }
}

#[derive(Parser)]
#[command(name = "ytscrape", about = "YouTube page scraper and transcript extractor", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Echo progress to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show metadata, engagement counters and related videos from a watch page
    Info {
        /// YouTube video URL or video ID
        url: String,

        /// Number of related videos to show
        #[arg(short, long)]
        related: Option<usize>,

        /// Also report the comment continuation token
        #[arg(long)]
        comments: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the caption languages a video offers
    Langs {
        /// YouTube video URL or video ID
        url: String,
    },

    /// Fetch and print the captions for one language
    Transcript {
        /// YouTube video URL or video ID
        url: String,

        /// Caption language code
        #[arg(short, long)]
        lang: Option<String>,

        /// Output format: text (default), timed, json
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Write output to file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Leave HTML entities in caption text undecoded
        #[arg(long)]
        raw_entities: bool,

        /// Fetch the generated (speech recognition) track through the caption API
        #[arg(long, conflicts_with = "api")]
        generated: bool,

        /// Fetch through the caption API, preferring a manually created track
        #[arg(long)]
        api: bool,
    },

    /// Save generated transcripts for every row of a CSV or spreadsheet
    Batch {
        /// Table with `title` and `url` columns (.csv, .xlsx, .xls, .ods)
        table: PathBuf,

        /// Directory for transcript files
        #[arg(short = 'd', long)]
        out_dir: Option<PathBuf>,

        /// Generated-caption language
        #[arg(short, long)]
        lang: Option<String>,

        /// How video ids are read from row URLs
        #[arg(long, value_enum)]
        id_rule: Option<IdRuleArg>,
    },
}
