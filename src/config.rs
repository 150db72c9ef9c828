use std::path::PathBuf;

use eyre::Result;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::batch::IdRule;

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Caption language for `transcript` when `--lang` is not given
    pub default_lang: Option<String>,
    /// Generated-caption language for `batch`
    pub batch_lang: Option<String>,
    /// Directory `batch` writes transcript files into
    pub output_dir: Option<PathBuf>,
    /// How many related videos `info` prints
    pub related_limit: Option<usize>,
    /// Keep caption entities undecoded
    pub raw_entities: Option<bool>,
    /// Video id rule for batch rows
    pub id_rule: Option<IdRule>,
    pub user_agent: Option<String>,
}

pub const DEFAULT_LANG: &str = "en";
pub const DEFAULT_BATCH_LANG: &str = "hi";
pub const DEFAULT_OUTPUT_DIR: &str = "transcripts";
pub const DEFAULT_RELATED_LIMIT: usize = 10;

impl Config {
    /// Load config from ~/.config/ytscrape/config.toml if it exists
    pub fn load() -> Result<Self> {
        let path = config_path();
        if path.exists() {
            debug!("Loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            debug!("No config file found at {}", path.display());
            Ok(Config::default())
        }
    }

    pub fn lang(&self) -> &str {
        self.default_lang.as_deref().unwrap_or(DEFAULT_LANG)
    }

    pub fn batch_lang(&self) -> &str {
        self.batch_lang.as_deref().unwrap_or(DEFAULT_BATCH_LANG)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))
    }

    pub fn related_limit(&self) -> usize {
        self.related_limit.unwrap_or(DEFAULT_RELATED_LIMIT)
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("ytscrape")
        .join("config.toml")
}
