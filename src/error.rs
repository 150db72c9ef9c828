use thiserror::Error;

/// Failure while fetching or scraping a YouTube resource
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("pattern not found: {what}")]
    MissingPattern { what: &'static str },

    #[error("malformed {what}: {reason}")]
    Malformed { what: &'static str, reason: String },

    #[error("not a recognizable YouTube video reference: {0}")]
    InvalidUrl(String),
}

impl ScrapeError {
    pub(crate) fn http(url: &str, source: reqwest::Error) -> Self {
        ScrapeError::Http {
            url: url.to_string(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ScrapeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_pattern_message() {
        let err = ScrapeError::MissingPattern { what: "caption tracks" };
        assert_eq!(err.to_string(), "pattern not found: caption tracks");
    }

    #[test]
    fn test_malformed_message() {
        let err = ScrapeError::Malformed {
            what: "caption tracks",
            reason: "EOF while parsing".to_string(),
        };
        assert_eq!(err.to_string(), "malformed caption tracks: EOF while parsing");
    }
}
