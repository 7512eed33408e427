use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid agent URL \"{url}\": {reason}")]
    InvalidAgentUrl { url: String, reason: String },

    #[error("could not read snapshot {}: {source}", path.display())]
    SnapshotIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot {} contains no ads document", path.display())]
    SnapshotEmpty { path: PathBuf },

    #[error("could not parse CSV snapshot {}: {source}", path.display())]
    SnapshotCsv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl ScraperError {
    /// Whether another attempt against the same source could succeed.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        match self {
            ScraperError::Http(e) => {
                e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
            }
            ScraperError::UnexpectedStatus { status, .. } => {
                *status == 429 || (500..600).contains(status)
            }
            // Agent runs occasionally end with a truncated body.
            ScraperError::Deserialize { .. } => true,
            ScraperError::InvalidAgentUrl { .. }
            | ScraperError::SnapshotIo { .. }
            | ScraperError::SnapshotEmpty { .. }
            | ScraperError::SnapshotCsv { .. } => false,
        }
    }
}

impl From<ScraperError> for adscope_core::OracleError {
    fn from(err: ScraperError) -> Self {
        adscope_core::OracleError {
            retriable: err.is_retriable(),
            detail: err.to_string(),
        }
    }
}
