//! Contracts with the external, unreliable services the pipeline drives.
//!
//! Both oracles are opaque: the scraping oracle turns a brand/region query
//! into raw ad records, the judgment oracle turns a rendered prompt into free
//! text. Neither is assumed to be deterministic.

use async_trait::async_trait;
use thiserror::Error;

use crate::ads::RawAdRecord;

/// Failure reported by an oracle for a single call.
///
/// `retriable` tells the caller whether another attempt could plausibly
/// succeed (rate limiting, load races, timeouts) or not (bad credentials,
/// misconfiguration).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{detail}")]
pub struct OracleError {
    pub detail: String,
    pub retriable: bool,
}

impl OracleError {
    #[must_use]
    pub fn transient(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
            retriable: true,
        }
    }

    #[must_use]
    pub fn fatal(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
            retriable: false,
        }
    }
}

/// One extraction query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeRequest {
    pub brand: String,
    /// Country code understood by the ad library, or `ALL`.
    pub region: String,
    pub max_items: usize,
}

#[async_trait]
pub trait ScrapeOracle: Send + Sync {
    /// Performs a single extraction attempt. An empty `Vec` is a valid
    /// (if disappointing) answer.
    async fn scrape(&self, request: &ScrapeRequest) -> Result<Vec<RawAdRecord>, OracleError>;
}

#[async_trait]
pub trait JudgmentOracle: Send + Sync {
    /// Sends one prompt and returns the model's raw text.
    async fn judge(&self, prompt: &str) -> Result<String, OracleError>;
}
