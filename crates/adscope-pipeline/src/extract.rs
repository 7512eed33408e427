//! Bounded-attempt driver for the scraping oracle.
//!
//! The oracle is a single stateful browser session that fails often (rate
//! limiting, DOM load races). An attempt is retried when it errors
//! transiently or returns zero records; the first attempt with at least one
//! record wins, partial or not. Attempts run strictly one after another with
//! a fixed settle delay in between.

use std::time::Duration;

use adscope_core::{RawAdRecord, ScrapeOracle, ScrapeRequest};
use thiserror::Error;

use crate::delay::Delay;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionPolicy {
    /// Total attempts, including the first. Values below 1 are treated as 1.
    pub max_attempts: u32,
    /// Wait between two consecutive attempts.
    pub retry_delay: Duration,
}

impl Default for ExtractionPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("no ads found after {attempts} attempt(s){}", last_error_suffix(.last_error))]
    NoResults {
        attempts: u32,
        last_error: Option<String>,
    },

    #[error("scraping oracle failed: {detail}")]
    Oracle { detail: String },
}

fn last_error_suffix(last_error: &Option<String>) -> String {
    match last_error {
        Some(detail) => format!(" (last error: {detail})"),
        None => String::new(),
    }
}

/// Runs the scraping oracle under `policy`.
///
/// Returns at most `request.max_items` records, and never an empty list; a
/// `max_items` of zero is treated as 1.
///
/// # Errors
///
/// - [`ExtractionError::Oracle`] as soon as the oracle reports a
///   non-retriable failure.
/// - [`ExtractionError::NoResults`] once every attempt has failed or come
///   back empty.
pub async fn extract<O, D>(
    oracle: &O,
    delay: &D,
    policy: &ExtractionPolicy,
    request: &ScrapeRequest,
) -> Result<Vec<RawAdRecord>, ExtractionError>
where
    O: ScrapeOracle + ?Sized,
    D: Delay + ?Sized,
{
    let max_attempts = policy.max_attempts.max(1);
    let max_items = request.max_items.max(1);
    let mut last_error = None;

    for attempt in 1..=max_attempts {
        match oracle.scrape(request).await {
            Ok(mut records) if !records.is_empty() => {
                if records.len() > max_items {
                    records.truncate(max_items);
                }
                tracing::info!(
                    brand = %request.brand,
                    region = %request.region,
                    attempt,
                    count = records.len(),
                    "extracted ad records"
                );
                return Ok(records);
            }
            Ok(_) => {
                tracing::warn!(
                    brand = %request.brand,
                    attempt,
                    max_attempts,
                    "scraping oracle returned no records"
                );
                last_error = None;
            }
            Err(err) if !err.retriable => {
                tracing::error!(
                    brand = %request.brand,
                    attempt,
                    error = %err,
                    "scraping oracle failed with a non-retriable error"
                );
                return Err(ExtractionError::Oracle { detail: err.detail });
            }
            Err(err) => {
                tracing::warn!(
                    brand = %request.brand,
                    attempt,
                    max_attempts,
                    error = %err,
                    "scraping attempt failed"
                );
                last_error = Some(err.detail);
            }
        }

        if attempt < max_attempts {
            delay.sleep(policy.retry_delay).await;
        }
    }

    Err(ExtractionError::NoResults {
        attempts: max_attempts,
        last_error,
    })
}
