use std::path::{Path, PathBuf};

use adscope_core::{OracleError, RawAdRecord, ScrapeOracle, ScrapeRequest};
use async_trait::async_trait;

use crate::csv_rows::csv_ads;
use crate::error::ScraperError;
use crate::parse::{ads_document, normalize_ads};

/// Replays a saved extraction instead of running the browser agent.
///
/// A `.csv` file is read as one ad per row (see [`csv_ads`]). Anything else
/// holds the same JSON the agent returns (`{"brand": …, "ads": […]}`),
/// optionally wrapped in surrounding text. The request's brand and region are
/// ignored; `max_items` still applies.
#[derive(Debug, Clone)]
pub struct SnapshotSource {
    path: PathBuf,
}

impl SnapshotSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn is_csv(&self) -> bool {
        self.path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
    }

    /// Reads and normalizes the snapshot.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::SnapshotIo`] if the file cannot be read.
    /// - [`ScraperError::SnapshotEmpty`] if a JSON snapshot holds no `ads`
    ///   array.
    /// - [`ScraperError::SnapshotCsv`] if a CSV snapshot is malformed.
    pub async fn load(&self, max_items: usize) -> Result<Vec<RawAdRecord>, ScraperError> {
        let contents =
            tokio::fs::read_to_string(&self.path)
                .await
                .map_err(|source| ScraperError::SnapshotIo {
                    path: self.path.clone(),
                    source,
                })?;

        if self.is_csv() {
            return csv_ads(&contents, max_items).map_err(|source| ScraperError::SnapshotCsv {
                path: self.path.clone(),
                source,
            });
        }

        let ads = ads_document(&contents).ok_or_else(|| ScraperError::SnapshotEmpty {
            path: self.path.clone(),
        })?;

        Ok(normalize_ads(&ads, max_items))
    }
}

#[async_trait]
impl ScrapeOracle for SnapshotSource {
    async fn scrape(&self, request: &ScrapeRequest) -> Result<Vec<RawAdRecord>, OracleError> {
        let records = self.load(request.max_items).await?;
        tracing::info!(
            path = %self.path.display(),
            count = records.len(),
            "replayed extraction snapshot"
        );
        Ok(records)
    }
}
