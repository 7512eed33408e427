//! Pipeline coordination: extraction → dedup → analysis → aggregation.
//!
//! Only the coordinator short-circuits a run. Extraction failures end the run
//! with a [`PipelineFailure`]; per-item analysis failures are embedded in the
//! report; aggregation cannot fail. Cancellation drops the in-flight stage and
//! discards anything it had produced so far.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use adscope_core::{AppConfig, JudgmentOracle, ScrapeOracle, ScrapeRequest};
use chrono::{DateTime, Utc};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::aggregate::{summarize, InsightSummary};
use crate::analyze::{analyze_all, AnalyzedCreative};
use crate::delay::{Delay, TokioDelay};
use crate::extract::{extract, ExtractionPolicy};
use crate::fingerprint::deduplicate;

/// Detail carried by a failure caused by cancellation or timeout.
pub const CANCELLED: &str = "cancelled";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Extraction,
    Analysis,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Extraction => write!(f, "extraction"),
            Stage::Analysis => write!(f, "analysis"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{stage} failed: {detail}")]
pub struct PipelineFailure {
    pub stage: Stage,
    pub detail: String,
}

impl PipelineFailure {
    #[must_use]
    pub fn cancelled(stage: Stage) -> Self {
        Self {
            stage,
            detail: CANCELLED.to_string(),
        }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.detail == CANCELLED
    }
}

/// Report-ready output of a successful run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineReport {
    pub brand: String,
    pub region: String,
    pub generated_at: DateTime<Utc>,
    /// Records returned by extraction, before deduplication.
    pub raw_record_count: usize,
    pub analyzed: Vec<AnalyzedCreative>,
    pub summary: InsightSummary,
}

pub type PipelineResult = Result<PipelineReport, PipelineFailure>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    pub extraction: ExtractionPolicy,
    /// Maximum judgment calls in flight at once.
    pub analysis_concurrency: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            extraction: ExtractionPolicy::default(),
            analysis_concurrency: 3,
        }
    }
}

impl PipelineSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            extraction: ExtractionPolicy {
                max_attempts: config.extract_max_attempts,
                retry_delay: Duration::from_secs(config.extract_retry_delay_secs),
            },
            analysis_concurrency: config.analysis_concurrency,
        }
    }
}

/// Runs brand analyses against a pair of oracles.
///
/// Holds no per-run state; one instance can serve concurrent runs.
#[derive(Clone)]
pub struct Pipeline {
    scraper: Arc<dyn ScrapeOracle>,
    judge: Arc<dyn JudgmentOracle>,
    delay: Arc<dyn Delay>,
    settings: PipelineSettings,
}

impl Pipeline {
    #[must_use]
    pub fn new(
        scraper: Arc<dyn ScrapeOracle>,
        judge: Arc<dyn JudgmentOracle>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            scraper,
            judge,
            delay: Arc::new(TokioDelay),
            settings,
        }
    }

    /// Replaces the inter-attempt delay source.
    #[must_use]
    pub fn with_delay(mut self, delay: Arc<dyn Delay>) -> Self {
        self.delay = delay;
        self
    }

    #[must_use]
    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Runs one analysis to completion.
    ///
    /// # Errors
    ///
    /// Returns a [`PipelineFailure`] for the extraction stage when no usable
    /// records could be obtained.
    pub async fn run(&self, brand: &str, region: &str, max_items: usize) -> PipelineResult {
        self.run_until(brand, region, max_items, std::future::pending())
            .await
    }

    /// Runs one analysis, giving up once `timeout` has elapsed.
    ///
    /// # Errors
    ///
    /// As [`Pipeline::run`], plus a `"cancelled"` failure for whichever stage
    /// was in flight when the timeout fired.
    pub async fn run_with_timeout(
        &self,
        brand: &str,
        region: &str,
        max_items: usize,
        timeout: Duration,
    ) -> PipelineResult {
        self.run_until(brand, region, max_items, tokio::time::sleep(timeout))
            .await
    }

    /// Runs one analysis until it finishes or `cancel` resolves.
    ///
    /// # Errors
    ///
    /// As [`Pipeline::run`], plus a `"cancelled"` failure for whichever stage
    /// was in flight when `cancel` resolved. Partial analysis results are
    /// discarded on cancellation.
    pub async fn run_until<C>(
        &self,
        brand: &str,
        region: &str,
        max_items: usize,
        cancel: C,
    ) -> PipelineResult
    where
        C: Future<Output = ()>,
    {
        tokio::pin!(cancel);

        let brand = brand.trim();
        if brand.is_empty() {
            return Err(PipelineFailure {
                stage: Stage::Extraction,
                detail: "brand must not be empty".to_string(),
            });
        }
        let region = match region.trim() {
            "" => "ALL".to_string(),
            r => r.to_uppercase(),
        };

        let request = ScrapeRequest {
            brand: brand.to_string(),
            region: region.clone(),
            max_items: max_items.max(1),
        };

        tracing::info!(brand, region = %region, max_items = request.max_items, "starting pipeline run");

        // Stage futures are boxed so the run stays `Send` for `tokio::spawn`.
        let extraction = extract(
            &*self.scraper,
            &*self.delay,
            &self.settings.extraction,
            &request,
        )
        .boxed();
        let records = tokio::select! {
            biased;
            () = &mut cancel => {
                tracing::warn!(brand, "run cancelled during extraction");
                return Err(PipelineFailure::cancelled(Stage::Extraction));
            }
            result = extraction => result.map_err(|e| PipelineFailure {
                stage: Stage::Extraction,
                detail: e.to_string(),
            })?,
        };

        let unique = deduplicate(&records);

        let analysis = analyze_all(
            &*self.judge,
            brand,
            &region,
            &unique,
            self.settings.analysis_concurrency,
        )
        .boxed();
        let analyzed = tokio::select! {
            biased;
            () = &mut cancel => {
                tracing::warn!(brand, "run cancelled during analysis");
                return Err(PipelineFailure::cancelled(Stage::Analysis));
            }
            analyzed = analysis => analyzed,
        };

        let summary = summarize(brand, &analyzed);

        tracing::info!(
            brand,
            records = records.len(),
            creatives = analyzed.len(),
            average_score = summary.average_score,
            "pipeline run complete"
        );

        Ok(PipelineReport {
            brand: brand.to_string(),
            region,
            generated_at: Utc::now(),
            raw_record_count: records.len(),
            analyzed,
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_display_names_stage() {
        let failure = PipelineFailure {
            stage: Stage::Extraction,
            detail: "no ads found after 3 attempt(s)".to_string(),
        };
        assert_eq!(
            failure.to_string(),
            "extraction failed: no ads found after 3 attempt(s)"
        );
        assert!(!failure.is_cancelled());
        assert!(PipelineFailure::cancelled(Stage::Analysis).is_cancelled());
    }

    #[test]
    fn failure_serializes_stage_lowercase() {
        let json = serde_json::to_value(PipelineFailure::cancelled(Stage::Analysis))
            .expect("serialize");
        assert_eq!(json["stage"], "analysis");
        assert_eq!(json["detail"], "cancelled");
    }
}
