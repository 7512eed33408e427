//! Brand ad-creative insight pipeline.
//!
//! Turns raw scraped ad records into deduplicated, analysed and aggregated
//! insight data:
//!
//! 1. [`extract`] drives the scraping oracle with bounded retries.
//! 2. [`deduplicate`] collapses records that share a [`CreativeFingerprint`].
//! 3. [`analyze_all`] asks the judgment oracle for one verdict per creative.
//! 4. [`summarize`] computes distributions, averages and rankings.
//!
//! [`Pipeline`] sequences the stages and is the only place a run can fail.

pub mod aggregate;
pub mod analyze;
pub mod delay;
pub mod extract;
pub mod fingerprint;
pub mod pipeline;
pub mod prompt;
pub mod verdict;

pub use aggregate::{summarize, InsightSummary, TopCreative, NOT_AVAILABLE};
pub use analyze::{analyze_all, AnalyzedCreative};
pub use delay::{Delay, TokioDelay};
pub use extract::{extract, ExtractionError, ExtractionPolicy};
pub use fingerprint::{deduplicate, fingerprint, CreativeFingerprint, UniqueCreative};
pub use pipeline::{
    Pipeline, PipelineFailure, PipelineReport, PipelineResult, PipelineSettings, Stage, CANCELLED,
};
pub use prompt::build_judgment_prompt;
pub use verdict::parse_verdict;
