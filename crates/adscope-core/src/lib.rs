//! Shared domain types and configuration for adscope.
//!
//! Holds the scraped ad record model, the judgment verdict model, the oracle
//! traits the pipeline is written against, and environment-driven
//! application configuration.

pub mod ads;
pub mod app_config;
pub mod config;
pub mod error;
pub mod oracle;
pub mod text;
pub mod verdict;

pub use ads::{AdFormat, RawAdRecord};
pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use error::ConfigError;
pub use oracle::{JudgmentOracle, OracleError, ScrapeOracle, ScrapeRequest};
pub use verdict::{AnalysisVerdict, AwarenessLevel, FunnelStage, HookType, TargetAudience};
