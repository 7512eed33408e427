//! `analyze` command handler.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use adscope_claude::ClaudeClient;
use adscope_core::{AppConfig, ScrapeOracle};
use adscope_pipeline::{Pipeline, PipelineSettings};
use adscope_scraper::{AgentClient, SnapshotSource};

#[derive(Debug)]
pub(crate) struct AnalyzeOptions {
    pub brand: String,
    pub region: String,
    pub max_items: usize,
    pub snapshot: Option<PathBuf>,
    pub json: bool,
    pub csv: Option<PathBuf>,
    pub timeout_secs: u64,
}

/// Picks the scraping oracle: a snapshot replay when one is given, otherwise
/// the configured browser agent.
///
/// # Errors
///
/// Returns an error if neither a snapshot nor `ADSCOPE_AGENT_URL` is
/// available, or the agent client cannot be built.
pub(crate) fn select_scraper(
    config: &AppConfig,
    snapshot: Option<PathBuf>,
) -> anyhow::Result<Arc<dyn ScrapeOracle>> {
    if let Some(path) = snapshot {
        tracing::info!(path = %path.display(), "using extraction snapshot");
        return Ok(Arc::new(SnapshotSource::new(path)));
    }

    let Some(agent_url) = config.agent_url.as_deref() else {
        anyhow::bail!(
            "ADSCOPE_AGENT_URL is not set; pass --snapshot <FILE> to replay a saved extraction"
        );
    };
    Ok(Arc::new(AgentClient::new(agent_url, config.agent_timeout_secs)?))
}

/// Resolves once Ctrl-C is pressed or `timeout` elapses, whichever is first.
async fn interrupt_or_timeout(timeout: Duration) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "failed to listen for Ctrl-C; waiting for timeout");
                tokio::time::sleep(timeout).await;
            } else {
                tracing::warn!("interrupt received, cancelling run");
            }
        }
        () = tokio::time::sleep(timeout) => {
            tracing::warn!(timeout_secs = timeout.as_secs(), "run timed out, cancelling");
        }
    }
}

/// Runs one pipeline and prints the result.
///
/// # Errors
///
/// Returns an error if the oracles cannot be built or the run ends in a
/// pipeline failure (including cancellation).
pub(crate) async fn run_analyze(config: &AppConfig, options: AnalyzeOptions) -> anyhow::Result<()> {
    let scraper = select_scraper(config, options.snapshot)?;
    let judge = Arc::new(ClaudeClient::from_config(config)?);
    let pipeline = Pipeline::new(scraper, judge, PipelineSettings::from_app_config(config));

    let outcome = pipeline
        .run_until(
            &options.brand,
            &options.region,
            options.max_items,
            interrupt_or_timeout(Duration::from_secs(options.timeout_secs)),
        )
        .await;

    match outcome {
        Ok(report) => {
            if let Some(path) = options.csv.as_deref() {
                crate::export::export_csv(&report, path)?;
            }
            if options.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", crate::render::render_report(&report));
            }
            Ok(())
        }
        Err(failure) => {
            if options.json {
                println!("{}", serde_json::to_string_pretty(&failure)?);
            }
            anyhow::bail!("{} stage failed: {}", failure.stage, failure.detail)
        }
    }
}
