mod analyze;
mod export;
mod render;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "adscope-cli")]
#[command(about = "Brand ad-creative analysis from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract, deduplicate, score and summarize a brand's active ads
    Analyze {
        /// Brand name to search for in the ad library
        #[arg(long)]
        brand: String,

        /// Country code, or ALL
        #[arg(long, default_value = "ALL")]
        region: String,

        /// Maximum ads to extract (defaults to `ADSCOPE_DEFAULT_MAX_ITEMS`)
        #[arg(long)]
        max_items: Option<usize>,

        /// Replay a saved extraction JSON instead of running the browser agent
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Print the full report as JSON instead of a text summary
        #[arg(long)]
        json: bool,

        /// Also write one row per analysed creative to this CSV file
        #[arg(long, value_name = "FILE")]
        csv: Option<PathBuf>,

        /// Abort the run after this many seconds (defaults to `ADSCOPE_RUN_TIMEOUT_SECS`)
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
}

/// Logs go to stderr so `--json` output on stdout stays machine-readable.
fn init_tracing(default_level: &str) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("adscope-cli: run `adscope-cli analyze --brand <BRAND>` to analyse a brand");
        return Ok(());
    };

    let config = adscope_core::load_app_config()?;
    init_tracing(&config.log_level)?;

    match command {
        Commands::Analyze {
            brand,
            region,
            max_items,
            snapshot,
            json,
            csv,
            timeout_secs,
        } => {
            let options = analyze::AnalyzeOptions {
                brand,
                region,
                max_items: max_items.unwrap_or(config.default_max_items),
                snapshot,
                json,
                csv,
                timeout_secs: timeout_secs.unwrap_or(config.run_timeout_secs),
            };
            analyze::run_analyze(&config, options).await?;
        }
    }

    Ok(())
}
