mod api;
mod jobs;
mod middleware;

use std::sync::Arc;

use adscope_claude::ClaudeClient;
use adscope_pipeline::{Pipeline, PipelineSettings};
use adscope_scraper::AgentClient;
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState, RunDefaults},
    jobs::JobStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = adscope_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let Some(agent_url) = config.agent_url.as_deref() else {
        anyhow::bail!("ADSCOPE_AGENT_URL is required to run the server");
    };
    let scraper = Arc::new(AgentClient::new(agent_url, config.agent_timeout_secs)?);
    let judge = Arc::new(ClaudeClient::from_config(&config)?);
    let pipeline = Pipeline::new(scraper, judge, PipelineSettings::from_app_config(&config));

    let app = build_app(AppState {
        pipeline: Arc::new(pipeline),
        jobs: JobStore::with_retention(config.retained_jobs),
        defaults: RunDefaults::from_app_config(&config),
    });

    tracing::info!(env = %config.env, bind_addr = %config.bind_addr, "adscope-server listening");
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
