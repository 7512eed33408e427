use std::time::Duration;

use adscope_core::{OracleError, RawAdRecord, ScrapeOracle, ScrapeRequest};
use async_trait::async_trait;
use reqwest::{Client, Url};

use crate::error::ScraperError;
use crate::parse::parse_agent_output;
use crate::task::{ad_library_url, extraction_task};
use crate::types::{AgentRun, AgentTaskRequest};

/// HTTP client for the browser-agent service.
///
/// Each [`ScrapeOracle::scrape`] call is a single agent run: `POST {base}/run`
/// with the extraction task, answered with an [`AgentRun`]. Retrying empty or
/// failed runs is the extraction orchestrator's job, not this client's.
pub struct AgentClient {
    client: Client,
    run_url: Url,
}

impl AgentClient {
    /// Creates a client for the agent service at `base_url`.
    ///
    /// `timeout_secs` bounds a whole agent run, which includes page loads and
    /// scrolling, so it is typically several minutes.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidAgentUrl`] if `base_url` does not parse,
    /// or [`ScraperError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("adscope/0.1 (creative-analysis)")
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let run_url = Url::parse(&normalised)
            .and_then(|base| base.join("run"))
            .map_err(|e| ScraperError::InvalidAgentUrl {
                url: base_url.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self { client, run_url })
    }

    /// Runs the extraction task once and returns the raw agent output.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::UnexpectedStatus`] on a non-2xx response.
    /// - [`ScraperError::Http`] on network failure or timeout.
    /// - [`ScraperError::Deserialize`] if the body is not an agent run.
    pub async fn run_task(&self, request: &ScrapeRequest) -> Result<AgentRun, ScraperError> {
        let start_url = ad_library_url(&request.brand, &request.region);
        let task = extraction_task(&request.brand, &request.region, request.max_items);
        let body = AgentTaskRequest {
            task: &task,
            start_url: &start_url,
        };

        tracing::debug!(brand = %request.brand, region = %request.region, "starting agent run");

        let response = self
            .client
            .post(self.run_url.clone())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url: self.run_url.to_string(),
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| ScraperError::Deserialize {
            context: self.run_url.to_string(),
            source: e,
        })
    }
}

#[async_trait]
impl ScrapeOracle for AgentClient {
    async fn scrape(&self, request: &ScrapeRequest) -> Result<Vec<RawAdRecord>, OracleError> {
        let run = self.run_task(request).await?;
        let records = parse_agent_output(&run, request.max_items);
        if records.is_empty() {
            tracing::warn!(
                brand = %request.brand,
                blocks = run.extracted_content.len(),
                has_final = run.final_result.is_some(),
                "agent run produced no usable ads"
            );
        }
        Ok(records)
    }
}
