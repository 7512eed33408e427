use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub anthropic_api_key: String,
    pub anthropic_model: String,
    pub anthropic_base_url: String,
    /// Base URL of the browser-agent service. `None` means only snapshot
    /// replay is available.
    pub agent_url: Option<String>,
    pub agent_timeout_secs: u64,
    pub extract_max_attempts: u32,
    pub extract_retry_delay_secs: u64,
    pub default_max_items: usize,
    pub analysis_concurrency: usize,
    pub llm_timeout_secs: u64,
    pub llm_max_tokens: u32,
    pub llm_max_retries: u32,
    pub run_timeout_secs: u64,
    /// Finished server jobs kept for polling; older ones are evicted.
    pub retained_jobs: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("anthropic_api_key", &"[redacted]")
            .field("anthropic_model", &self.anthropic_model)
            .field("anthropic_base_url", &self.anthropic_base_url)
            .field("agent_url", &self.agent_url)
            .field("agent_timeout_secs", &self.agent_timeout_secs)
            .field("extract_max_attempts", &self.extract_max_attempts)
            .field("extract_retry_delay_secs", &self.extract_retry_delay_secs)
            .field("default_max_items", &self.default_max_items)
            .field("analysis_concurrency", &self.analysis_concurrency)
            .field("llm_timeout_secs", &self.llm_timeout_secs)
            .field("llm_max_tokens", &self.llm_max_tokens)
            .field("llm_max_retries", &self.llm_max_retries)
            .field("run_timeout_secs", &self.run_timeout_secs)
            .field("retained_jobs", &self.retained_jobs)
            .finish()
    }
}
