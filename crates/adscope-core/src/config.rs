use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let anthropic_api_key = require("ANTHROPIC_API_KEY")?;
    let anthropic_model = or_default("ANTHROPIC_MODEL", "claude-sonnet-4-20250514");
    let anthropic_base_url = or_default("ANTHROPIC_BASE_URL", "https://api.anthropic.com/v1");

    let env = parse_environment(&or_default("ADSCOPE_ENV", "development"))?;
    let log_level = or_default("ADSCOPE_LOG_LEVEL", "info");
    let bind_addr = or_default("ADSCOPE_BIND_ADDR", "0.0.0.0:8000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("ADSCOPE_BIND_ADDR", e.to_string()))?;

    let agent_url = lookup("ADSCOPE_AGENT_URL")
        .ok()
        .filter(|v| !v.trim().is_empty());
    let agent_timeout_secs = parse_u64("ADSCOPE_AGENT_TIMEOUT_SECS", "600")?;

    let extract_max_attempts = parse_u32("ADSCOPE_EXTRACT_MAX_ATTEMPTS", "3")?;
    if extract_max_attempts == 0 {
        return Err(invalid(
            "ADSCOPE_EXTRACT_MAX_ATTEMPTS",
            "must be at least 1".to_string(),
        ));
    }
    let extract_retry_delay_secs = parse_u64("ADSCOPE_EXTRACT_RETRY_DELAY_SECS", "5")?;
    let default_max_items = parse_usize("ADSCOPE_DEFAULT_MAX_ITEMS", "10")?;

    let analysis_concurrency = parse_usize("ADSCOPE_ANALYSIS_CONCURRENCY", "3")?;
    if analysis_concurrency == 0 {
        return Err(invalid(
            "ADSCOPE_ANALYSIS_CONCURRENCY",
            "must be at least 1".to_string(),
        ));
    }

    let llm_timeout_secs = parse_u64("ADSCOPE_LLM_TIMEOUT_SECS", "60")?;
    let llm_max_tokens = parse_u32("ADSCOPE_LLM_MAX_TOKENS", "1024")?;
    let llm_max_retries = parse_u32("ADSCOPE_LLM_MAX_RETRIES", "2")?;
    let run_timeout_secs = parse_u64("ADSCOPE_RUN_TIMEOUT_SECS", "900")?;
    let retained_jobs = parse_usize("ADSCOPE_RETAINED_JOBS", "100")?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        anthropic_api_key,
        anthropic_model,
        anthropic_base_url,
        agent_url,
        agent_timeout_secs,
        extract_max_attempts,
        extract_retry_delay_secs,
        default_max_items,
        analysis_concurrency,
        llm_timeout_secs,
        llm_max_tokens,
        llm_max_retries,
        run_timeout_secs,
        retained_jobs,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnvVar`] for anything other than
/// `development`, `test`, or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "ADSCOPE_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
