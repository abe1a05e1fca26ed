use anyhow::{Context, Result};

/// Service configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the job-board REST backend, without a trailing slash.
    pub backend_base_url: String,
    pub backend_timeout_secs: u64,
    /// Retry budget for idempotent backend reads. Writes are never retried.
    pub backend_max_retries: u32,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            backend_base_url: require_env("BACKEND_BASE_URL")?
                .trim_end_matches('/')
                .to_string(),
            backend_timeout_secs: optional_env("BACKEND_TIMEOUT_SECS", "30")
                .parse::<u64>()
                .context("BACKEND_TIMEOUT_SECS must be a whole number of seconds")?,
            backend_max_retries: optional_env("BACKEND_MAX_RETRIES", "3")
                .parse::<u32>()
                .context("BACKEND_MAX_RETRIES must be a non-negative integer")?,
            port: optional_env("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: optional_env("RUST_LOG", "info"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
