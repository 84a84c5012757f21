use anyhow::{Context, Result};
use std::time::Duration;

const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_api_url: String,
    /// Optional; anonymous GitHub requests are heavily rate limited.
    pub github_token: Option<String>,
    pub github_api_url: String,
    pub source_fetch_timeout: Duration,
    pub blog_fetch_timeout: Duration,
    pub llm_timeout: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            gemini_model: env_or("GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
            gemini_api_url: env_or("GEMINI_API_URL", DEFAULT_GEMINI_API_URL),
            github_token: std::env::var("GITHUB_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty()),
            github_api_url: env_or("GITHUB_API_URL", DEFAULT_GITHUB_API_URL),
            source_fetch_timeout: secs_env("SOURCE_FETCH_TIMEOUT_SECS", 15)?,
            blog_fetch_timeout: secs_env("BLOG_FETCH_TIMEOUT_SECS", 10)?,
            llm_timeout: secs_env("LLM_TIMEOUT_SECS", 120)?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn secs_env(key: &str, default: u64) -> Result<Duration> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<u64>()
            .map(Duration::from_secs)
            .with_context(|| format!("{key} must be a whole number of seconds")),
        Err(_) => Ok(Duration::from_secs(default)),
    }
}

#[cfg(test)]
impl Config {
    /// Config with defaults and a dummy key, for unit tests.
    pub fn for_tests() -> Self {
        Config {
            gemini_api_key: "test-key".to_string(),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_api_url: DEFAULT_GEMINI_API_URL.to_string(),
            github_token: None,
            github_api_url: DEFAULT_GITHUB_API_URL.to_string(),
            source_fetch_timeout: Duration::from_secs(15),
            blog_fetch_timeout: Duration::from_secs(10),
            llm_timeout: Duration::from_secs(120),
            port: 8080,
            rust_log: "info".to_string(),
        }
    }
}
