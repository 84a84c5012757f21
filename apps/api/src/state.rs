use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::config::Config;
use crate::llm_client::{GeminiClient, TextGenerator};
use crate::portfolio::analyzer::PortfolioAnalyzer;
use crate::portfolio::blog::HttpPageFetcher;
use crate::portfolio::github::GitHubClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Used directly by the single-call task endpoints.
    pub llm: Arc<dyn TextGenerator>,
    pub analyzer: Arc<PortfolioAnalyzer>,
}

impl AppState {
    /// Builds the production collaborators: Gemini for generation, the GitHub
    /// REST API for repository sources and plain HTTP for blog pages.
    pub fn from_config(config: &Config) -> Result<Self> {
        let gemini = GeminiClient::new(
            config.gemini_api_key.clone(),
            config.gemini_api_url.clone(),
            config.gemini_model.clone(),
            config.llm_timeout,
        )?;
        info!("LLM client initialized (model: {})", gemini.model());
        let llm: Arc<dyn TextGenerator> = Arc::new(gemini);
        let code_host = Arc::new(GitHubClient::new(
            config.github_api_url.clone(),
            config.github_token.clone(),
            config.source_fetch_timeout,
        )?);
        let analyzer = PortfolioAnalyzer::new(
            code_host,
            Arc::new(HttpPageFetcher::new()),
            llm.clone(),
            config.blog_fetch_timeout,
        );

        Ok(Self {
            llm,
            analyzer: Arc::new(analyzer),
        })
    }
}
