//! Portfolio analysis orchestration.
//!
//! Flow: parse repo URL → (repository sources ‖ blog text) → prompt →
//!       one model call → parse reply → normalize.
//!
//! Only two errors escape: `InvalidSourceUrl` and `ModelUnavailable`.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::llm_client::TextGenerator;
use crate::portfolio::blog::{fetch_blog_text, PageFetcher};
use crate::portfolio::github::{fetch_repository_sources, parse_repo_url, CodeHost};
use crate::portfolio::models::{AnalysisResult, AnalyzeRequest, SourceBundle};
use crate::portfolio::normalize::normalize_analysis;
use crate::portfolio::parser::parse_model_reply;
use crate::portfolio::prompts::compose_analysis_prompt;

/// Built once at startup; holds no per-request state, so one instance
/// serves any number of concurrent analyses.
pub struct PortfolioAnalyzer {
    code_host: Arc<dyn CodeHost>,
    page_fetcher: Arc<dyn PageFetcher>,
    llm: Arc<dyn TextGenerator>,
    blog_timeout: Duration,
}

impl PortfolioAnalyzer {
    pub fn new(
        code_host: Arc<dyn CodeHost>,
        page_fetcher: Arc<dyn PageFetcher>,
        llm: Arc<dyn TextGenerator>,
        blog_timeout: Duration,
    ) -> Self {
        Self {
            code_host,
            page_fetcher,
            llm,
            blog_timeout,
        }
    }

    pub async fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalysisResult, AppError> {
        let repo = parse_repo_url(&request.github_url)?;
        let blog_url = request.blog_url();
        let analysis_id = Uuid::new_v4();
        info!(
            %analysis_id,
            owner = %repo.owner,
            repo = %repo.repo,
            with_blog = blog_url.is_some(),
            with_resume = request.resume_text().is_some(),
            "Starting portfolio analysis"
        );

        let (repo_sources, blog_text) = tokio::join!(
            fetch_repository_sources(self.code_host.as_ref(), &repo),
            fetch_blog_text(self.page_fetcher.as_ref(), blog_url, self.blog_timeout)
        );
        let bundle = SourceBundle {
            repo: repo_sources,
            blog_text,
        };
        let prompt = compose_analysis_prompt(&bundle, request.resume_text());
        drop(bundle);

        let reply = self.llm.generate(&prompt).await?;
        let parsed = parse_model_reply(&reply);
        let result = normalize_analysis(&parsed.candidate, blog_url.is_some());

        info!(
            %analysis_id,
            strategy = ?parsed.strategy,
            overall_score = result.overall_score,
            "Portfolio analysis complete"
        );
        Ok(result)
    }
}
