//! Axum route handler for portfolio analysis.

use axum::{extract::State, Json};

use crate::errors::AppError;
use crate::portfolio::models::{AnalysisResult, AnalyzeRequest};
use crate::state::AppState;

/// POST /gemini/analyze_portfolio
///
/// Returns the canonical `AnalysisResult` as-is.
pub async fn handle_analyze_portfolio(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalysisResult>, AppError> {
    if request.github_url.trim().is_empty() {
        return Err(AppError::Validation("githubUrl is required".to_string()));
    }

    let result = state.analyzer.analyze(&request).await?;
    Ok(Json(result))
}
