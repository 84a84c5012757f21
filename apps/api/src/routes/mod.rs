pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::portfolio::handlers as portfolio;
use crate::state::AppState;
use crate::tasks::handlers as tasks;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::root_handler))
        .route("/health", get(health::health_handler))
        // Single-call text tasks
        .route("/gemini/summarize", post(tasks::handle_summarize))
        .route(
            "/gemini/analyze_sentiment",
            post(tasks::handle_analyze_sentiment),
        )
        .route(
            "/gemini/generate_response",
            post(tasks::handle_generate_response),
        )
        .route("/gemini/paraphrase", post(tasks::handle_paraphrase))
        .route("/gemini/translate", post(tasks::handle_translate))
        .route("/gemini/generate_story", post(tasks::handle_generate_story))
        .route(
            "/gemini/analyze_image",
            post(tasks::handle_analyze_image)
                .layer(DefaultBodyLimit::max(tasks::MAX_IMAGE_BYTES + 64 * 1024)),
        )
        // Portfolio analysis
        .route(
            "/gemini/analyze_portfolio",
            post(portfolio::handle_analyze_portfolio),
        )
        .route(
            "/api/v1/portfolio/analyze",
            post(portfolio::handle_analyze_portfolio),
        )
        .with_state(state)
}
