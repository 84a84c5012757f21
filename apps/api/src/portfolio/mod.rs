// Portfolio analysis pipeline.
// Flow: repository + blog sources (concurrent, best-effort) → prompt →
//       single model call → layered reply parsing → normalization.
// All model calls go through llm_client::TextGenerator.

use thiserror::Error;

pub mod analyzer;
pub mod blog;
pub mod github;
pub mod handlers;
pub mod models;
pub mod normalize;
pub mod parser;
pub mod prompts;

/// Failure of a single upstream source fetch. Always absorbed into an
/// empty or placeholder value and logged; never returned to a caller.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned status {status} for {url}")]
    Status { status: u16, url: String },
}

/// Longest prefix of `text` holding at most `max_chars` characters.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
