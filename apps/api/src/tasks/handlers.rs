//! Axum route handlers for the text task endpoints.

use axum::{
    extract::{Multipart, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::AppError;
use crate::llm_client::prompts::{
    GENERATE_RESPONSE_PROMPT, IMAGE_PROMPT, PARAPHRASE_PROMPT, SENTIMENT_PROMPT, STORY_PROMPT,
    SUMMARIZE_PROMPT, TRANSLATE_PROMPT,
};
use crate::llm_client::InlineImage;
use crate::state::AppState;

const MAX_SUMMARIZE_CHARS: usize = 10_000;
const MAX_SENTIMENT_CHARS: usize = 5_000;
const MAX_QUERY_CHARS: usize = 1_000;
const MAX_TEXT_CHARS: usize = 10_000;

/// Upper bound for uploaded images; also applied as the route's body limit.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TextRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub target_language: String,
    pub source_language: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StoryRequest {
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub genre: Option<String>,
    pub length: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SummarizeResponse {
    pub success: bool,
    pub summary: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct SentimentResponse {
    pub success: bool,
    pub sentiment: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct GeneratedResponse {
    pub success: bool,
    pub response: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParaphraseResponse {
    pub success: bool,
    pub paraphrased_text: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateResponse {
    pub success: bool,
    pub translated_text: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct StoryResponse {
    pub success: bool,
    pub story: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct ImageAnalysisResponse {
    pub success: bool,
    pub result: String,
    pub timestamp: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /gemini/summarize
pub async fn handle_summarize(
    State(state): State<AppState>,
    Json(request): Json<TextRequest>,
) -> Result<Json<SummarizeResponse>, AppError> {
    let text = require_text("text", &request.text, MAX_SUMMARIZE_CHARS)?;
    let summary = state
        .llm
        .generate(&SUMMARIZE_PROMPT.replace("{text}", text))
        .await?;
    Ok(Json(SummarizeResponse {
        success: true,
        summary,
        timestamp: now(),
    }))
}

/// POST /gemini/analyze_sentiment
pub async fn handle_analyze_sentiment(
    State(state): State<AppState>,
    Json(request): Json<TextRequest>,
) -> Result<Json<SentimentResponse>, AppError> {
    let text = require_text("text", &request.text, MAX_SENTIMENT_CHARS)?;
    let sentiment = state
        .llm
        .generate(&SENTIMENT_PROMPT.replace("{text}", text))
        .await?;
    Ok(Json(SentimentResponse {
        success: true,
        sentiment,
        timestamp: now(),
    }))
}

/// POST /gemini/generate_response
pub async fn handle_generate_response(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<GeneratedResponse>, AppError> {
    let query = require_text("query", &request.query, MAX_QUERY_CHARS)?;
    let response = state
        .llm
        .generate(&GENERATE_RESPONSE_PROMPT.replace("{query}", query))
        .await?;
    Ok(Json(GeneratedResponse {
        success: true,
        response,
        timestamp: now(),
    }))
}

/// POST /gemini/paraphrase
pub async fn handle_paraphrase(
    State(state): State<AppState>,
    Json(request): Json<TextRequest>,
) -> Result<Json<ParaphraseResponse>, AppError> {
    let text = require_text("text", &request.text, MAX_TEXT_CHARS)?;
    let paraphrased_text = state
        .llm
        .generate(&PARAPHRASE_PROMPT.replace("{text}", text))
        .await?;
    Ok(Json(ParaphraseResponse {
        success: true,
        paraphrased_text,
        timestamp: now(),
    }))
}

/// POST /gemini/translate
pub async fn handle_translate(
    State(state): State<AppState>,
    Json(request): Json<TranslateRequest>,
) -> Result<Json<TranslateResponse>, AppError> {
    let text = require_text("text", &request.text, MAX_TEXT_CHARS)?;
    let target = require_text("targetLanguage", &request.target_language, 64)?;
    let source_clause = request
        .source_language
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!(" from {s}"))
        .unwrap_or_default();

    let prompt = TRANSLATE_PROMPT
        .replace("{source_clause}", &source_clause)
        .replace("{target_language}", target)
        .replace("{text}", text);
    let translated_text = state.llm.generate(&prompt).await?;
    Ok(Json(TranslateResponse {
        success: true,
        translated_text,
        timestamp: now(),
    }))
}

/// POST /gemini/generate_story
pub async fn handle_generate_story(
    State(state): State<AppState>,
    Json(request): Json<StoryRequest>,
) -> Result<Json<StoryResponse>, AppError> {
    let topic = require_text("topic", &request.topic, MAX_QUERY_CHARS)?;
    let keywords = if request.keywords.is_empty() {
        "(none)".to_string()
    } else {
        request.keywords.join(", ")
    };

    let prompt = STORY_PROMPT
        .replace("{keywords}", &keywords)
        .replace("{genre}", request.genre.as_deref().unwrap_or("any"))
        .replace("{length}", request.length.as_deref().unwrap_or("medium"))
        .replace("{topic}", topic);
    let story = state.llm.generate(&prompt).await?;
    Ok(Json(StoryResponse {
        success: true,
        story,
        timestamp: now(),
    }))
}

/// POST /gemini/analyze_image (multipart: `image` file, `query` text)
pub async fn handle_analyze_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ImageAnalysisResponse>, AppError> {
    let mut image: Option<InlineImage> = None;
    let mut query: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(invalid_multipart)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("image") => {
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await.map_err(invalid_multipart)?;
                debug!(mime_type = %mime_type, bytes = data.len(), "Received image upload");
                image = Some(InlineImage { mime_type, data });
            }
            Some("query") => query = Some(field.text().await.map_err(invalid_multipart)?),
            _ => {}
        }
    }

    let (Some(image), Some(query)) = (image, query) else {
        return Err(AppError::Validation(
            "Both an image file and a query field are required".to_string(),
        ));
    };
    if image.data.is_empty() {
        return Err(AppError::Validation("image must not be empty".to_string()));
    }
    if !image.mime_type.starts_with("image/") {
        return Err(AppError::Validation(format!(
            "Unsupported image type '{}'",
            image.mime_type
        )));
    }
    let query = require_text("query", &query, MAX_QUERY_CHARS)?;

    let result = state
        .llm
        .generate_with_image(&IMAGE_PROMPT.replace("{query}", query), &image)
        .await?;
    Ok(Json(ImageAnalysisResponse {
        success: true,
        result,
        timestamp: now(),
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

/// Trimmed, non-empty value of at most `max_chars` characters.
fn require_text<'a>(field: &str, value: &'a str, max_chars: usize) -> Result<&'a str, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    if trimmed.chars().count() > max_chars {
        return Err(AppError::Validation(format!(
            "{field} must be at most {max_chars} characters"
        )));
    }
    Ok(trimmed)
}

fn invalid_multipart(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::Validation(format!("Invalid multipart body: {e}"))
}

fn now() -> String {
    Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_text_trims() {
        assert_eq!(require_text("text", "  hello ", 10).unwrap(), "hello");
    }

    #[test]
    fn test_require_text_rejects_blank() {
        let err = require_text("text", "   ", 10).unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg == "text is required"));
    }

    #[test]
    fn test_require_text_rejects_too_long() {
        let err = require_text("query", &"a".repeat(11), 10).unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("at most 10")));
    }

    #[test]
    fn test_translate_request_uses_camel_case() {
        let req: TranslateRequest = serde_json::from_str(
            r#"{"text": "안녕하세요", "targetLanguage": "English", "sourceLanguage": "Korean"}"#,
        )
        .unwrap();
        assert_eq!(req.target_language, "English");
        assert_eq!(req.source_language.as_deref(), Some("Korean"));
    }

    #[test]
    fn test_paraphrase_response_uses_camel_case() {
        let value = serde_json::to_value(ParaphraseResponse {
            success: true,
            paraphrased_text: "x".into(),
            timestamp: now(),
        })
        .unwrap();
        assert_eq!(value["paraphrasedText"], "x");
    }
}
