//! Result normalization: coerces any candidate value into a canonical
//! `AnalysisResult`, whichever parse stage produced it.

use serde_json::{Map, Value};

use crate::portfolio::models::{
    AnalysisResult, DocumentationFeedback, ProjectAnalysis, TechnicalFeedback,
};

pub const FALLBACK_SUMMARY: &str =
    "The portfolio was analyzed, but no summary was produced.";
pub const FALLBACK_TEXT: &str = "No detailed feedback is available for this area.";
pub const FALLBACK_STRENGTHS: &[&str] = &["The project is publicly available for review."];
pub const FALLBACK_WEAKNESSES: &[&str] = &["No specific weaknesses were identified."];
pub const FALLBACK_NEXT_STEPS: &[&str] = &[
    "Add automated tests and continuous integration.",
    "Expand the README with setup instructions and usage examples.",
];

pub const DEFAULT_COMPLEXITY: f64 = 7.0;
pub const DEFAULT_COMPLETENESS: f64 = 7.0;
pub const DEFAULT_INNOVATION: f64 = 6.0;
pub const DEFAULT_OVERALL_SCORE: u32 = 75;

const PROJECT_SCORE_MAX: f64 = 10.0;
const OVERALL_SCORE_MAX: f64 = 100.0;

/// Builds the canonical result. `blog_supplied` is whether the request
/// carried a blog URL; without one `blogReview` is always `null`.
pub fn normalize_analysis(candidate: &Value, blog_supplied: bool) -> AnalysisResult {
    let empty = Map::new();
    let fields = Fields {
        root: candidate.as_object().unwrap_or(&empty),
    };

    let technical_feedback = TechnicalFeedback {
        code_review: fields.nested_text("technicalFeedback", "codeReview"),
        best_practices: fields.nested_text("technicalFeedback", "bestPractices"),
        tech_stack: fields.nested_text("technicalFeedback", "techStack"),
    };

    let blog_review = if blog_supplied {
        Some(fields.nested_text("documentationFeedback", "blogReview"))
    } else {
        None
    };
    let documentation_feedback = DocumentationFeedback {
        readme_review: fields.nested_text("documentationFeedback", "readmeReview"),
        blog_review,
    };

    let project_analysis = ProjectAnalysis {
        complexity: fields.nested_score("complexity", DEFAULT_COMPLEXITY),
        completeness: fields.nested_score("completeness", DEFAULT_COMPLETENESS),
        innovation: fields.nested_score("innovation", DEFAULT_INNOVATION),
    };

    let overall_score = fields
        .root
        .get("overallScore")
        .and_then(coerce_number)
        .map(|n| n.clamp(0.0, OVERALL_SCORE_MAX).round() as u32)
        .unwrap_or(DEFAULT_OVERALL_SCORE);

    AnalysisResult {
        summary: text_or(fields.root.get("summary"), FALLBACK_SUMMARY),
        strengths: string_list(fields.root.get("strengths"), FALLBACK_STRENGTHS),
        weaknesses: string_list(fields.root.get("weaknesses"), FALLBACK_WEAKNESSES),
        technical_feedback,
        documentation_feedback,
        project_analysis,
        overall_score,
        next_steps: string_list(fields.root.get("nextSteps"), FALLBACK_NEXT_STEPS),
    }
}

struct Fields<'a> {
    root: &'a Map<String, Value>,
}

impl Fields<'_> {
    /// `section.field`, else a flattened top-level `field`.
    fn lookup<F, T>(&self, section: &str, field: &str, extract: F) -> Option<T>
    where
        F: Fn(&Value) -> Option<T>,
    {
        self.root
            .get(section)
            .and_then(|s| s.get(field))
            .and_then(&extract)
            .or_else(|| self.root.get(field).and_then(&extract))
    }

    fn nested_text(&self, section: &str, field: &str) -> String {
        self.lookup(section, field, |v| v.as_str().map(String::from))
            .unwrap_or_else(|| FALLBACK_TEXT.to_string())
    }

    fn nested_score(&self, field: &str, default: f64) -> f64 {
        self.lookup("projectAnalysis", field, coerce_number)
            .map(|n| n.clamp(0.0, PROJECT_SCORE_MAX))
            .unwrap_or(default)
    }
}

fn text_or(value: Option<&Value>, fallback: &str) -> String {
    value
        .and_then(Value::as_str)
        .map(String::from)
        .unwrap_or_else(|| fallback.to_string())
}

/// Numbers pass through; numeric strings are parsed; anything else is `None`.
fn coerce_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

/// Arrays are kept; a single non-empty value becomes a one-element list;
/// absent, null or empty values become `fallback`.
fn string_list(value: Option<&Value>, fallback: &[&str]) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(item_text).collect(),
        Some(other) => match item_text(other) {
            Some(text) if !text.trim().is_empty() && !is_empty_container(other) => vec![text],
            _ => owned(fallback),
        },
        None => owned(fallback),
    }
}

fn item_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn is_empty_container(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
