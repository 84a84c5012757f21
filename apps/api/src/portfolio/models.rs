//! Request, source and result types for the portfolio analysis pipeline.

use serde::{Deserialize, Serialize};

/// Input contract of the analysis endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub github_url: String,
    #[serde(default)]
    pub blog_url: Option<String>,
    #[serde(default)]
    pub resume_text: Option<String>,
}

impl AnalyzeRequest {
    /// Blog URL with blank values treated as absent.
    pub fn blog_url(&self) -> Option<&str> {
        non_blank(self.blog_url.as_deref())
    }

    /// Resume text with blank values treated as absent.
    pub fn resume_text(&self) -> Option<&str> {
        non_blank(self.resume_text.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

// ────────────────────────────────────────────────────────────────────────────
// SourceBundle
// ────────────────────────────────────────────────────────────────────────────

/// `owner/repo` pair extracted from a repository URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepoMeta {
    pub name: String,
    pub description: Option<String>,
    pub primary_language: Option<String>,
    pub star_count: u64,
    pub fork_count: u64,
    pub topics: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl RepoMeta {
    /// Stand-in used when the metadata lookup fails.
    pub fn placeholder(repo: &RepoRef) -> Self {
        RepoMeta {
            name: repo.repo.clone(),
            ..RepoMeta::default()
        }
    }
}

/// A source file excerpt, content already truncated.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSnippet {
    pub filename: String,
    pub content: String,
}

/// Repository-derived half of the bundle. Every field is always defined;
/// an unavailable source is an empty string or empty list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepoSources {
    pub meta: RepoMeta,
    pub readme: String,
    pub manifest: String,
    pub snippets: Vec<SourceSnippet>,
}

/// Everything the prompt is built from. Built per request, then dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceBundle {
    pub repo: RepoSources,
    /// Empty when no blog URL was given; a readable error message when the
    /// fetch failed.
    pub blog_text: String,
}

// ────────────────────────────────────────────────────────────────────────────
// AnalysisResult
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalFeedback {
    pub code_review: String,
    pub best_practices: String,
    pub tech_stack: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentationFeedback {
    pub readme_review: String,
    /// Always `None` when the request carried no blog URL.
    pub blog_review: Option<String>,
}

/// Scores on a 0–10 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectAnalysis {
    pub complexity: f64,
    pub completeness: f64,
    pub innovation: f64,
}

/// The canonical output record. Produced exactly once per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub summary: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub technical_feedback: TechnicalFeedback,
    pub documentation_feedback: DocumentationFeedback,
    pub project_analysis: ProjectAnalysis,
    /// 0–100.
    pub overall_score: u32,
    pub next_steps: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_deserializes_camel_case() {
        let req: AnalyzeRequest = serde_json::from_str(
            r#"{"githubUrl": "https://github.com/a/b", "blogUrl": "https://blog.example/post"}"#,
        )
        .unwrap();
        assert_eq!(req.github_url, "https://github.com/a/b");
        assert_eq!(req.blog_url(), Some("https://blog.example/post"));
        assert_eq!(req.resume_text(), None);
    }

    #[test]
    fn test_blank_optional_fields_are_absent() {
        let req: AnalyzeRequest = serde_json::from_str(
            r#"{"githubUrl": "https://github.com/a/b", "blogUrl": "   ", "resumeText": ""}"#,
        )
        .unwrap();
        assert_eq!(req.blog_url(), None);
        assert_eq!(req.resume_text(), None);
    }

    #[test]
    fn test_placeholder_meta_uses_repo_name() {
        let meta = RepoMeta::placeholder(&RepoRef {
            owner: "ownerA".into(),
            repo: "repoB".into(),
        });
        assert_eq!(meta.name, "repoB");
        assert_eq!(meta.star_count, 0);
        assert!(meta.topics.is_empty());
    }

    #[test]
    fn test_analysis_result_serializes_camel_case_with_null_blog_review() {
        let result = AnalysisResult {
            summary: "s".into(),
            strengths: vec![],
            weaknesses: vec![],
            technical_feedback: TechnicalFeedback {
                code_review: "c".into(),
                best_practices: "b".into(),
                tech_stack: "t".into(),
            },
            documentation_feedback: DocumentationFeedback {
                readme_review: "r".into(),
                blog_review: None,
            },
            project_analysis: ProjectAnalysis {
                complexity: 7.0,
                completeness: 7.0,
                innovation: 6.0,
            },
            overall_score: 75,
            next_steps: vec![],
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["overallScore"], 75);
        assert_eq!(value["technicalFeedback"]["codeReview"], "c");
        assert!(value["documentationFeedback"]["blogReview"].is_null());
        assert!(value.get("nextSteps").is_some());
    }
}
