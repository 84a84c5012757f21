//! Prompt composition for portfolio analysis. Pure: no I/O, no randomness.

use std::fmt::Write as _;

use crate::portfolio::models::SourceBundle;
use crate::portfolio::truncate_chars;

pub const README_PROMPT_CHARS: usize = 3000;
pub const MANIFEST_PROMPT_CHARS: usize = 1000;
pub const BLOG_PROMPT_CHARS: usize = 2000;

const ANALYSIS_PREAMBLE: &str = "\
You are a senior software engineer and technical recruiter reviewing a developer's portfolio. \
Evaluate the repository below (and the blog and resume if provided) and give honest, \
specific, actionable feedback.";

/// Target schema. The reply must be exactly one object of this shape.
const ANALYSIS_SCHEMA: &str = r#"Respond with ONLY a JSON object matching this EXACT schema:
{
  "summary": "2-3 sentence overview of the project and the developer",
  "strengths": ["specific strength", "..."],
  "weaknesses": ["specific weakness", "..."],
  "technicalFeedback": {
    "codeReview": "code quality, structure and readability",
    "bestPractices": "testing, error handling, security, conventions",
    "techStack": "assessment of the chosen technologies"
  },
  "documentationFeedback": {
    "readmeReview": "quality of the README",
    "blogReview": "quality of the blog post, or null if no blog was provided"
  },
  "projectAnalysis": {
    "complexity": 7,
    "completeness": 7,
    "innovation": 6
  },
  "overallScore": 75,
  "nextSteps": ["concrete next step", "..."]
}

RULES:
1. projectAnalysis values are numbers from 0 to 10
2. overallScore is an integer from 0 to 100
3. Output the JSON object only: no prose before or after it
4. Do NOT wrap the JSON in markdown code fences
5. Use double quotes for every key and string value"#;

/// Builds the analysis prompt from the aggregated sources and optional resume.
pub fn compose_analysis_prompt(bundle: &SourceBundle, resume_text: Option<&str>) -> String {
    let repo = &bundle.repo;
    let meta = &repo.meta;
    let mut prompt = String::with_capacity(8 * 1024);

    prompt.push_str(ANALYSIS_PREAMBLE);
    prompt.push_str("\n\n## REPOSITORY\n");
    let _ = writeln!(prompt, "Name: {}", meta.name);
    let _ = writeln!(
        prompt,
        "Description: {}",
        meta.description.as_deref().unwrap_or("(none)")
    );
    let _ = writeln!(
        prompt,
        "Primary language: {}",
        meta.primary_language.as_deref().unwrap_or("(unknown)")
    );
    let _ = writeln!(prompt, "Stars: {}, Forks: {}", meta.star_count, meta.fork_count);
    let topics = if meta.topics.is_empty() {
        "(none)".to_string()
    } else {
        meta.topics.join(", ")
    };
    let _ = writeln!(prompt, "Topics: {topics}");
    let _ = writeln!(prompt, "Created: {}, Last updated: {}", meta.created_at, meta.updated_at);

    push_section(&mut prompt, "README", &repo.readme, README_PROMPT_CHARS);
    push_section(&mut prompt, "MANIFEST", &repo.manifest, MANIFEST_PROMPT_CHARS);

    prompt.push_str("\n## SOURCE FILES\n");
    if repo.snippets.is_empty() {
        prompt.push_str("(no source files available)\n");
    }
    for snippet in &repo.snippets {
        let _ = write!(prompt, "\n### {}\n```\n{}\n```\n", snippet.filename, snippet.content);
    }

    if !bundle.blog_text.is_empty() {
        push_section(&mut prompt, "BLOG POST", &bundle.blog_text, BLOG_PROMPT_CHARS);
    }
    if let Some(resume) = resume_text {
        let _ = write!(prompt, "\n## RESUME\n{resume}\n");
    }

    prompt.push('\n');
    prompt.push_str(ANALYSIS_SCHEMA);
    prompt
}

fn push_section(prompt: &mut String, title: &str, body: &str, max_chars: usize) {
    let body = truncate_chars(body.trim(), max_chars);
    let body = if body.is_empty() { "(not available)" } else { body };
    let _ = write!(prompt, "\n## {title}\n{body}\n");
}
