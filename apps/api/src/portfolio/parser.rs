//! Model reply parsing.
//!
//! Turns the model's free-form reply into a candidate JSON object for
//! `normalize::normalize_analysis`. Never fails; every path ends in a value:
//!
//! - Stage A: strict parse of the raw reply.
//! - Stage B: each cleaning transform is applied to the raw reply on its own,
//!   then the first balanced `{...}` span is extracted, syntactically
//!   repaired and parsed. If that span is not JSON, the next top-level span
//!   is tried. The first transform that yields an object wins.
//! - Stage C: keyword mining over the raw text, producing a complete
//!   placeholder object.
//!
//! Every stage is linear in the reply length.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::portfolio::normalize::{
    DEFAULT_COMPLEXITY, DEFAULT_COMPLETENESS, DEFAULT_INNOVATION, DEFAULT_OVERALL_SCORE,
    FALLBACK_NEXT_STEPS, FALLBACK_TEXT,
};
use crate::portfolio::truncate_chars;

/// Which stage produced the candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStrategy {
    Strict,
    Cleaned(&'static str),
    Heuristic,
}

#[derive(Debug, Clone)]
pub struct ParsedReply {
    pub candidate: Value,
    pub strategy: ParseStrategy,
}

type CleaningTransform = fn(&str) -> String;

/// Stage B transforms, tried in order, each on the raw reply.
const CLEANING_TRANSFORMS: &[(&str, CleaningTransform)] = &[
    ("strip_code_fences", strip_code_fences),
    ("strip_markdown", strip_markdown),
    ("collapse_whitespace", collapse_whitespace),
    ("strip_comments", strip_comments),
];

pub fn parse_model_reply(raw: &str) -> ParsedReply {
    if let Some(candidate) = parse_object(raw) {
        return ParsedReply {
            candidate,
            strategy: ParseStrategy::Strict,
        };
    }

    for &(name, transform) in CLEANING_TRANSFORMS {
        let cleaned = transform(raw);
        if let Some(candidate) = first_repairable_object(&cleaned, name) {
            debug!(transform = name, "Recovered JSON object from model reply");
            return ParsedReply {
                candidate,
                strategy: ParseStrategy::Cleaned(name),
            };
        }
    }

    warn!(
        reply_chars = raw.chars().count(),
        "Model reply held no parseable JSON, mining text instead"
    );
    ParsedReply {
        candidate: mine_text(raw),
        strategy: ParseStrategy::Heuristic,
    }
}

/// Tries each top-level balanced span in order, starting at the first `{`.
/// A span that fails to repair is skipped as a whole, so braces nested in it
/// are never retried on their own.
fn first_repairable_object(text: &str, transform: &str) -> Option<Value> {
    let mut rest = text;
    while let Some(start) = rest.find('{') {
        let Some(span) = extract_balanced_object(&rest[start..]) else {
            debug!(transform, "No balanced object after cleaning");
            return None;
        };
        if let Some(candidate) = parse_object(&repair_json_syntax(span)) {
            return Some(candidate);
        }
        debug!(transform, "Repaired span still not valid JSON");
        rest = &rest[start + span.len()..];
    }
    None
}

fn parse_object(text: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(text.trim()) {
        Ok(value @ Value::Object(_)) => Some(value),
        _ => None,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Scanner
// ────────────────────────────────────────────────────────────────────────────

const ANY_QUOTE: &[char] = &['"', '\''];
const DOUBLE_QUOTE: &[char] = &['"'];

/// String-literal state. Delimiters only count in `Normal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Normal,
    InString(char),
    Escaped(char),
}

impl ScanState {
    fn step(self, ch: char, quotes: &[char]) -> Self {
        match self {
            ScanState::Normal if quotes.contains(&ch) => ScanState::InString(ch),
            ScanState::Normal => ScanState::Normal,
            ScanState::InString(q) if ch == '\\' => ScanState::Escaped(q),
            ScanState::InString(q) if ch == q => ScanState::Normal,
            ScanState::InString(q) | ScanState::Escaped(q) => ScanState::InString(q),
        }
    }
}

/// The span from the first `{` to its matching `}`, ignoring braces inside
/// quoted strings. `None` when the object never closes.
pub fn extract_balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut state = ScanState::Normal;

    for (offset, ch) in text[start..].char_indices() {
        if state == ScanState::Normal {
            match ch {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(&text[start..start + offset + ch.len_utf8()]);
                    }
                }
                _ => {}
            }
        }
        state = state.step(ch, ANY_QUOTE);
    }

    None
}

// ────────────────────────────────────────────────────────────────────────────
// Cleaning transforms
// ────────────────────────────────────────────────────────────────────────────

static CODE_FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```[A-Za-z0-9_+-]*").expect("code fence regex is valid"));
static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*#{1,6}[ \t]+").expect("heading regex is valid"));
static EMPHASIS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*|__|~~").expect("emphasis regex is valid"));
static BLANK_LINES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*(?:\n[ \t]*)+").expect("blank line regex is valid"));

fn strip_code_fences(raw: &str) -> String {
    CODE_FENCE_RE.replace_all(raw, "").into_owned()
}

fn strip_markdown(raw: &str) -> String {
    let without_headings = HEADING_RE.replace_all(raw, "");
    EMPHASIS_RE.replace_all(&without_headings, "").into_owned()
}

fn collapse_whitespace(raw: &str) -> String {
    let normalized = raw.replace("\r\n", "\n").replace('\t', " ");
    BLANK_LINES_RE.replace_all(&normalized, "\n").into_owned()
}

/// Drops `//` and `/* */` comments outside string literals. Text before the
/// first `{` is prose and is kept untouched.
fn strip_comments(raw: &str) -> String {
    let Some(start) = raw.find('{') else {
        return raw.to_string();
    };
    let (prose, body) = raw.split_at(start);
    let mut out = String::with_capacity(raw.len());
    out.push_str(prose);

    let mut state = ScanState::Normal;
    let mut chars = body.chars().peekable();
    while let Some(ch) = chars.next() {
        if state == ScanState::Normal && ch == '/' {
            match chars.peek() {
                Some('/') => {
                    while chars.peek().is_some_and(|&c| c != '\n') {
                        chars.next();
                    }
                    continue;
                }
                Some('*') => {
                    chars.next();
                    let mut prev = '\0';
                    for c in chars.by_ref() {
                        if prev == '*' && c == '/' {
                            break;
                        }
                        prev = c;
                    }
                    continue;
                }
                _ => {}
            }
        }
        state = state.step(ch, DOUBLE_QUOTE);
        out.push(ch);
    }

    out
}

// ────────────────────────────────────────────────────────────────────────────
// Syntactic repair
// ────────────────────────────────────────────────────────────────────────────

static BARE_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([{,]\s*)([A-Za-z_$][A-Za-z0-9_$-]*)(\s*:)").expect("bare key regex is valid")
});

/// Applied to an extracted span: single quotes to double quotes, trailing
/// commas removed, bare keys quoted.
pub fn repair_json_syntax(span: &str) -> String {
    let converted = convert_single_quotes(span);
    let without_commas = remove_trailing_commas(&converted);
    quote_bare_keys(&without_commas)
}

/// Rewrites `'...'` literals that sit between JSON delimiters
/// (`{ [ , :` before, `: , } ]` after) as double-quoted strings.
fn convert_single_quotes(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut state = ScanState::Normal;
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        if state == ScanState::Normal && ch == '\'' && opens_literal(&out) {
            if let Some(end) = find_closing_single_quote(&chars, i + 1) {
                if closes_literal(&chars[end + 1..]) {
                    out.push('"');
                    push_requoted(&mut out, &chars[i + 1..end]);
                    out.push('"');
                    i = end + 1;
                    continue;
                }
            }
        }
        state = state.step(ch, DOUBLE_QUOTE);
        out.push(ch);
        i += 1;
    }

    out
}

fn opens_literal(emitted: &str) -> bool {
    matches!(
        emitted.trim_end().chars().last(),
        Some('{') | Some('[') | Some(',') | Some(':')
    )
}

fn closes_literal(rest: &[char]) -> bool {
    matches!(
        rest.iter().find(|c| !c.is_whitespace()),
        Some(':') | Some(',') | Some('}') | Some(']')
    )
}

fn find_closing_single_quote(chars: &[char], from: usize) -> Option<usize> {
    let mut i = from;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            '\'' => return Some(i),
            _ => i += 1,
        }
    }
    None
}

fn push_requoted(out: &mut String, inner: &[char]) {
    let mut iter = inner.iter().peekable();
    while let Some(&c) = iter.next() {
        match c {
            '\\' if iter.peek() == Some(&&'\'') => {
                out.push('\'');
                iter.next();
            }
            '\\' => {
                out.push('\\');
                if let Some(&next) = iter.next() {
                    out.push(next);
                }
            }
            '"' => out.push_str("\\\""),
            _ => out.push(c),
        }
    }
}

fn remove_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut state = ScanState::Normal;

    for (i, &ch) in chars.iter().enumerate() {
        if state == ScanState::Normal && ch == ',' {
            let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
            if matches!(next, Some('}') | Some(']')) {
                continue;
            }
        }
        state = state.step(ch, DOUBLE_QUOTE);
        out.push(ch);
    }

    out
}

/// Quotes identifier keys (`{name: 1}` → `{"name": 1}`), touching only text
/// outside string literals.
fn quote_bare_keys(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    let mut segment = String::new();
    let mut state = ScanState::Normal;

    for ch in text.chars() {
        let next = state.step(ch, DOUBLE_QUOTE);
        match (state, next) {
            (ScanState::Normal, ScanState::InString(_)) => {
                out.push_str(&BARE_KEY_RE.replace_all(&segment, "$1\"$2\"$3"));
                segment.clear();
                out.push(ch);
            }
            (ScanState::Normal, _) => segment.push(ch),
            _ => out.push(ch),
        }
        state = next;
    }
    out.push_str(&BARE_KEY_RE.replace_all(&segment, "$1\"$2\"$3"));

    out
}

// ────────────────────────────────────────────────────────────────────────────
// Stage C: heuristic text mining
// ────────────────────────────────────────────────────────────────────────────

/// "score" (or the Korean "점수") followed closely by a number. The whole
/// digit run is captured so an out-of-range value is rejected, not clipped.
static SCORE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:score|점수)[^0-9\n]{0,20}?(\d+)").expect("score regex is valid")
});
static UNSAFE_CHARS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^\p{L}\p{N}\s.,!?'()%:;/-]").expect("sanitize regex is valid")
});

const POSITIVE_WORDS: &[&str] = &[
    "good", "great", "excellent", "strong", "impressive", "solid", "clean", "well-structured",
    "좋", "우수", "훌륭", "뛰어",
];
const IMPROVEMENT_WORDS: &[&str] = &[
    "improve", "lack", "missing", "weak", "should", "could be better", "개선", "부족", "보완",
    "필요",
];

const MINED_STRENGTHS: &[&str] = &[
    "The review highlights positive qualities in the project.",
    "The project demonstrates working, presentable results.",
];
const NEUTRAL_STRENGTHS: &[&str] = &["The project is publicly available for review."];
const MINED_WEAKNESSES: &[&str] = &[
    "The review points out areas that need improvement.",
    "Some parts of the project could be more complete.",
];
const NEUTRAL_WEAKNESSES: &[&str] = &["Specific weaknesses could not be extracted from the analysis."];

const SUMMARY_MIN_CHARS: usize = 20;
const SUMMARY_MAX_SOURCE_CHARS: usize = 5000;
const SUMMARY_EXCERPT_CHARS: usize = 500;
const UNSTRUCTURED_SUMMARY: &str =
    "The analysis could not be fully structured; a default assessment is shown.";

fn mine_text(raw: &str) -> Value {
    let lower = raw.to_lowercase();

    let score = SCORE_RE
        .captures(&lower)
        .and_then(|caps| caps[1].parse::<u32>().ok())
        .filter(|score| *score <= 100)
        .unwrap_or(DEFAULT_OVERALL_SCORE);

    let strengths = if POSITIVE_WORDS.iter().any(|w| lower.contains(w)) {
        MINED_STRENGTHS
    } else {
        NEUTRAL_STRENGTHS
    };
    let weaknesses = if IMPROVEMENT_WORDS.iter().any(|w| lower.contains(w)) {
        MINED_WEAKNESSES
    } else {
        NEUTRAL_WEAKNESSES
    };

    let trimmed = raw.trim();
    let length = trimmed.chars().count();
    let summary = if (SUMMARY_MIN_CHARS..=SUMMARY_MAX_SOURCE_CHARS).contains(&length) {
        sanitize_excerpt(trimmed)
    } else {
        UNSTRUCTURED_SUMMARY.to_string()
    };

    json!({
        "summary": summary,
        "strengths": strengths,
        "weaknesses": weaknesses,
        "technicalFeedback": {
            "codeReview": FALLBACK_TEXT,
            "bestPractices": FALLBACK_TEXT,
            "techStack": FALLBACK_TEXT,
        },
        "documentationFeedback": {
            "readmeReview": FALLBACK_TEXT,
            "blogReview": FALLBACK_TEXT,
        },
        "projectAnalysis": {
            "complexity": DEFAULT_COMPLEXITY,
            "completeness": DEFAULT_COMPLETENESS,
            "innovation": DEFAULT_INNOVATION,
        },
        "overallScore": score,
        "nextSteps": FALLBACK_NEXT_STEPS,
    })
}

fn sanitize_excerpt(text: &str) -> String {
    let stripped = UNSAFE_CHARS_RE.replace_all(text, " ");
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    let excerpt = truncate_chars(&collapsed, SUMMARY_EXCERPT_CHARS);
    if excerpt.is_empty() {
        UNSTRUCTURED_SUMMARY.to_string()
    } else {
        excerpt.to_string()
    }
}
