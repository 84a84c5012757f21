//! Repository source aggregation.
//!
//! `parse_repo_url` is the only fatal step: a URL that does not name an
//! `owner/repo` pair is rejected. Everything after it is best-effort. Each
//! lookup that fails is logged and replaced by an empty value, so
//! `fetch_repository_sources` always returns a fully populated `RepoSources`.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use regex::Regex;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::portfolio::models::{RepoMeta, RepoRef, RepoSources, SourceSnippet};
use crate::portfolio::{truncate_chars, SourceError};

pub const MAX_SNIPPET_FILES: usize = 5;
pub const MAX_SNIPPET_CHARS: usize = 2000;

/// Probed in this order against the root listing.
const MANIFEST_CANDIDATES: &[&str] = &[
    "package.json",
    "Cargo.toml",
    "pyproject.toml",
    "requirements.txt",
    "go.mod",
    "pom.xml",
    "build.gradle",
    "Gemfile",
    "composer.json",
];

/// Tried blind when the root listing is unavailable.
const FALLBACK_MANIFEST: &str = "package.json";

const SOURCE_EXTENSIONS: &[&str] = &[
    "js", "jsx", "ts", "tsx", "py", "java", "kt", "rs", "go", "rb", "php", "c", "cpp", "h",
    "cs", "swift", "scala", "dart", "vue",
];

static REPO_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:https?://)?(?:www\.)?[A-Za-z0-9.-]+(?::\d+)?/([A-Za-z0-9_.-]+)/([A-Za-z0-9_.-]+)/?(?:[/?#].*)?$",
    )
    .expect("repository URL regex is valid")
});

/// Extracts `(owner, repo)` from a code-hosting URL such as
/// `https://github.com/owner/repo` (trailing `.git` and sub-paths allowed).
pub fn parse_repo_url(url: &str) -> Result<RepoRef, AppError> {
    let trimmed = url.trim();
    let invalid = || AppError::InvalidSourceUrl(trimmed.to_string());

    let caps = REPO_URL_RE.captures(trimmed).ok_or_else(invalid)?;
    let owner = &caps[1];
    let repo = caps[2].trim_end_matches(".git");

    if [owner, repo].iter().any(|s| s.is_empty() || *s == "." || *s == "..") {
        return Err(invalid());
    }

    Ok(RepoRef {
        owner: owner.to_string(),
        repo: repo.to_string(),
    })
}

// ────────────────────────────────────────────────────────────────────────────
// CodeHost trait
// ────────────────────────────────────────────────────────────────────────────

/// One entry of a repository's root directory listing.
#[derive(Debug, Clone, PartialEq)]
pub struct RootEntry {
    pub name: String,
    pub path: String,
    pub is_file: bool,
}

/// Code-hosting data access. Each call may fail independently; callers
/// decide what a failure means.
#[async_trait]
pub trait CodeHost: Send + Sync {
    async fn repo_metadata(&self, repo: &RepoRef) -> Result<RepoMeta, SourceError>;
    async fn readme(&self, repo: &RepoRef) -> Result<String, SourceError>;
    async fn file_content(&self, repo: &RepoRef, path: &str) -> Result<String, SourceError>;
    async fn list_root(&self, repo: &RepoRef) -> Result<Vec<RootEntry>, SourceError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Aggregation
// ────────────────────────────────────────────────────────────────────────────

/// Fetches metadata, README, manifest and up to five source snippets.
/// Never fails.
pub async fn fetch_repository_sources(host: &dyn CodeHost, repo: &RepoRef) -> RepoSources {
    let (meta, readme, listing) = tokio::join!(
        host.repo_metadata(repo),
        host.readme(repo),
        host.list_root(repo)
    );

    let meta = meta.unwrap_or_else(|e| {
        warn!(owner = %repo.owner, repo = %repo.repo, error = %e, "Repository metadata unavailable");
        RepoMeta::placeholder(repo)
    });
    let readme = readme.unwrap_or_else(|e| {
        warn!(owner = %repo.owner, repo = %repo.repo, error = %e, "README unavailable");
        String::new()
    });
    let listing = match listing {
        Ok(entries) => Some(entries),
        Err(e) => {
            warn!(owner = %repo.owner, repo = %repo.repo, error = %e, "Root listing unavailable");
            None
        }
    };

    let manifest_path = pick_manifest(listing.as_deref());
    let source_files = listing
        .as_deref()
        .map(pick_source_files)
        .unwrap_or_default();

    let manifest = async {
        let Some(path) = manifest_path else {
            return String::new();
        };
        host.file_content(repo, path).await.unwrap_or_else(|e| {
            warn!(
                owner = %repo.owner,
                repo = %repo.repo,
                path,
                error = %e,
                "Manifest unavailable"
            );
            String::new()
        })
    };
    let snippets = join_all(source_files.into_iter().map(|entry| async move {
        match host.file_content(repo, &entry.path).await {
            Ok(content) => Some(SourceSnippet {
                filename: entry.name,
                content: truncate_chars(&content, MAX_SNIPPET_CHARS).to_string(),
            }),
            Err(e) => {
                warn!(
                    owner = %repo.owner,
                    repo = %repo.repo,
                    path = %entry.path,
                    error = %e,
                    "Source file unavailable"
                );
                None
            }
        }
    }));

    let (manifest, snippets) = tokio::join!(manifest, snippets);
    let snippets: Vec<SourceSnippet> = snippets.into_iter().flatten().collect();

    debug!(
        "Collected sources for {}/{}: readme={} chars, manifest={} chars, snippets={}",
        repo.owner,
        repo.repo,
        readme.len(),
        manifest.len(),
        snippets.len()
    );

    RepoSources {
        meta,
        readme,
        manifest,
        snippets,
    }
}

fn pick_manifest(listing: Option<&[RootEntry]>) -> Option<&'static str> {
    let Some(entries) = listing else {
        return Some(FALLBACK_MANIFEST);
    };
    MANIFEST_CANDIDATES
        .iter()
        .copied()
        .find(|candidate| entries.iter().any(|e| e.is_file && e.name == *candidate))
}

fn pick_source_files(entries: &[RootEntry]) -> Vec<RootEntry> {
    entries
        .iter()
        .filter(|e| e.is_file && is_source_file(&e.name))
        .take(MAX_SNIPPET_FILES)
        .cloned()
        .collect()
}

fn is_source_file(name: &str) -> bool {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            SOURCE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
        }
        _ => false,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// GitHub REST implementation
// ────────────────────────────────────────────────────────────────────────────

const RAW_MEDIA_TYPE: &str = "application/vnd.github.raw+json";
const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";
const USER_AGENT: &str = concat!("brain-api/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct GitHubRepo {
    name: String,
    description: Option<String>,
    language: Option<String>,
    #[serde(default)]
    stargazers_count: u64,
    #[serde(default)]
    forks_count: u64,
    #[serde(default)]
    topics: Vec<String>,
    #[serde(default)]
    created_at: String,
    #[serde(default)]
    updated_at: String,
}

impl From<GitHubRepo> for RepoMeta {
    fn from(repo: GitHubRepo) -> Self {
        RepoMeta {
            name: repo.name,
            description: repo.description,
            primary_language: repo.language,
            star_count: repo.stargazers_count,
            fork_count: repo.forks_count,
            topics: repo.topics,
            created_at: repo.created_at,
            updated_at: repo.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GitHubContentItem {
    name: String,
    path: String,
    #[serde(rename = "type")]
    item_type: String,
}

/// GitHub REST v3 client. Built once from config and shared by all requests.
#[derive(Clone)]
pub struct GitHubClient {
    client: Client,
    api_url: String,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(
        api_url: String,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, SourceError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn request(&self, path: &str, accept: &str) -> RequestBuilder {
        let builder = self
            .client
            .get(format!("{}{}", self.api_url, path))
            .header("User-Agent", USER_AGENT)
            .header("Accept", accept)
            .header("X-GitHub-Api-Version", "2022-11-28");
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn get_ok(&self, path: &str, accept: &str) -> Result<Response, SourceError> {
        let response = self.request(path, accept).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                url: response.url().to_string(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl CodeHost for GitHubClient {
    async fn repo_metadata(&self, repo: &RepoRef) -> Result<RepoMeta, SourceError> {
        let path = format!("/repos/{}/{}", repo.owner, repo.repo);
        let body: GitHubRepo = self.get_ok(&path, JSON_MEDIA_TYPE).await?.json().await?;
        Ok(body.into())
    }

    async fn readme(&self, repo: &RepoRef) -> Result<String, SourceError> {
        let path = format!("/repos/{}/{}/readme", repo.owner, repo.repo);
        Ok(self.get_ok(&path, RAW_MEDIA_TYPE).await?.text().await?)
    }

    async fn file_content(&self, repo: &RepoRef, file: &str) -> Result<String, SourceError> {
        let path = format!("/repos/{}/{}/contents/{}", repo.owner, repo.repo, file);
        Ok(self.get_ok(&path, RAW_MEDIA_TYPE).await?.text().await?)
    }

    async fn list_root(&self, repo: &RepoRef) -> Result<Vec<RootEntry>, SourceError> {
        let path = format!("/repos/{}/{}/contents", repo.owner, repo.repo);
        let items: Vec<GitHubContentItem> =
            self.get_ok(&path, JSON_MEDIA_TYPE).await?.json().await?;
        Ok(items
            .into_iter()
            .map(|item| RootEntry {
                is_file: item.item_type == "file",
                name: item.name,
                path: item.path,
            })
            .collect())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;

    /// In-memory code host. Files missing from `files` fail with 404.
    #[derive(Default)]
    pub(crate) struct FakeHost {
        pub meta: Option<RepoMeta>,
        pub readme: Option<String>,
        pub listing: Option<Vec<RootEntry>>,
        pub files: HashMap<String, String>,
    }

    fn not_found(what: &str) -> SourceError {
        SourceError::Status {
            status: 404,
            url: what.to_string(),
        }
    }

    pub(crate) fn file(name: &str) -> RootEntry {
        RootEntry {
            name: name.to_string(),
            path: name.to_string(),
            is_file: true,
        }
    }

    #[async_trait]
    impl CodeHost for FakeHost {
        async fn repo_metadata(&self, _repo: &RepoRef) -> Result<RepoMeta, SourceError> {
            self.meta.clone().ok_or_else(|| not_found("meta"))
        }
        async fn readme(&self, _repo: &RepoRef) -> Result<String, SourceError> {
            self.readme.clone().ok_or_else(|| not_found("readme"))
        }
        async fn file_content(&self, _repo: &RepoRef, path: &str) -> Result<String, SourceError> {
            self.files.get(path).cloned().ok_or_else(|| not_found(path))
        }
        async fn list_root(&self, _repo: &RepoRef) -> Result<Vec<RootEntry>, SourceError> {
            self.listing.clone().ok_or_else(|| not_found("listing"))
        }
    }

    fn repo_ref() -> RepoRef {
        RepoRef {
            owner: "ownerA".into(),
            repo: "repoB".into(),
        }
    }

    fn meta() -> RepoMeta {
        RepoMeta {
            name: "repoB".into(),
            description: Some("A demo".into()),
            primary_language: Some("Rust".into()),
            star_count: 12,
            fork_count: 3,
            topics: vec!["cli".into()],
            created_at: "2024-01-01T00:00:00Z".into(),
            updated_at: "2024-06-01T00:00:00Z".into(),
        }
    }

    #[test]
    fn test_parse_repo_url_extracts_owner_and_repo() {
        let parsed = parse_repo_url("https://codehost.example/ownerA/repoB").unwrap();
        assert_eq!(parsed, repo_ref());
    }

    #[test]
    fn test_parse_repo_url_accepts_git_suffix_and_subpaths() {
        let parsed = parse_repo_url("https://github.com/ownerA/repoB.git").unwrap();
        assert_eq!(parsed.repo, "repoB");
        let parsed = parse_repo_url("https://github.com/ownerA/repoB/tree/main/src").unwrap();
        assert_eq!(parsed, repo_ref());
        let parsed = parse_repo_url("github.com/ownerA/repoB/").unwrap();
        assert_eq!(parsed, repo_ref());
    }

    #[test]
    fn test_parse_repo_url_rejects_single_segment() {
        let err = parse_repo_url("https://example.com/not-a-repo").unwrap_err();
        assert!(matches!(err, AppError::InvalidSourceUrl(_)));
    }

    #[test]
    fn test_parse_repo_url_rejects_garbage() {
        assert!(parse_repo_url("").is_err());
        assert!(parse_repo_url("not a url at all").is_err());
        assert!(parse_repo_url("https://github.com/../repo").is_err());
    }

    #[test]
    fn test_is_source_file_matches_extensions() {
        assert!(is_source_file("main.rs"));
        assert!(is_source_file("App.TSX"));
        assert!(!is_source_file("README.md"));
        assert!(!is_source_file(".rs"));
        assert!(!is_source_file("Makefile"));
    }

    #[test]
    fn test_pick_manifest_prefers_candidate_order() {
        let entries = vec![file("requirements.txt"), file("Cargo.toml")];
        assert_eq!(pick_manifest(Some(entries.as_slice())), Some("Cargo.toml"));
        assert_eq!(pick_manifest(Some(&[file("main.c")][..])), None);
        assert_eq!(pick_manifest(None), Some("package.json"));
    }

    #[test]
    fn test_github_repo_maps_to_meta() {
        let body = serde_json::json!({
            "name": "repoB",
            "description": null,
            "language": "Go",
            "stargazers_count": 5,
            "forks_count": 1,
            "topics": ["api"],
            "created_at": "2023-01-01T00:00:00Z",
            "updated_at": "2023-02-01T00:00:00Z"
        });
        let repo: GitHubRepo = serde_json::from_value(body).unwrap();
        let meta: RepoMeta = repo.into();
        assert_eq!(meta.primary_language.as_deref(), Some("Go"));
        assert_eq!(meta.star_count, 5);
        assert!(meta.description.is_none());
    }

    #[tokio::test]
    async fn test_fetch_collects_all_sources() {
        let mut files = HashMap::new();
        files.insert("package.json".to_string(), "{\"name\":\"demo\"}".to_string());
        files.insert("index.js".to_string(), "console.log(1)".to_string());
        let host = FakeHost {
            meta: Some(meta()),
            readme: Some("# Demo".into()),
            listing: Some(vec![file("package.json"), file("index.js"), file("LICENSE")]),
            files,
        };

        let sources = fetch_repository_sources(&host, &repo_ref()).await;
        assert_eq!(sources.meta, meta());
        assert_eq!(sources.readme, "# Demo");
        assert_eq!(sources.manifest, "{\"name\":\"demo\"}");
        assert_eq!(sources.snippets.len(), 1);
        assert_eq!(sources.snippets[0].filename, "index.js");
    }

    #[tokio::test]
    async fn test_readme_failure_yields_empty_readme() {
        let host = FakeHost {
            meta: Some(meta()),
            readme: None,
            listing: Some(vec![]),
            ..FakeHost::default()
        };
        let sources = fetch_repository_sources(&host, &repo_ref()).await;
        assert_eq!(sources.readme, "");
        assert_eq!(sources.meta.name, "repoB");
        assert_eq!(sources.manifest, "");
    }

    #[tokio::test]
    async fn test_snippets_capped_in_count_and_length() {
        let names = ["a.rs", "b.rs", "c.py", "d.go", "e.ts", "f.java", "g.rb"];
        let mut files = HashMap::new();
        for name in names {
            files.insert(name.to_string(), "x".repeat(MAX_SNIPPET_CHARS + 500));
        }
        let host = FakeHost {
            meta: Some(meta()),
            readme: Some(String::new()),
            listing: Some(names.iter().map(|n| file(n)).collect()),
            files,
        };

        let sources = fetch_repository_sources(&host, &repo_ref()).await;
        assert_eq!(sources.snippets.len(), MAX_SNIPPET_FILES);
        assert_eq!(sources.snippets[0].filename, "a.rs");
        assert!(sources
            .snippets
            .iter()
            .all(|s| s.content.chars().count() == MAX_SNIPPET_CHARS));
    }

    #[tokio::test]
    async fn test_failing_snippet_is_skipped() {
        let mut files = HashMap::new();
        files.insert("ok.rs".to_string(), "fn main() {}".to_string());
        let host = FakeHost {
            meta: Some(meta()),
            readme: Some(String::new()),
            listing: Some(vec![file("missing.rs"), file("ok.rs")]),
            files,
        };
        let sources = fetch_repository_sources(&host, &repo_ref()).await;
        assert_eq!(sources.snippets.len(), 1);
        assert_eq!(sources.snippets[0].filename, "ok.rs");
    }

    #[tokio::test]
    async fn test_listing_failure_falls_back_to_package_json() {
        let mut files = HashMap::new();
        files.insert("package.json".to_string(), "{}".to_string());
        let host = FakeHost {
            meta: Some(meta()),
            readme: Some("readme".into()),
            listing: None,
            files,
        };
        let sources = fetch_repository_sources(&host, &repo_ref()).await;
        assert!(sources.snippets.is_empty());
        assert_eq!(sources.manifest, "{}");
    }

    #[tokio::test]
    async fn test_everything_failing_still_yields_defined_sources() {
        let host = FakeHost::default();
        let sources = fetch_repository_sources(&host, &repo_ref()).await;
        assert_eq!(sources.meta, RepoMeta::placeholder(&repo_ref()));
        assert_eq!(sources.readme, "");
        assert_eq!(sources.manifest, "");
        assert!(sources.snippets.is_empty());
    }
}
