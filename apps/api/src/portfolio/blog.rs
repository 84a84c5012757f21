//! Blog content fetching and main-text extraction.
//!
//! A blog failure never fails the request: the error becomes a readable
//! placeholder in `blog_text` and the pipeline carries on.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use crate::portfolio::{truncate_chars, SourceError};

pub const BLOG_TEXT_MAX_CHARS: usize = 5000;

/// A selector only wins if its text is longer than this.
const MIN_CONTENT_CHARS: usize = 100;

/// Some hosting platforms refuse requests without a browser user agent.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Tried in order; the first with enough text wins.
const CONTENT_SELECTORS: &[&str] = &[
    "article",
    ".post-content",
    ".post-body",
    ".entry-content",
    ".content",
    ".post",
    "main",
    "[role=\"main\"]",
    ".markdown-body",
];

const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "template"];

// ────────────────────────────────────────────────────────────────────────────
// PageFetcher trait
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub timeout: Duration,
    pub headers: Vec<(&'static str, String)>,
}

#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub body: String,
    pub content_type: Option<String>,
}

/// Generic HTTP GET used for blog pages.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<FetchedPage, SourceError>;
}

#[derive(Clone, Default)]
pub struct HttpPageFetcher {
    client: Client,
}

impl HttpPageFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<FetchedPage, SourceError> {
        let mut request = self.client.get(url).timeout(options.timeout);
        for (name, value) in &options.headers {
            request = request.header(*name, value);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let body = response.text().await?;

        Ok(FetchedPage { body, content_type })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Fetch + extract
// ────────────────────────────────────────────────────────────────────────────

/// Returns the blog's main text, `""` when no URL was given, or a placeholder
/// message when the fetch failed. Never fails.
pub async fn fetch_blog_text(
    fetcher: &dyn PageFetcher,
    url: Option<&str>,
    timeout: Duration,
) -> String {
    let Some(url) = url else {
        return String::new();
    };

    let options = FetchOptions {
        timeout,
        headers: vec![
            ("User-Agent", BROWSER_USER_AGENT.to_string()),
            ("Accept", "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8".to_string()),
        ],
    };

    match fetcher.fetch(url, &options).await {
        Ok(page) => {
            debug!(
                url,
                content_type = page.content_type.as_deref().unwrap_or("unknown"),
                "Fetched blog page"
            );
            let text = extract_main_text(&page.body);
            if text.is_empty() {
                format!("The blog page at {url} contained no readable text.")
            } else {
                truncate_chars(&text, BLOG_TEXT_MAX_CHARS).to_string()
            }
        }
        Err(e) => {
            warn!(url, error = %e, "Blog fetch failed");
            format!("The blog content could not be retrieved ({e}).")
        }
    }
}

/// Picks the page's main content using `CONTENT_SELECTORS`, falling back to
/// the whole page's visible text. Whitespace is collapsed.
pub fn extract_main_text(html: &str) -> String {
    let document = Html::parse_document(html);

    for raw in CONTENT_SELECTORS {
        let selector = match Selector::parse(raw) {
            Ok(selector) => selector,
            Err(e) => {
                warn!(selector = raw, "Skipping unparseable selector: {e:?}");
                continue;
            }
        };
        let text = document
            .select(&selector)
            .map(visible_text)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if text.chars().count() > MIN_CONTENT_CHARS {
            debug!(selector = raw, "Blog content matched selector");
            return text;
        }
    }

    visible_text(document.root_element())
}

fn visible_text(element: ElementRef<'_>) -> String {
    let mut words: Vec<&str> = Vec::new();
    for node in element.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| HIDDEN_TAGS.contains(&el.name()))
        });
        if !hidden {
            words.extend(text.split_whitespace());
        }
    }
    words.join(" ")
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Returns a canned body (or error) and records the options it was given.
    pub(crate) struct FakeFetcher {
        pub body: Option<String>,
        pub seen: Mutex<Vec<FetchOptions>>,
    }

    impl FakeFetcher {
        pub(crate) fn serving(body: &str) -> Self {
            Self {
                body: Some(body.to_string()),
                seen: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn failing() -> Self {
            Self {
                body: None,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PageFetcher for FakeFetcher {
        async fn fetch(
            &self,
            url: &str,
            options: &FetchOptions,
        ) -> Result<FetchedPage, SourceError> {
            self.seen.lock().unwrap().push(options.clone());
            match &self.body {
                Some(body) => Ok(FetchedPage {
                    body: body.clone(),
                    content_type: Some("text/html".into()),
                }),
                None => Err(SourceError::Status {
                    status: 403,
                    url: url.to_string(),
                }),
            }
        }
    }

    fn long_text(word: &str) -> String {
        vec![word; 40].join(" ")
    }

    #[test]
    fn test_article_wins_when_long_enough() {
        let html = format!(
            "<html><body><nav>Menu Home About</nav><article><p>{}</p></article></body></html>",
            long_text("rust")
        );
        let text = extract_main_text(&html);
        assert!(text.starts_with("rust rust"));
        assert!(!text.contains("Menu"));
    }

    #[test]
    fn test_short_match_falls_through_to_next_selector() {
        let html = format!(
            "<html><body><article>Too short</article><div class=\"entry-content\">{}</div></body></html>",
            long_text("entry")
        );
        let text = extract_main_text(&html);
        assert!(text.starts_with("entry entry"));
        assert!(!text.contains("Too short"));
    }

    #[test]
    fn test_markdown_body_is_recognized() {
        let html = format!(
            "<html><body><div class=\"markdown-body\">{}</div></body></html>",
            long_text("md")
        );
        assert!(extract_main_text(&html).starts_with("md md"));
    }

    #[test]
    fn test_falls_back_to_whole_page_without_scripts() {
        let html = "<html><head><title>T</title><style>body{color:red}</style></head>\
            <body><div>Hello   world</div><script>var x = 1;</script></body></html>";
        let text = extract_main_text(html);
        assert_eq!(text, "T Hello world");
    }

    #[tokio::test]
    async fn test_no_url_yields_empty_text() {
        let fetcher = FakeFetcher::serving("<p>unused</p>");
        let text = fetch_blog_text(&fetcher, None, Duration::from_secs(10)).await;
        assert_eq!(text, "");
        assert!(fetcher.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_becomes_placeholder() {
        let fetcher = FakeFetcher::failing();
        let text = fetch_blog_text(&fetcher, Some("https://blog.example/p"), Duration::from_secs(10)).await;
        assert!(text.contains("could not be retrieved"));
    }

    #[tokio::test]
    async fn test_fetch_sends_browser_user_agent_and_timeout() {
        let fetcher = FakeFetcher::serving("<p>hi</p>");
        fetch_blog_text(&fetcher, Some("https://blog.example/p"), Duration::from_secs(10)).await;
        let seen = fetcher.seen.lock().unwrap();
        assert_eq!(seen[0].timeout, Duration::from_secs(10));
        assert!(seen[0]
            .headers
            .iter()
            .any(|(name, value)| *name == "User-Agent" && value.starts_with("Mozilla/5.0")));
    }

    #[tokio::test]
    async fn test_blog_text_is_truncated() {
        let html = format!("<article>{}</article>", "a".repeat(BLOG_TEXT_MAX_CHARS * 2));
        let fetcher = FakeFetcher::serving(&html);
        let text = fetch_blog_text(&fetcher, Some("https://blog.example/p"), Duration::from_secs(10)).await;
        assert_eq!(text.chars().count(), BLOG_TEXT_MAX_CHARS);
    }
}
