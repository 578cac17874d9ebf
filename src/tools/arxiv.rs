//! Academic paper lookup through the arXiv Atom API.

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;

use super::{html_decode, squash_whitespace, truncate_chars, ResultLimits, Tool};

const API_URL: &str = "https://export.arxiv.org/api/query";
const TOP_K_RESULTS: usize = 1;
const MAX_CHARS: usize = 200;
const MAX_QUERY_CHARS: usize = 300;
const NO_RESULT: &str = "No good Arxiv Result was found";

/// One paper from an Atom feed.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Paper {
    published: String,
    title: String,
    authors: Vec<String>,
    summary: String,
}

impl Paper {
    fn render(&self) -> String {
        format!(
            "Published: {}\nTitle: {}\nAuthors: {}\nSummary: {}",
            self.published,
            self.title,
            self.authors.join(", "),
            self.summary
        )
    }
}

/// Top arXiv paper abstract for a query.
pub struct ArxivSearch {
    http: reqwest::Client,
    api_url: String,
}

impl ArxivSearch {
    pub fn new(http: reqwest::Client) -> Self {
        Self::with_api_url(http, API_URL)
    }

    pub fn with_api_url(http: reqwest::Client, api_url: impl Into<String>) -> Self {
        Self {
            http,
            api_url: api_url.into(),
        }
    }

    async fn fetch_feed(&self, query: &str) -> anyhow::Result<String> {
        let search_query = format!("all:{}", query);
        let max_results = TOP_K_RESULTS.to_string();
        let feed = self
            .http
            .get(&self.api_url)
            .query(&[
                ("search_query", search_query.as_str()),
                ("start", "0"),
                ("max_results", max_results.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(feed)
    }
}

#[async_trait]
impl Tool for ArxivSearch {
    fn name(&self) -> &str {
        "arxiv"
    }

    fn description(&self) -> &str {
        "A wrapper around Arxiv.org Useful for when you need to answer questions about Physics, Mathematics, Computer Science, Quantitative Biology, Quantitative Finance, Statistics, Electrical Engineering, and Economics from scientific articles on arxiv.org. Input should be a search query."
    }

    fn provider(&self) -> &str {
        "export.arxiv.org"
    }

    fn limits(&self) -> ResultLimits {
        ResultLimits {
            top_k_results: TOP_K_RESULTS,
            max_chars: Some(MAX_CHARS),
        }
    }

    async fn run(&self, query: &str) -> anyhow::Result<String> {
        let query = truncate_chars(query.trim(), MAX_QUERY_CHARS);
        tracing::debug!(tool = "arxiv", query = %query, "Looking up arXiv");

        // arXiv failures go back to the model as an observation instead of
        // ending the run.
        let feed = match self.fetch_feed(&query).await {
            Ok(feed) => feed,
            Err(e) => {
                tracing::warn!(tool = "arxiv", error = %e, "arXiv request failed");
                return Ok(format!("Arxiv exception: {:#}", e));
            }
        };

        let papers = parse_feed(&feed, TOP_K_RESULTS);
        if papers.is_empty() {
            return Ok(NO_RESULT.to_string());
        }
        let rendered = papers.iter().map(Paper::render).collect::<Vec<_>>().join("\n\n");
        Ok(truncate_chars(&rendered, MAX_CHARS))
    }
}

fn entry_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<entry>(.*?)</entry>").expect("valid entry regex"))
}

fn author_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)<author>\s*<name>(.*?)</name>").expect("valid author regex")
    })
}

/// Text content of the first `<tag>...</tag>` in `entry`.
fn element_text(entry: &str, tag: &str) -> Option<String> {
    let open = format!("<{}", tag);
    let close = format!("</{}>", tag);
    let start = entry.find(&open)?;
    let after_open = start + entry[start..].find('>')? + 1;
    let end = after_open + entry[after_open..].find(&close)?;
    Some(squash_whitespace(&html_decode(&entry[after_open..end])))
}

/// Parse up to `limit` papers out of an arXiv Atom feed.
fn parse_feed(feed: &str, limit: usize) -> Vec<Paper> {
    entry_re()
        .captures_iter(feed)
        .filter_map(|caps| {
            let entry = caps.get(1)?.as_str();
            let title = element_text(entry, "title")?;
            // The rendered `Published:` date is the latest revision date.
            let published = element_text(entry, "updated")
                .or_else(|| element_text(entry, "published"))
                .map(|p| p.split('T').next().unwrap_or_default().to_string())
                .unwrap_or_default();
            let authors = author_re()
                .captures_iter(entry)
                .filter_map(|a| a.get(1).map(|m| squash_whitespace(m.as_str())))
                .collect();
            let summary = element_text(entry, "summary").unwrap_or_default();
            Some(Paper {
                published,
                title,
                authors,
                summary,
            })
        })
        .take(limit)
        .collect()
}
