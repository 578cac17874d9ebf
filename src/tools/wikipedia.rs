//! Encyclopedia lookup through the MediaWiki API.

use async_trait::async_trait;
use serde::Deserialize;

use super::{truncate_chars, ResultLimits, Tool};

const API_URL: &str = "https://en.wikipedia.org/w/api.php";
const TOP_K_RESULTS: usize = 1;
const MAX_CHARS: usize = 200;
const MAX_QUERY_CHARS: usize = 300;
const NO_RESULT: &str = "No good Wikipedia Search Result was found";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    #[serde(default)]
    query: Option<ExtractQuery>,
}

#[derive(Debug, Deserialize)]
struct ExtractQuery {
    #[serde(default)]
    pages: Vec<ExtractPage>,
}

#[derive(Debug, Deserialize)]
struct ExtractPage {
    title: String,
    #[serde(default)]
    extract: Option<String>,
    #[serde(default)]
    missing: bool,
}

/// Top Wikipedia article summary for a query.
pub struct WikipediaSearch {
    http: reqwest::Client,
}

impl WikipediaSearch {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    async fn search_titles(&self, query: &str) -> anyhow::Result<Vec<String>> {
        let limit = TOP_K_RESULTS.to_string();
        let response: SearchResponse = self
            .http
            .get(API_URL)
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", limit.as_str()),
                ("format", "json"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(titles_from_search(response))
    }

    async fn page_summary(&self, title: &str) -> anyhow::Result<Option<(String, String)>> {
        let response: ExtractResponse = self
            .http
            .get(API_URL)
            .query(&[
                ("action", "query"),
                ("prop", "extracts"),
                ("exintro", "1"),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("titles", title),
                ("format", "json"),
                ("formatversion", "2"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(summary_from_extract(response))
    }
}

#[async_trait]
impl Tool for WikipediaSearch {
    fn name(&self) -> &str {
        "wikipedia"
    }

    fn description(&self) -> &str {
        "A wrapper around Wikipedia. Useful for when you need to answer general questions about people, places, companies, facts, historical events, or other subjects. Input should be a search query."
    }

    fn provider(&self) -> &str {
        "en.wikipedia.org"
    }

    fn limits(&self) -> ResultLimits {
        ResultLimits {
            top_k_results: TOP_K_RESULTS,
            max_chars: Some(MAX_CHARS),
        }
    }

    async fn run(&self, query: &str) -> anyhow::Result<String> {
        let query = truncate_chars(query.trim(), MAX_QUERY_CHARS);
        tracing::debug!(tool = "wikipedia", query = %query, "Looking up Wikipedia");

        let mut summaries = Vec::new();
        for title in self.search_titles(&query).await? {
            if let Some((page, summary)) = self.page_summary(&title).await? {
                summaries.push(format!("Page: {}\nSummary: {}", page, summary));
            }
        }

        if summaries.is_empty() {
            return Ok(NO_RESULT.to_string());
        }
        Ok(truncate_chars(&summaries.join("\n\n"), MAX_CHARS))
    }
}

fn titles_from_search(response: SearchResponse) -> Vec<String> {
    response
        .query
        .map(|q| q.search.into_iter().map(|hit| hit.title).take(TOP_K_RESULTS).collect())
        .unwrap_or_default()
}

fn summary_from_extract(response: ExtractResponse) -> Option<(String, String)> {
    response
        .query?
        .pages
        .into_iter()
        .find(|page| !page.missing)
        .and_then(|page| {
            let extract = page.extract?.trim().to_string();
            (!extract.is_empty()).then_some((page.title, extract))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_response_yields_top_title_only() {
        let response: SearchResponse = serde_json::from_str(
            r#"{"batchcomplete":"","query":{"searchinfo":{"totalhits":2},"search":[
                {"ns":0,"title":"Machine learning","pageid":233488},
                {"ns":0,"title":"Deep learning","pageid":32472154}
            ]}}"#,
        )
        .unwrap();
        assert_eq!(titles_from_search(response), vec!["Machine learning".to_string()]);
    }

    #[test]
    fn empty_search_yields_no_titles() {
        let response: SearchResponse =
            serde_json::from_str(r#"{"batchcomplete":"","query":{"search":[]}}"#).unwrap();
        assert!(titles_from_search(response).is_empty());
        let response: SearchResponse = serde_json::from_str(r#"{"error":{}}"#).unwrap();
        assert!(titles_from_search(response).is_empty());
    }

    #[test]
    fn extract_response_gives_title_and_summary() {
        let response: ExtractResponse = serde_json::from_str(
            r#"{"batchcomplete":true,"query":{"pages":[
                {"pageid":233488,"ns":0,"title":"Machine learning","extract":"Machine learning (ML) is a field of study.\n"}
            ]}}"#,
        )
        .unwrap();
        assert_eq!(
            summary_from_extract(response),
            Some((
                "Machine learning".to_string(),
                "Machine learning (ML) is a field of study.".to_string()
            ))
        );
    }

    #[test]
    fn missing_page_gives_none() {
        let response: ExtractResponse = serde_json::from_str(
            r#"{"query":{"pages":[{"ns":0,"title":"Nope","missing":true}]}}"#,
        )
        .unwrap();
        assert_eq!(summary_from_extract(response), None);
    }

    #[test]
    fn rendered_summary_is_capped_at_200_chars() {
        let long = "x".repeat(500);
        let rendered = truncate_chars(&format!("Page: ML\nSummary: {}", long), MAX_CHARS);
        assert_eq!(rendered.chars().count(), 200);
        assert!(rendered.starts_with("Page: ML\nSummary: x"));
    }
}
