//! Web search through DuckDuckGo's HTML endpoint (no API key needed).

use async_trait::async_trait;

use super::{html_decode, squash_whitespace, ResultLimits, Tool};

const MAX_RESULTS: usize = 5;

/// General web search.
pub struct WebSearch {
    http: reqwest::Client,
}

impl WebSearch {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Tool for WebSearch {
    fn name(&self) -> &str {
        "Search"
    }

    fn description(&self) -> &str {
        "A wrapper around DuckDuckGo Search. Useful for when you need to answer questions about current events. Input should be a search query."
    }

    fn provider(&self) -> &str {
        "duckduckgo.com"
    }

    fn limits(&self) -> ResultLimits {
        ResultLimits {
            top_k_results: MAX_RESULTS,
            max_chars: None,
        }
    }

    async fn run(&self, query: &str) -> anyhow::Result<String> {
        let encoded_query = urlencoding::encode(query.trim());
        let url = format!("https://html.duckduckgo.com/html/?q={}", encoded_query);

        tracing::debug!(tool = "Search", query = %query, "Running web search");

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow::anyhow!("DuckDuckGo returned HTTP {}", status));
        }
        let html = response.text().await?;

        let snippets = extract_ddg_snippets(&html, MAX_RESULTS);
        if snippets.is_empty() {
            Ok("No good DuckDuckGo Search Result was found".to_string())
        } else {
            Ok(snippets.join(" "))
        }
    }
}

/// Pull result snippets out of DuckDuckGo's HTML results page.
fn extract_ddg_snippets(html: &str, limit: usize) -> Vec<String> {
    html.split("result__body\"")
        .skip(1)
        .filter_map(|chunk| {
            let raw = chunk
                .split("class=\"result__snippet\"")
                .nth(1)?
                .split_once('>')?
                .1
                .split("</a>")
                .next()?;
            let snippet = squash_whitespace(&html_decode(&strip_tags(raw)));
            (!snippet.is_empty()).then_some(snippet)
        })
        .take(limit)
        .collect()
}

/// Snippets carry inline `<b>` highlighting; drop every tag.
fn strip_tags(fragment: &str) -> String {
    let mut out = String::with_capacity(fragment.len());
    let mut in_tag = false;
    for c in fragment.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESULTS_PAGE: &str = r#"
<div class="result results_links results_links_deep web-result">
  <div class="links_main links_deep result__body">
    <h2 class="result__title"><a class="result__a" href="https://example.com/ml">Machine learning</a></h2>
    <a class="result__snippet" href="https://example.com/ml"><b>Machine learning</b> is a field of study in &quot;AI&quot;.</a>
  </div>
</div>
<div class="result results_links results_links_deep web-result">
  <div class="links_main links_deep result__body">
    <h2 class="result__title"><a class="result__a" href="https://example.org">Intro</a></h2>
    <a class="result__snippet" href="https://example.org">Statistical   algorithms
      that learn from data &amp; generalize.</a>
  </div>
</div>
<div class="result__body"><h2>No snippet here</h2></div>
"#;

    #[test]
    fn extracts_snippets_without_markup() {
        let snippets = extract_ddg_snippets(RESULTS_PAGE, 5);
        assert_eq!(
            snippets,
            vec![
                "Machine learning is a field of study in \"AI\".".to_string(),
                "Statistical algorithms that learn from data & generalize.".to_string(),
            ]
        );
    }

    #[test]
    fn respects_result_limit() {
        assert_eq!(extract_ddg_snippets(RESULTS_PAGE, 1).len(), 1);
        assert!(extract_ddg_snippets("<html></html>", 5).is_empty());
    }
}
