//! Lookup tools the agent can call.
//!
//! The set is fixed at startup: web search, arXiv and Wikipedia. Each tool
//! takes a single free-text query and returns plain text, which is what a
//! ReAct prompt feeds back as an observation.

mod arxiv;
mod web;
mod wikipedia;

pub use arxiv::ArxivSearch;
pub use web::WebSearch;
pub use wikipedia::WikipediaSearch;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::ToolSettings;

/// How much of a provider's answer a tool keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResultLimits {
    /// Number of provider results to use
    pub top_k_results: usize,
    /// Maximum characters of rendered output, if capped
    pub max_chars: Option<usize>,
}

/// Static description of a tool, shared read-only across sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub provider: String,
    pub limits: ResultLimits,
}

/// A read-only lookup capability.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name the model uses in `Action:` lines.
    fn name(&self) -> &str;

    /// One-line description shown to the model.
    fn description(&self) -> &str;

    /// Upstream service this tool queries.
    fn provider(&self) -> &str;

    fn limits(&self) -> ResultLimits;

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name().to_string(),
            description: self.description().to_string(),
            provider: self.provider().to_string(),
            limits: self.limits(),
        }
    }

    /// Run the tool with the model-supplied query.
    async fn run(&self, query: &str) -> anyhow::Result<String>;
}

/// Ordered, immutable collection of tools.
#[derive(Clone)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// The three tools every agent gets.
    pub fn standard(settings: &ToolSettings) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(settings.timeout)
            .build()?;

        Ok(Self::from_tools(vec![
            Arc::new(WebSearch::new(http.clone())),
            Arc::new(ArxivSearch::new(http.clone())),
            Arc::new(WikipediaSearch::new(http)),
        ]))
    }

    pub fn from_tools(tools: Vec<Arc<dyn Tool>>) -> Self {
        Self { tools }
    }

    pub fn list_tools(&self) -> Vec<ToolDescriptor> {
        self.tools.iter().map(|t| t.descriptor()).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Cut `text` to at most `max_chars` characters without splitting one.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Collapse runs of whitespace (including newlines) into single spaces.
pub(crate) fn squash_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Basic HTML entity decoding.
pub(crate) fn html_decode(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_registry_has_three_fixed_tools() {
        let registry = ToolRegistry::standard(&ToolSettings::default()).unwrap();
        assert_eq!(registry.names(), vec!["Search", "arxiv", "wikipedia"]);

        let descriptors = registry.list_tools();
        let arxiv = &descriptors[1];
        assert_eq!(arxiv.provider, "export.arxiv.org");
        assert_eq!(
            arxiv.limits,
            ResultLimits {
                top_k_results: 1,
                max_chars: Some(200)
            }
        );
        assert_eq!(descriptors[2].limits.max_chars, Some(200));
        assert!(registry.get("wikipedia").is_some());
        assert!(registry.get("calculator").is_none());
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("short", 200), "short");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn html_decode_handles_common_entities() {
        assert_eq!(html_decode("a &amp; b &lt;c&gt; &#x27;d&#x27;"), "a & b <c> 'd'");
        assert_eq!(html_decode("&amp;lt;"), "&lt;");
    }
}
