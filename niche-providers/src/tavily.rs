//! Tavily AI web search client

use crate::client::{create_http_client, handle_response_error, request_error, ApiClientConfig};
use niche_core::{require_env, NicheResult, SearchConfig, WebSearchResult, TAVILY_API_KEY_ENV};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const PROVIDER: &str = "tavily";

/// Tavily search client
pub struct TavilyClient {
    client: reqwest::Client,
    config: ApiClientConfig,
    api_key: String,
    settings: SearchConfig,
}

#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
    search_depth: &'a str,
    include_answer: bool,
}

/// Search response
#[derive(Debug, Clone, Deserialize)]
pub struct TavilyResponse {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub results: Vec<WebSearchResult>,
}

impl TavilyClient {
    /// Create a client with the key from `TAVILY_API_KEY`
    pub fn new(settings: &SearchConfig) -> NicheResult<Self> {
        let api_key = require_env(TAVILY_API_KEY_ENV, PROVIDER)?;
        Self::with_api_key(settings, api_key)
    }

    pub fn with_api_key(settings: &SearchConfig, api_key: impl Into<String>) -> NicheResult<Self> {
        let config = ApiClientConfig::new(settings.tavily_base_url.clone())
            .with_timeout(settings.timeout_seconds);
        let client = create_http_client(&config)?;

        info!("Created Tavily client for {}", config.base_url);

        Ok(Self {
            client,
            config,
            api_key: api_key.into(),
            settings: settings.clone(),
        })
    }

    pub async fn search(&self, query: &str) -> NicheResult<TavilyResponse> {
        let request = TavilyRequest {
            api_key: &self.api_key,
            query,
            max_results: self.settings.tavily_max_results,
            search_depth: &self.settings.tavily_search_depth,
            include_answer: self.settings.tavily_include_answer,
        };

        debug!(query, "Making Tavily search request");

        let response = self
            .client
            .post(self.config.endpoint_url(""))
            .json(&request)
            .send()
            .await
            .map_err(|e| request_error(PROVIDER, "search", e))?;

        if !response.status().is_success() {
            return Err(handle_response_error(response, PROVIDER, "search").await);
        }

        response
            .json()
            .await
            .map_err(|e| request_error(PROVIDER, "search", e))
    }
}

/// Numbered plain-text listing an agent can read
pub fn format_results(query: &str, results: &[WebSearchResult]) -> String {
    let mut out = format!("Web search results for '{}':\n", query);
    for (i, result) in results.iter().enumerate() {
        out.push_str(&format!("{}. {} - {}\n", i + 1, result.content, result.url));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_response_parsing_tolerates_missing_fields() {
        let response: TavilyResponse = serde_json::from_value(json!({
            "query": "desk setup",
            "answer": null,
            "results": [
                {"title": "Ten desk upgrades", "url": "https://a.example", "content": "Monitor arms free space.", "score": 0.91},
                {"title": "Cable trays", "url": "https://b.example", "content": "Hide the mess."}
            ],
            "response_time": 1.2
        }))
        .unwrap();

        assert_eq!(response.results.len(), 2);
        assert_eq!(response.results[1].score, 0.0);
        assert!(response.answer.is_none());
    }

    #[test]
    fn test_format_results() {
        let results = vec![
            WebSearchResult {
                title: "Ten desk upgrades".to_string(),
                url: "https://a.example".to_string(),
                content: "Monitor arms free space.".to_string(),
                score: 0.91,
            },
            WebSearchResult {
                title: "Cable trays".to_string(),
                url: "https://b.example".to_string(),
                content: "Hide the mess.".to_string(),
                score: 0.5,
            },
        ];

        assert_eq!(
            format_results("desk setup", &results),
            "Web search results for 'desk setup':\n\
             1. Monitor arms free space. - https://a.example\n\
             2. Hide the mess. - https://b.example\n"
        );
    }

    #[test]
    fn test_format_without_results_is_header_only() {
        assert_eq!(format_results("nothing", &[]), "Web search results for 'nothing':\n");
    }
}
