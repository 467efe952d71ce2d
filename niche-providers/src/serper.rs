//! Serper Google search results client

use crate::client::{create_http_client, handle_response_error, request_error, ApiClientConfig};
use niche_core::{require_env, NicheResult, SearchConfig, SerpResult, SERPER_API_KEY_ENV};
use serde_json::{json, Value};
use tracing::{debug, info};

const PROVIDER: &str = "serper";

/// Serper search client
pub struct SerperClient {
    client: reqwest::Client,
    config: ApiClientConfig,
    settings: SearchConfig,
}

impl SerperClient {
    /// Create a client with the key from `SERPER_API_KEY`; fails if it is unset
    pub fn new(settings: &SearchConfig) -> NicheResult<Self> {
        let api_key = require_env(SERPER_API_KEY_ENV, PROVIDER)?;
        Self::with_api_key(settings, &api_key)
    }

    pub fn with_api_key(settings: &SearchConfig, api_key: &str) -> NicheResult<Self> {
        let config = ApiClientConfig::new(settings.serper_base_url.clone())
            .with_timeout(settings.timeout_seconds)
            .with_header("X-API-KEY", api_key);
        let client = create_http_client(&config)?;

        info!("Created Serper client for {}", config.base_url);

        Ok(Self {
            client,
            config,
            settings: settings.clone(),
        })
    }

    /// Raw search response
    pub async fn search(&self, query: &str) -> NicheResult<Value> {
        let payload = json!({
            "q": query,
            "gl": self.settings.serper_gl,
            "hl": self.settings.serper_hl,
        });

        debug!(query, "Making Serper search request");

        let response = self
            .client
            .post(self.config.endpoint_url(""))
            .json(&payload)
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

/// Organic results only, reduced to position, title, link and snippet
pub fn process_results(response: &Value) -> Vec<SerpResult> {
    response
        .get("organic")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .map(|item| SerpResult {
            position: item
                .get("position")
                .and_then(Value::as_u64)
                .and_then(|p| u32::try_from(p).ok()),
            title: string_field(item, "title"),
            link: string_field(item, "link"),
            snippet: string_field(item, "snippet"),
        })
        .collect()
}

fn string_field(item: &Value, name: &str) -> Option<String> {
    item.get(name).and_then(Value::as_str).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_results_keeps_organic_fields() {
        let response = json!({
            "searchParameters": {"q": "standing desk", "gl": "us", "hl": "en"},
            "knowledgeGraph": {"title": "Standing desk"},
            "organic": [
                {"position": 1, "title": "Best standing desks", "link": "https://a.example", "snippet": "We tested 20.", "sitelinks": []},
                {"position": 2, "title": "Are they worth it?", "link": "https://b.example"}
            ],
            "peopleAlsoAsk": [{"question": "Is standing better?"}]
        });

        let results = process_results(&response);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].position, Some(1));
        assert_eq!(results[0].snippet.as_deref(), Some("We tested 20."));
        assert_eq!(results[1].snippet, None);
    }

    #[test]
    fn test_process_results_without_organic() {
        assert!(process_results(&json!({"message": "Unauthorized."})).is_empty());
    }

    #[test]
    fn test_missing_key_fails_construction() {
        if std::env::var(SERPER_API_KEY_ENV).is_ok() {
            return;
        }
        assert!(SerperClient::new(&SearchConfig::default()).is_err());
    }
}
