//! DataForSEO keyword data client
//!
//! Two endpoints are used: Google Ads keywords-for-keywords (expansion with
//! volume, competition and CPC) and Google Trends explore (interest over
//! time). Responses are cached per endpoint and payload for the lifetime of
//! the client.

use crate::client::{create_http_client, handle_response_error, request_error, ApiClientConfig};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use niche_core::{
    require_env, validation_error, DataForSeoConfig, NicheResult, DATAFORSEO_LOGIN_ENV,
    DATAFORSEO_PASSWORD_ENV,
};
use niche_keywords::{
    dedupe_keywords, extract_trend_results, merge_batches, partition, KeywordMap,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tracing::{debug, info, warn};

const PROVIDER: &str = "dataforseo";
pub const KEYWORDS_FOR_KEYWORDS_ENDPOINT: &str =
    "keywords_data/google_ads/keywords_for_keywords/live";
pub const TRENDS_EXPLORE_ENDPOINT: &str = "keywords_data/google_trends/explore/live";

/// DataForSEO API client
pub struct DataForSeoClient {
    client: reqwest::Client,
    config: ApiClientConfig,
    settings: DataForSeoConfig,
    cache: Mutex<HashMap<String, Value>>,
    api_call_count: AtomicUsize,
}

impl DataForSeoClient {
    /// Create a client with credentials from the environment
    pub fn new(settings: &DataForSeoConfig) -> NicheResult<Self> {
        let login = require_env(DATAFORSEO_LOGIN_ENV, PROVIDER)?;
        let password = require_env(DATAFORSEO_PASSWORD_ENV, PROVIDER)?;
        Self::with_credentials(settings, &login, &password)
    }

    pub fn with_credentials(
        settings: &DataForSeoConfig,
        login: &str,
        password: &str,
    ) -> NicheResult<Self> {
        let config = ApiClientConfig::new(settings.base_url.clone())
            .with_timeout(settings.timeout_seconds)
            .with_header("Authorization", basic_auth(login, password));
        let client = create_http_client(&config)?;

        info!("Created DataForSEO client for {}", config.base_url);

        Ok(Self {
            client,
            config,
            settings: settings.clone(),
            cache: Mutex::new(HashMap::new()),
            api_call_count: AtomicUsize::new(0),
        })
    }

    /// Network calls made so far; cache hits are not counted
    pub fn api_call_count(&self) -> usize {
        self.api_call_count.load(Ordering::Relaxed)
    }

    pub fn cached_responses(&self) -> usize {
        self.cache.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Related keywords with search volume, competition and CPC
    pub async fn keywords_for_keywords(&self, seeds: &[String]) -> NicheResult<Value> {
        let seeds = dedupe_keywords(seeds);
        if seeds.is_empty() {
            return Err(validation_error!(
                "at least one seed keyword is required",
                "keywords",
                PROVIDER
            ));
        }

        let payload = keywords_for_keywords_payload(&self.settings, &seeds);
        self.post(KEYWORDS_FOR_KEYWORDS_ENDPOINT, payload).await
    }

    /// Interest-over-time results keyed by keyword
    ///
    /// Keywords are deduplicated and sent in chunks of at most
    /// `trends_batch_size`, one request at a time. A chunk that fails is
    /// logged and left out; the others are still merged.
    pub async fn google_trends(&self, keywords: &[String]) -> NicheResult<KeywordMap<Value>> {
        let keywords = dedupe_keywords(keywords);
        let batches = partition(&keywords, self.settings.trends_batch_size);
        let mut answered = Vec::with_capacity(batches.len());

        debug!(
            keywords = keywords.len(),
            batches = batches.len(),
            "Fetching Google Trends data"
        );

        for (i, batch) in batches.iter().enumerate() {
            let response = match self.post(TRENDS_EXPLORE_ENDPOINT, trends_payload(batch)).await {
                Ok(response) => response,
                Err(e) => {
                    warn!(batch = i, keywords = ?batch, error = %e, "Trends request failed, skipping batch");
                    continue;
                }
            };

            match extract_trend_results(&response) {
                Ok(results) => answered.push(results),
                Err(e) => {
                    warn!(batch = i, keywords = ?batch, error = %e, "Trends batch returned no tasks");
                }
            }
        }

        Ok(merge_batches(answered))
    }

    async fn post(&self, endpoint: &str, payload: Value) -> NicheResult<Value> {
        let cache_key = format!("{}|{}", endpoint, payload);
        if let Some(hit) = self
            .cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&cache_key)
            .cloned()
        {
            debug!(endpoint, "Serving DataForSEO response from cache");
            return Ok(hit);
        }

        let url = self.config.endpoint_url(endpoint);
        debug!("Making DataForSEO request to: {}", url);

        self.api_call_count.fetch_add(1, Ordering::Relaxed);
        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| request_error(PROVIDER, endpoint, e))?;

        if !response.status().is_success() {
            return Err(handle_response_error(response, PROVIDER, endpoint).await);
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| request_error(PROVIDER, endpoint, e))?;

        self.cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(cache_key, body.clone());

        Ok(body)
    }
}

/// `Authorization` header value for HTTP basic auth
pub fn basic_auth(login: &str, password: &str) -> String {
    format!("Basic {}", BASE64.encode(format!("{}:{}", login, password)))
}

pub fn keywords_for_keywords_payload(settings: &DataForSeoConfig, seeds: &[String]) -> Value {
    json!([{
        "keywords": seeds,
        "language_code": settings.language_code,
        "location_code": settings.location_code,
    }])
}

pub fn trends_payload(batch: &[String]) -> Value {
    json!([{ "keywords": batch }])
}
