//! Research tools handed to the agents
//!
//! A tool takes one string and answers with one string. Failures are reported
//! in-band as `"Error in <tool>: <message>"` so an agent can read them and
//! carry on; nothing propagates out of [`ResearchTool::run`].

use crate::dataforseo::DataForSeoClient;
use crate::serper::{self, SerperClient};
use crate::tavily::{self, TavilyClient};
use async_trait::async_trait;
use niche_core::{validation_error, NicheConfig, NicheResult, ScoredKeyword};
use niche_keywords::{
    count_result_objects, extract_keyword_metrics, parse_keyword_list, reshape_trends,
    KeywordScorer,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Results logged per call in debug mode
const DEBUG_PREVIEW: usize = 5;

#[async_trait]
pub trait ResearchTool: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    async fn execute(&self, input: &str) -> NicheResult<String>;

    /// Run the tool, folding any error into the returned text
    async fn run(&self, input: &str) -> String {
        match self.execute(input).await {
            Ok(output) => output,
            Err(e) => {
                warn!(tool = self.name(), error = %e, "Tool call failed");
                format!("Error in {}: {}", self.name(), e)
            }
        }
    }
}

/// Shortlist the best expansions of the seed keywords
pub fn shortlist_expansions(
    response: &Value,
    scorer: &KeywordScorer,
    top_n: usize,
) -> NicheResult<Vec<ScoredKeyword>> {
    let metrics = extract_keyword_metrics(response)?;
    Ok(scorer.rank(metrics, top_n))
}

fn require_keywords(input: &str, tool: &str) -> NicheResult<Vec<String>> {
    let keywords = parse_keyword_list(input);
    if keywords.is_empty() {
        return Err(validation_error!(
            "expected a comma separated list of keywords",
            "input",
            tool
        ));
    }
    Ok(keywords)
}

fn preview<T: Serialize>(items: &[T]) -> String {
    serde_json::to_string(&items[..items.len().min(DEBUG_PREVIEW)]).unwrap_or_default()
}

/// Expands seed keywords and returns the top scorers as JSON
pub struct KeywordExpansionTool {
    client: Arc<DataForSeoClient>,
    scorer: KeywordScorer,
    top_n: usize,
    debug: bool,
}

impl KeywordExpansionTool {
    pub fn new(client: Arc<DataForSeoClient>, top_n: usize, debug: bool) -> Self {
        Self {
            client,
            scorer: KeywordScorer::new(),
            top_n,
            debug,
        }
    }
}

#[async_trait]
impl ResearchTool for KeywordExpansionTool {
    fn name(&self) -> &'static str {
        "KeywordExpansionTool"
    }

    fn description(&self) -> &'static str {
        "Expands comma separated seed keywords into related keywords with search volume, \
         competition and CPC, scored and ranked best first."
    }

    async fn execute(&self, input: &str) -> NicheResult<String> {
        let seeds = require_keywords(input, "keyword_expansion")?;
        let response = self.client.keywords_for_keywords(&seeds).await?;

        if self.debug {
            debug!(
                tool = self.name(),
                seeds = ?seeds,
                result_objects = count_result_objects(&response),
                "Keyword expansion response received"
            );
        }

        let ranked = shortlist_expansions(&response, &self.scorer, self.top_n)?;

        if self.debug {
            debug!(
                tool = self.name(),
                selected = ranked.len(),
                preview = %preview(&ranked),
                "Ranked expanded keywords"
            );
        }

        Ok(serde_json::to_string_pretty(&ranked)?)
    }
}

/// Interest over time for up to a handful of keywords
pub struct GoogleTrendsTool {
    client: Arc<DataForSeoClient>,
    debug: bool,
}

impl GoogleTrendsTool {
    pub fn new(client: Arc<DataForSeoClient>, debug: bool) -> Self {
        Self { client, debug }
    }
}

#[async_trait]
impl ResearchTool for GoogleTrendsTool {
    fn name(&self) -> &'static str {
        "GoogleTrendsDataForSEOTool"
    }

    fn description(&self) -> &'static str {
        "Fetches Google Trends interest over time for comma separated keywords."
    }

    async fn execute(&self, input: &str) -> NicheResult<String> {
        let keywords = require_keywords(input, "google_trends")?;
        let results = self.client.google_trends(&keywords).await?;
        let reshaped = reshape_trends(&results);

        if self.debug {
            let keys: Vec<&str> = reshaped.keys().collect();
            debug!(
                tool = self.name(),
                keywords = ?keywords,
                with_data = reshaped.len(),
                preview = %preview(&keys),
                "Trends data reshaped"
            );
        }

        Ok(serde_json::to_string_pretty(&reshaped)?)
    }
}

/// AI-assisted web search returning a readable listing
pub struct AiWebSearchTool {
    client: TavilyClient,
    debug: bool,
}

impl AiWebSearchTool {
    pub fn new(client: TavilyClient, debug: bool) -> Self {
        Self { client, debug }
    }
}

#[async_trait]
impl ResearchTool for AiWebSearchTool {
    fn name(&self) -> &'static str {
        "AIWebSearch"
    }

    fn description(&self) -> &'static str {
        "Searches the web and returns the most relevant passages with their sources."
    }

    async fn execute(&self, input: &str) -> NicheResult<String> {
        let query = input.trim();
        if query.is_empty() {
            return Err(validation_error!("search query is empty", "input", "web_search"));
        }

        let response = self.client.search(query).await?;

        if self.debug {
            debug!(
                tool = self.name(),
                query,
                results = response.results.len(),
                preview = %preview(&response.results),
                "Web search results received"
            );
        }

        Ok(tavily::format_results(query, &response.results))
    }
}

/// Organic Google results for one query
pub struct SerpScraperTool {
    client: SerperClient,
    debug: bool,
}

impl SerpScraperTool {
    pub fn new(client: SerperClient, debug: bool) -> Self {
        Self { client, debug }
    }
}

#[async_trait]
impl ResearchTool for SerpScraperTool {
    fn name(&self) -> &'static str {
        "SerperDevScraper"
    }

    fn description(&self) -> &'static str {
        "Returns the organic Google results (position, title, link, snippet) for a query."
    }

    async fn execute(&self, input: &str) -> NicheResult<String> {
        let query = input.trim();
        if query.is_empty() {
            return Err(validation_error!("search query is empty", "input", "serp_scraper"));
        }

        let response = self.client.search(query).await?;
        let results = serper::process_results(&response);

        if self.debug {
            debug!(
                tool = self.name(),
                query,
                results = results.len(),
                preview = %preview(&results),
                "SERP results processed"
            );
        }

        Ok(serde_json::to_string_pretty(&results)?)
    }
}

/// The four tools the research crew works with
#[derive(Clone)]
pub struct Toolbox {
    pub keyword_expansion: Arc<dyn ResearchTool>,
    pub google_trends: Arc<dyn ResearchTool>,
    pub web_search: Arc<dyn ResearchTool>,
    pub serp: Arc<dyn ResearchTool>,
}

impl Toolbox {
    /// Build every tool from configuration and environment credentials
    pub fn from_config(config: &NicheConfig) -> NicheResult<Self> {
        let debug = config.research.debug_tools;
        let dataforseo = Arc::new(DataForSeoClient::new(&config.dataforseo)?);

        Ok(Self {
            keyword_expansion: Arc::new(KeywordExpansionTool::new(
                dataforseo.clone(),
                config.scoring.top_n,
                debug,
            )),
            google_trends: Arc::new(GoogleTrendsTool::new(dataforseo, debug)),
            web_search: Arc::new(AiWebSearchTool::new(
                TavilyClient::new(&config.search)?,
                debug,
            )),
            serp: Arc::new(SerpScraperTool::new(
                SerperClient::new(&config.search)?,
                debug,
            )),
        })
    }

    pub fn all(&self) -> Vec<Arc<dyn ResearchTool>> {
        vec![
            self.keyword_expansion.clone(),
            self.google_trends.clone(),
            self.web_search.clone(),
            self.serp.clone(),
        ]
    }
}
