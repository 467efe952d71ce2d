//! Core data type definitions

use serde::{Deserialize, Serialize};

/// Raw measurements for one candidate keyword
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordMetric {
    /// Keyword text, the deduplication key downstream
    pub keyword: String,
    /// Provider competition label (LOW, MEDIUM, HIGH); never scored
    #[serde(default)]
    pub competition: Option<String>,
    /// Competition index in [0, 100]
    #[serde(default)]
    pub competition_index: Option<f64>,
    /// Monthly search volume
    #[serde(default)]
    pub search_volume: Option<u64>,
    /// Cost per click in currency units
    #[serde(default)]
    pub cpc: Option<f64>,
}

impl KeywordMetric {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            competition: None,
            competition_index: None,
            search_volume: None,
            cpc: None,
        }
    }

    pub fn with_search_volume(mut self, search_volume: u64) -> Self {
        self.search_volume = Some(search_volume);
        self
    }

    pub fn with_competition_index(mut self, competition_index: f64) -> Self {
        self.competition_index = Some(competition_index);
        self
    }

    pub fn with_cpc(mut self, cpc: f64) -> Self {
        self.cpc = Some(cpc);
        self
    }
}

/// A keyword metric together with its composite score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredKeyword {
    #[serde(flatten)]
    pub metric: KeywordMetric,
    /// Weighted blend of the normalized metrics, two decimals
    pub composite_score: f64,
}

impl ScoredKeyword {
    pub fn keyword(&self) -> &str {
        &self.metric.keyword
    }
}

/// One point of an interest-over-time series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub timestamp: Option<i64>,
    pub value: Option<f64>,
}

/// Flattened trends series for a single keyword
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeywordTrends {
    pub trends_data: Vec<TrendPoint>,
}

impl KeywordTrends {
    /// Latest non-empty value of the series
    pub fn latest_value(&self) -> Option<f64> {
        self.trends_data.iter().rev().find_map(|p| p.value)
    }
}

/// Organic search-results-page entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerpResult {
    pub position: Option<u32>,
    pub title: Option<String>,
    pub link: Option<String>,
    pub snippet: Option<String>,
}

/// AI web search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebSearchResult {
    pub title: String,
    pub url: String,
    pub content: String,
    #[serde(default)]
    pub score: f64,
}
