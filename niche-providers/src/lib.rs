//! Niche Providers - clients for the keyword data and search APIs
//!
//! DataForSEO supplies keyword expansion and Google Trends data, Tavily runs
//! AI web searches and Serper returns Google results pages. The [`tools`]
//! module wraps them into string-in, string-out tools for the research crew.

pub mod client;
pub mod dataforseo;
pub mod serper;
pub mod tavily;
pub mod tools;

pub use client::{create_http_client, handle_response_error, ApiClientConfig};
pub use dataforseo::DataForSeoClient;
pub use serper::SerperClient;
pub use tavily::{TavilyClient, TavilyResponse};
pub use tools::{
    AiWebSearchTool, GoogleTrendsTool, KeywordExpansionTool, ResearchTool, SerpScraperTool,
    Toolbox,
};
