//! Configuration management
//!
//! Settings live in TOML; credentials only ever come from the environment
//! (optionally seeded from a `.env` file).

use crate::async_utils::RetryConfig;
use crate::error::{ErrorContext, NicheError, NicheResult};
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const DATAFORSEO_LOGIN_ENV: &str = "DATAFORSEO_LOGIN";
pub const DATAFORSEO_PASSWORD_ENV: &str = "DATAFORSEO_PASSWORD";
pub const TAVILY_API_KEY_ENV: &str = "TAVILY_API_KEY";
pub const SERPER_API_KEY_ENV: &str = "SERPER_API_KEY";
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const OPENAI_API_BASE_ENV: &str = "OPENAI_API_BASE";
pub const OPENAI_MODEL_NAME_ENV: &str = "OPENAI_MODEL_NAME";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NicheConfig {
    pub dataforseo: DataForSeoConfig,
    pub search: SearchConfig,
    pub llm: LlmConfig,
    pub scoring: ScoringConfig,
    pub retry: RetryConfig,
    pub research: ResearchConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataForSeoConfig {
    pub base_url: String,
    pub language_code: String,
    /// Google Ads location code (2840 = United States)
    pub location_code: u32,
    /// Keywords per trends request, at most 5
    pub trends_batch_size: usize,
    pub timeout_seconds: u64,
}

impl Default for DataForSeoConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.dataforseo.com/v3/".to_string(),
            language_code: "en".to_string(),
            location_code: 2840,
            trends_batch_size: 5,
            timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub tavily_base_url: String,
    pub tavily_max_results: usize,
    pub tavily_search_depth: String,
    pub tavily_include_answer: bool,
    pub serper_base_url: String,
    /// Serper geo location
    pub serper_gl: String,
    /// Serper interface language
    pub serper_hl: String,
    pub timeout_seconds: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            tavily_base_url: "https://api.tavily.com/search".to_string(),
            tavily_max_results: 5,
            tavily_search_depth: "advanced".to_string(),
            tavily_include_answer: true,
            serper_base_url: "https://google.serper.dev/search".to_string(),
            serper_gl: "us".to_string(),
            serper_hl: "en".to_string(),
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    /// OpenAI-compatible API root, e.g. https://api.openai.com/v1
    pub base_url: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            temperature: 0.7,
            max_tokens: Some(4000),
            timeout_seconds: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// How many ranked keywords the expansion tool returns
    pub top_n: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self { top_n: 40 }
    }
}

/// How the crew runs its tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessMode {
    /// Tasks run in graph order, outputs accepted as produced
    Sequential,
    /// Tasks run in graph order and the manager reviews every output
    Hierarchical,
}

impl std::str::FromStr for ProcessMode {
    type Err = NicheError;

    fn from_str(s: &str) -> NicheResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sequential" => Ok(ProcessMode::Sequential),
            "hierarchical" => Ok(ProcessMode::Hierarchical),
            other => Err(crate::validation_error!(
                format!("Unknown process mode '{}' (use sequential|hierarchical)", other),
                "process",
                "config"
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchConfig {
    pub initial_topic: String,
    pub process: ProcessMode,
    pub output_path: PathBuf,
    /// Ranked keywords sent to the trends tool
    pub trends_keywords: usize,
    /// Ranked keywords looked up on the search results page
    pub serp_keywords: usize,
    /// Log tool inputs and outputs at debug level
    pub debug_tools: bool,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            initial_topic: "Desk Setup".to_string(),
            process: ProcessMode::Hierarchical,
            output_path: PathBuf::from("final_blog_strategy_report.md"),
            trends_keywords: 5,
            serp_keywords: 3,
            debug_tools: false,
        }
    }
}

impl NicheConfig {
    /// Load configuration from an explicit path or the default locations
    pub fn load(config_path: Option<&Path>) -> NicheResult<Self> {
        // Missing .env is normal
        if let Ok(path) = dotenvy::dotenv() {
            debug!("Loaded environment from {:?}", path);
        }

        let mut config = if let Some(path) = config_path {
            info!("Loading configuration from {:?}", path);
            Self::from_file(path)?
        } else {
            match Self::default_paths().into_iter().find(|p| p.exists()) {
                Some(path) => {
                    info!("Loading configuration from {:?}", path);
                    Self::from_file(&path)?
                }
                None => {
                    info!("No configuration file found, using defaults");
                    Self::default()
                }
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Candidate configuration files, in lookup order
    pub fn default_paths() -> Vec<PathBuf> {
        [
            dirs::config_dir().map(|d| d.join("niche").join("config.toml")),
            dirs::home_dir().map(|d| d.join(".niche").join("config.toml")),
            Some(PathBuf::from("niche.toml")),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Where `config --init` writes
    pub fn user_config_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("niche").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("niche.toml"))
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> NicheResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| NicheError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        let config: NicheConfig = toml::from_str(&content).map_err(|e| NicheError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("parse_toml")
                .with_suggestion("Check TOML syntax in config file"),
        })?;

        Ok(config)
    }

    /// Save configuration to a TOML file, creating parent directories
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> NicheResult<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| NicheError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").with_operation("serialize_toml"),
        })?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content).map_err(|e| NicheError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })?;

        Ok(())
    }

    /// Model name and API root may be overridden from the environment
    pub fn apply_env_overrides(&mut self) {
        if let Some(model) = non_empty_env(OPENAI_MODEL_NAME_ENV) {
            self.llm.model = model;
        }
        if let Some(base_url) = non_empty_env(OPENAI_API_BASE_ENV) {
            self.llm.base_url = base_url;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> NicheResult<()> {
        if self.scoring.top_n == 0 {
            return Err(invalid("scoring.top_n must be greater than 0"));
        }

        if !(1..=5).contains(&self.dataforseo.trends_batch_size) {
            return Err(invalid(
                "dataforseo.trends_batch_size must be between 1 and 5",
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(invalid("retry.max_attempts must be greater than 0"));
        }

        if self.retry.min_delay_ms > self.retry.max_delay_ms {
            return Err(invalid(
                "retry.min_delay_ms must not exceed retry.max_delay_ms",
            ));
        }

        if self.llm.model.trim().is_empty() {
            return Err(invalid("llm.model must not be empty"));
        }

        if self.research.initial_topic.trim().is_empty() {
            return Err(invalid("research.initial_topic must not be empty"));
        }

        Ok(())
    }
}

fn invalid(message: &str) -> NicheError {
    NicheError::Config {
        message: message.to_string(),
        source: None,
        context: ErrorContext::new("config")
            .with_operation("validate")
            .with_suggestion("Fix the value in your config file"),
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Read a credential from the environment
pub fn require_env(name: &str, component: &str) -> NicheResult<String> {
    non_empty_env(name).ok_or_else(|| NicheError::Config {
        message: format!("{} environment variable is not set", name),
        source: None,
        context: ErrorContext::new(component)
            .with_operation("read_credentials")
            .with_suggestion(&format!("Export {} or add it to a .env file", name)),
    })
}
