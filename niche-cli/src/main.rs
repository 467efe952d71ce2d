//! Niche CLI - blog keyword research from the command line
//!
//! `niche run` drives the full research crew and writes the strategy report.
//! The other commands expose single steps (scoring, one tool call) and
//! configuration management. Results go to stdout, logs to stderr.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use niche_core::{init_logging, performance, NicheConfig, ProcessMode};
use niche_keywords::{parse_metric_records, KeywordScorer};
use niche_providers::{
    AiWebSearchTool, DataForSeoClient, GoogleTrendsTool, KeywordExpansionTool, ResearchTool,
    SerpScraperTool, SerperClient, TavilyClient, Toolbox,
};
use niche_research::{write_report, OpenAiChatClient, ResearchCrew};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "niche")]
#[command(about = "Keyword research and blog content strategy for a niche topic")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log tool inputs and results
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the full research crew and write the strategy report
    Run {
        /// Topic to research
        #[arg(short, long)]
        topic: Option<String>,

        /// Report output path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Process mode (sequential, hierarchical)
        #[arg(short, long)]
        process: Option<ProcessMode>,
    },

    /// Score and rank keyword records from a JSON file
    Score {
        /// JSON array of {keyword, search_volume, competition_index, cpc} records
        #[arg(short, long)]
        input: PathBuf,

        /// How many keywords to keep
        #[arg(long)]
        top: Option<usize>,
    },

    /// Expand comma separated seed keywords and rank the results
    Expand {
        /// Seed keywords, comma separated
        keywords: String,
    },

    /// Fetch Google Trends interest for comma separated keywords
    Trends {
        /// Keywords, comma separated
        keywords: String,
    },

    /// AI web search
    Search {
        /// Search query
        query: String,
    },

    /// Organic Google results for a query
    Serp {
        /// Search query
        query: String,
    },

    /// Manage configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Initialize default configuration
        #[arg(long)]
        init: bool,

        /// Validate current configuration
        #[arg(long)]
        validate: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = NicheConfig::load(cli.config.as_deref())?;
    if cli.debug {
        config.research.debug_tools = true;
    }

    let logging_config = if cli.verbose || cli.debug {
        config.logging.clone().verbose()
    } else {
        config.logging.clone()
    };
    init_logging(&logging_config)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Starting niche v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Run {
            topic,
            output,
            process,
        } => handle_run(&config, topic, output, process).await,
        Commands::Score { input, top } => handle_score(&config, &input, top),
        Commands::Expand { keywords } => {
            let client = Arc::new(DataForSeoClient::new(&config.dataforseo)?);
            let tool = KeywordExpansionTool::new(
                client,
                config.scoring.top_n,
                config.research.debug_tools,
            );
            run_tool(&tool, &keywords).await
        }
        Commands::Trends { keywords } => {
            let client = Arc::new(DataForSeoClient::new(&config.dataforseo)?);
            let tool = GoogleTrendsTool::new(client, config.research.debug_tools);
            run_tool(&tool, &keywords).await
        }
        Commands::Search { query } => {
            let tool = AiWebSearchTool::new(
                TavilyClient::new(&config.search)?,
                config.research.debug_tools,
            );
            run_tool(&tool, &query).await
        }
        Commands::Serp { query } => {
            let tool = SerpScraperTool::new(
                SerperClient::new(&config.search)?,
                config.research.debug_tools,
            );
            run_tool(&tool, &query).await
        }
        Commands::Config {
            show,
            init,
            validate,
        } => handle_config(&config, cli.config.as_deref(), show, init, validate),
    }
}

async fn handle_run(
    config: &NicheConfig,
    topic: Option<String>,
    output: Option<PathBuf>,
    process: Option<ProcessMode>,
) -> Result<()> {
    config.validate()?;

    let topic = topic.unwrap_or_else(|| config.research.initial_topic.clone());
    if topic.trim().is_empty() {
        bail!("Topic must not be empty");
    }
    let output = output.unwrap_or_else(|| config.research.output_path.clone());

    let model = OpenAiChatClient::new(&config.llm).await?;
    let tools = Toolbox::from_config(config)?;
    let mut crew = ResearchCrew::new(
        Arc::new(model),
        tools,
        config.research.clone(),
        config.retry.clone(),
    )?;
    if let Some(process) = process {
        crew = crew.with_process(process);
    }

    info!(topic = %topic, process = ?crew.process(), "Running research crew");

    let result = performance::measure_async("research_crew", crew.kickoff(&topic))
        .await
        .with_context(|| format!("Research run for '{}' failed", topic))?;

    write_report(&output, &result)?;
    println!("Report generated: {}", output.display());
    Ok(())
}

fn handle_score(config: &NicheConfig, input: &Path, top: Option<usize>) -> Result<()> {
    let content = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let records: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not valid JSON", input.display()))?;

    let metrics = parse_metric_records(&records)?;
    let ranked = KeywordScorer::new().rank(metrics, top.unwrap_or(config.scoring.top_n));

    println!("{}", serde_json::to_string_pretty(&ranked)?);
    Ok(())
}

async fn run_tool(tool: &dyn ResearchTool, input: &str) -> Result<()> {
    info!(tool = tool.name(), "Running tool");
    println!("{}", tool.run(input).await);
    Ok(())
}

fn handle_config(
    config: &NicheConfig,
    config_path: Option<&Path>,
    show: bool,
    init: bool,
    validate: bool,
) -> Result<()> {
    if !(show || init || validate) {
        bail!("Nothing to do, pass --show, --init or --validate");
    }

    if init {
        let path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(NicheConfig::user_config_path);
        if path.exists() {
            bail!("Configuration already exists at {}", path.display());
        }
        NicheConfig::default().save_to_file(&path)?;
        println!("Configuration initialized at: {}", path.display());
        println!("Credentials are read from the environment or a .env file, not from this file.");
    }

    if show {
        println!("{}", toml::to_string_pretty(config)?);
    }

    if validate {
        match config.validate() {
            Ok(()) => println!("Configuration is valid"),
            Err(e) => {
                e.log();
                return Err(e.into());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_arguments() {
        let cli = Cli::try_parse_from([
            "niche",
            "run",
            "--topic",
            "Home Office",
            "--process",
            "sequential",
            "--verbose",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::Run { topic, process, output } => {
                assert_eq!(topic.as_deref(), Some("Home Office"));
                assert_eq!(process, Some(ProcessMode::Sequential));
                assert!(output.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_process_is_rejected() {
        assert!(Cli::try_parse_from(["niche", "run", "--process", "parallel"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["niche", "expand", "desk mat, footrest", "--debug"]).unwrap();
        assert!(cli.debug);
        match cli.command {
            Commands::Expand { keywords } => assert_eq!(keywords, "desk mat, footrest"),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_score_reads_records_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        std::fs::write(
            &path,
            r#"[{"keyword": "desk lamp", "search_volume": 2000, "competition_index": 30, "cpc": 1.5}]"#,
        )
        .unwrap();

        assert!(handle_score(&NicheConfig::default(), &path, Some(5)).is_ok());
        std::fs::write(&path, r#"{"keyword": "desk lamp"}"#).unwrap();
        assert!(handle_score(&NicheConfig::default(), &path, None).is_err());
    }

    #[test]
    fn test_config_requires_an_action() {
        assert!(handle_config(&NicheConfig::default(), None, false, false, false).is_err());
        assert!(handle_config(&NicheConfig::default(), None, false, false, true).is_ok());
    }
}
