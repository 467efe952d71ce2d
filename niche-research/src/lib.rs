//! Niche Research - the multi-agent blog keyword research workflow
//!
//! A crew of agents works through a fixed task graph: brainstorm seed
//! keywords, expand and score them, dig into the leaders, pitch content,
//! read the trends and compile a strategy report. Tool calls between tasks
//! are deterministic; only the writing is left to the model.

pub mod agents;
pub mod engine;
pub mod llm;
pub mod report;
pub mod state;
pub mod tasks;

pub use agents::{roster, Agent, AgentRole};
pub use engine::{is_approval, CrewOutput, ResearchCrew, APPROVAL_MARKER};
pub use llm::{ChatModel, OpenAiChatClient};
pub use report::{render_report, write_report};
pub use state::{parse_seed_keywords, ResearchState, Review, TaskOutput};
pub use tasks::{PromptVars, TaskGraph, TaskKind, TaskSpec};
