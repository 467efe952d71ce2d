//! The research crew
//!
//! Runs the task graph in order. For every task the crew first gathers tool
//! data from what earlier tasks produced, renders the prompt, asks the
//! task's agent, and in hierarchical mode lets the manager approve or rewrite
//! the answer. Model calls are retried per task.

use crate::agents::{Agent, AgentRole};
use crate::llm::ChatModel;
use crate::state::{ResearchState, Review, TaskOutput};
use crate::tasks::{PromptVars, TaskGraph, TaskKind, TaskSpec};
use chrono::{DateTime, Utc};
use niche_core::{
    log_operation_error, log_operation_start, log_operation_success, retry_async_if,
    ErrorContext, NicheError, NicheResult, ProcessMode, ResearchConfig, RetryConfig,
    ScoredKeyword,
};
use niche_providers::Toolbox;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Prefix of a manager reply that keeps the agent's output
pub const APPROVAL_MARKER: &str = "APPROVE";

/// Outcome of a full crew run
#[derive(Debug, Clone, Serialize)]
pub struct CrewOutput {
    pub run_id: Uuid,
    pub topic: String,
    pub process: ProcessMode,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Output of the last task in execution order
    pub final_output: String,
    pub state: ResearchState,
}

pub struct ResearchCrew {
    model: Arc<dyn ChatModel>,
    tools: Toolbox,
    graph: TaskGraph,
    settings: ResearchConfig,
    retry: RetryConfig,
}

impl ResearchCrew {
    pub fn new(
        model: Arc<dyn ChatModel>,
        tools: Toolbox,
        settings: ResearchConfig,
        retry: RetryConfig,
    ) -> NicheResult<Self> {
        Ok(Self {
            model,
            tools,
            graph: TaskGraph::blog_research()?,
            settings,
            retry,
        })
    }

    pub fn with_graph(mut self, graph: TaskGraph) -> Self {
        self.graph = graph;
        self
    }

    pub fn with_process(mut self, process: ProcessMode) -> Self {
        self.settings.process = process;
        self
    }

    pub fn process(&self) -> ProcessMode {
        self.settings.process
    }

    /// Run every task for `topic`
    pub async fn kickoff(&self, topic: &str) -> NicheResult<CrewOutput> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let order = self.graph.execution_order()?;
        let mut state = ResearchState::new(topic);

        log_operation_start!(
            "research_crew",
            run_id = %run_id,
            topic = topic,
            process = ?self.settings.process,
            model = self.model.model_name(),
            tasks = order.len()
        );

        for kind in &order {
            let Some(task) = self.graph.get(*kind) else {
                continue;
            };

            match self.run_task(task, &mut state).await {
                Ok(output) => {
                    info!(
                        task = %output.task,
                        agent = %output.agent,
                        attempts = output.attempts,
                        review = ?output.review,
                        chars = output.output.len(),
                        "Task completed"
                    );
                    state.record(output);
                }
                Err(e) => {
                    log_operation_error!("research_crew", e, task = %kind);
                    return Err(e);
                }
            }
        }

        let final_output = order
            .last()
            .and_then(|k| state.output(*k))
            .map(|o| o.output.clone())
            .unwrap_or_default();

        log_operation_success!("research_crew", run_id = %run_id, tasks = state.outputs.len());

        Ok(CrewOutput {
            run_id,
            topic: topic.to_string(),
            process: self.settings.process,
            started_at,
            finished_at: Utc::now(),
            final_output,
            state,
        })
    }

    async fn run_task(&self, task: &TaskSpec, state: &mut ResearchState) -> NicheResult<TaskOutput> {
        info!(task = %task.kind, agent = %task.agent, "Starting task");

        let tool_data = self.gather_tool_data(task.kind, state).await;
        let prompt = task.render_prompt(&PromptVars {
            initial_topic: state.topic.clone(),
            context: state.context_for(&task.depends_on),
            tool_data: tool_data.clone(),
        })?;
        let agent = Agent::for_role(task.agent);
        let system = agent.system_prompt(&state.topic);

        let (system, prompt, topic) = (system.as_str(), prompt.as_str(), state.topic.as_str());

        let mut attempts = 0;
        let result = retry_async_if(
            || {
                attempts += 1;
                self.attempt(task, system, prompt, topic)
            },
            NicheError::is_recoverable,
            &self.retry,
            task.kind.id(),
        )
        .await;

        match result {
            Ok((output, review)) => Ok(TaskOutput {
                task: task.kind,
                agent: task.agent,
                output,
                tool_data,
                attempts,
                review,
            }),
            Err(e) => Err(NicheError::Task {
                task: task.kind.id().to_string(),
                message: format!("giving up after {} attempt(s): {}", attempts, e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("research_crew")
                    .with_operation("run_task")
                    .with_metadata("agent", task.agent.id()),
            }),
        }
    }

    /// One model call for the task, plus the manager's review when hierarchical
    async fn attempt(
        &self,
        task: &TaskSpec,
        system: &str,
        prompt: &str,
        topic: &str,
    ) -> NicheResult<(String, Review)> {
        let output = self.model.complete(system, prompt).await?;

        match self.settings.process {
            ProcessMode::Sequential => Ok((output, Review::NotReviewed)),
            ProcessMode::Hierarchical => self.review(task, &output, topic).await,
        }
    }

    async fn review(
        &self,
        task: &TaskSpec,
        output: &str,
        topic: &str,
    ) -> NicheResult<(String, Review)> {
        let manager = Agent::for_role(AgentRole::Manager);
        let request = format!(
            "The {} agent finished the task '{}'.\n\nExpected output: {}\n\n\
             Their output:\n\n{}\n\n\
             If the output meets the expectation, reply with {} and nothing else. Otherwise \
             reply with a corrected, complete version of the output and nothing else.",
            task.agent, task.kind, task.expected_output, output, APPROVAL_MARKER
        );

        let reply = self
            .model
            .complete(&manager.system_prompt(topic), &request)
            .await?;

        if is_approval(&reply) {
            debug!(task = %task.kind, "Manager approved output");
            Ok((output.to_string(), Review::Approved))
        } else {
            info!(task = %task.kind, "Manager revised output");
            Ok((reply, Review::Revised))
        }
    }

    /// Tool calls for a task, driven by what earlier tasks produced
    async fn gather_tool_data(&self, kind: TaskKind, state: &mut ResearchState) -> String {
        match kind {
            TaskKind::GenerateInitialKeywords | TaskKind::CompileStrategyReport => String::new(),
            TaskKind::ExpandAndAnalyzeKeywords => {
                if state.seed_keywords.is_empty() {
                    warn!("No seed keywords to expand");
                    return "No seed keywords were available for expansion.".to_string();
                }

                let expansion = self
                    .tools
                    .keyword_expansion
                    .run(&state.seed_keywords.join(", "))
                    .await;
                state.ranked_keywords = parse_ranked_keywords(&expansion);

                let mut sections = vec![tool_section(self.tools.keyword_expansion.name(), &expansion)];

                let leaders = state.leading_keywords(self.settings.trends_keywords);
                if !state.ranked_keywords.is_empty() && !leaders.is_empty() {
                    let trends = self.tools.google_trends.run(&leaders.join(", ")).await;
                    sections.push(tool_section(self.tools.google_trends.name(), &trends));
                    state.trends = Some(trends);
                }

                sections.join("\n\n")
            }
            TaskKind::PerformDeepDiveAnalysis => {
                let mut sections = Vec::new();
                for keyword in state.leading_keywords(self.settings.serp_keywords) {
                    let serp = self.tools.serp.run(&keyword).await;
                    sections.push(tool_section(
                        &format!("{}: {}", self.tools.serp.name(), keyword),
                        &serp,
                    ));
                }

                let query = format!("{} niche keyword opportunities", state.topic);
                let search = self.tools.web_search.run(&query).await;
                sections.push(tool_section(self.tools.web_search.name(), &search));
                sections.join("\n\n")
            }
            TaskKind::GenerateBlogContentIdeas => {
                let query = format!("{} blog content ideas", state.topic);
                let search = self.tools.web_search.run(&query).await;
                tool_section(self.tools.web_search.name(), &search)
            }
            TaskKind::IdentifyBlogContentTrends => {
                let query = format!("{} blog trends", state.topic);
                let search = self.tools.web_search.run(&query).await;
                let mut sections = vec![tool_section(self.tools.web_search.name(), &search)];
                if let Some(trends) = &state.trends {
                    sections.push(tool_section(self.tools.google_trends.name(), trends));
                }
                sections.join("\n\n")
            }
        }
    }
}

fn tool_section(title: &str, body: &str) -> String {
    format!("### {}\n\n{}", title, body.trim())
}

/// A manager reply that starts with the approval marker, ignoring case
pub fn is_approval(reply: &str) -> bool {
    reply
        .trim_start()
        .get(..APPROVAL_MARKER.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(APPROVAL_MARKER))
}

/// Ranked keywords from the expansion tool; an error message yields none
pub fn parse_ranked_keywords(output: &str) -> Vec<ScoredKeyword> {
    match serde_json::from_str(output) {
        Ok(ranked) => ranked,
        Err(_) => {
            warn!("Keyword expansion returned no ranked keywords");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_approval() {
        assert!(is_approval("APPROVE"));
        assert!(is_approval("  approved, nice work"));
        assert!(!is_approval("Here is a better version"));
        assert!(!is_approval("APP"));
        assert!(!is_approval(""));
    }

    #[test]
    fn test_parse_ranked_keywords() {
        let ranked = parse_ranked_keywords(
            r#"[{"keyword": "desk mat", "search_volume": 9900, "competition_index": 12, "cpc": 0.8, "composite_score": 40.96}]"#,
        );
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].keyword(), "desk mat");

        assert!(parse_ranked_keywords("Error in KeywordExpansionTool: boom").is_empty());
    }
}
