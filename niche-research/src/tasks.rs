//! Task graph of the research workflow
//!
//! Each node names the agent that performs it, a prompt template and the
//! nodes whose outputs it reads. Templates are rendered with tera and see
//! three variables: `initial_topic`, `context` (outputs of the dependencies)
//! and `tool_data` (what the tools returned for this node).

use crate::agents::AgentRole;
use niche_core::{ErrorContext, NicheError, NicheResult};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    GenerateInitialKeywords,
    ExpandAndAnalyzeKeywords,
    PerformDeepDiveAnalysis,
    GenerateBlogContentIdeas,
    IdentifyBlogContentTrends,
    CompileStrategyReport,
}

impl TaskKind {
    pub const ALL: [TaskKind; 6] = [
        TaskKind::GenerateInitialKeywords,
        TaskKind::ExpandAndAnalyzeKeywords,
        TaskKind::PerformDeepDiveAnalysis,
        TaskKind::GenerateBlogContentIdeas,
        TaskKind::IdentifyBlogContentTrends,
        TaskKind::CompileStrategyReport,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            TaskKind::GenerateInitialKeywords => "generate_initial_keywords",
            TaskKind::ExpandAndAnalyzeKeywords => "expand_and_analyze_keywords",
            TaskKind::PerformDeepDiveAnalysis => "perform_deep_dive_analysis",
            TaskKind::GenerateBlogContentIdeas => "generate_blog_content_ideas",
            TaskKind::IdentifyBlogContentTrends => "identify_blog_content_trends",
            TaskKind::CompileStrategyReport => "compile_comprehensive_blog_strategy_report",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Values a prompt template may reference
#[derive(Debug, Clone, Default, Serialize)]
pub struct PromptVars {
    pub initial_topic: String,
    pub context: String,
    pub tool_data: String,
}

/// One node of the graph
#[derive(Debug, Clone)]
pub struct TaskSpec {
    pub kind: TaskKind,
    pub agent: AgentRole,
    pub template: String,
    pub expected_output: String,
    pub depends_on: Vec<TaskKind>,
}

impl TaskSpec {
    pub fn new(
        kind: TaskKind,
        agent: AgentRole,
        template: impl Into<String>,
        expected_output: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            agent,
            template: template.into(),
            expected_output: expected_output.into(),
            depends_on: Vec::new(),
        }
    }

    pub fn after(mut self, dependencies: &[TaskKind]) -> Self {
        self.depends_on.extend_from_slice(dependencies);
        self
    }

    /// Render the prompt and append the expected output
    pub fn render_prompt(&self, vars: &PromptVars) -> NicheResult<String> {
        let context = tera::Context::from_serialize(vars).map_err(|e| self.render_error(e))?;
        let body =
            tera::Tera::one_off(&self.template, &context, false).map_err(|e| self.render_error(e))?;

        Ok(format!(
            "{}\n\nExpected output: {}",
            body.trim_end(),
            self.expected_output
        ))
    }

    fn render_error(&self, error: tera::Error) -> NicheError {
        NicheError::Task {
            task: self.kind.id().to_string(),
            message: format!("Failed to render prompt: {}", error),
            source: Some(Box::new(error)),
            context: ErrorContext::new("task_graph").with_operation("render_prompt"),
        }
    }
}

/// Validated set of tasks with explicit dependencies
#[derive(Debug, Clone)]
pub struct TaskGraph {
    tasks: Vec<TaskSpec>,
}

impl TaskGraph {
    /// Build a graph, rejecting duplicates, unknown dependencies and cycles
    pub fn new(tasks: Vec<TaskSpec>) -> NicheResult<Self> {
        let graph = Self { tasks };
        graph.validate()?;
        Ok(graph)
    }

    /// The six-step blog research workflow
    pub fn blog_research() -> NicheResult<Self> {
        Self::new(blog_research_tasks())
    }

    pub fn tasks(&self) -> &[TaskSpec] {
        &self.tasks
    }

    pub fn get(&self, kind: TaskKind) -> Option<&TaskSpec> {
        self.tasks.iter().find(|t| t.kind == kind)
    }

    pub fn validate(&self) -> NicheResult<()> {
        let mut seen = HashSet::new();
        for task in &self.tasks {
            if !seen.insert(task.kind) {
                return Err(graph_error(format!("task '{}' is defined twice", task.kind)));
            }
        }

        for task in &self.tasks {
            for dep in &task.depends_on {
                if !seen.contains(dep) {
                    return Err(graph_error(format!(
                        "task '{}' depends on unknown task '{}'",
                        task.kind, dep
                    )));
                }
            }
        }

        self.execution_order().map(|_| ())
    }

    /// Topological order; among ready tasks, declaration order wins
    pub fn execution_order(&self) -> NicheResult<Vec<TaskKind>> {
        let mut remaining: HashMap<TaskKind, usize> = self
            .tasks
            .iter()
            .map(|t| (t.kind, t.depends_on.len()))
            .collect();
        let mut order = Vec::with_capacity(self.tasks.len());

        while order.len() < self.tasks.len() {
            let next = self
                .tasks
                .iter()
                .find(|t| remaining.get(&t.kind) == Some(&0))
                .map(|t| t.kind);

            let Some(kind) = next else {
                let stuck: Vec<&str> = self
                    .tasks
                    .iter()
                    .filter(|t| remaining.contains_key(&t.kind))
                    .map(|t| t.kind.id())
                    .collect();
                return Err(graph_error(format!(
                    "dependency cycle among tasks: {}",
                    stuck.join(", ")
                )));
            };

            remaining.remove(&kind);
            for task in &self.tasks {
                let satisfied = task.depends_on.iter().filter(|d| **d == kind).count();
                if let Some(count) = remaining.get_mut(&task.kind) {
                    *count = count.saturating_sub(satisfied);
                }
            }
            order.push(kind);
        }

        Ok(order)
    }
}

fn graph_error(message: String) -> NicheError {
    NicheError::Validation {
        message,
        field: Some("tasks".to_string()),
        context: ErrorContext::new("task_graph").with_operation("validate"),
    }
}

fn blog_research_tasks() -> Vec<TaskSpec> {
    use AgentRole::*;
    use TaskKind::*;

    vec![
        TaskSpec::new(
            GenerateInitialKeywords,
            KeywordResearch,
            "Brainstorm seed keywords for a blog about {{ initial_topic }}. Cover products, \
             problems readers want solved, and buying or how-to intents. Prefer phrases of two \
             to four words that people would actually type into a search engine.",
            "10 to 15 seed keywords, one per line, with no numbering or commentary",
        ),
        TaskSpec::new(
            ExpandAndAnalyzeKeywords,
            KeywordResearch,
            "Analyze the expanded keyword set for {{ initial_topic }}.\n\
             {% if context %}\nSeed keywords:\n{{ context }}\n{% endif %}\
             {% if tool_data %}\nKeyword data (ranked by composite score, higher is better) and \
             interest over time for the leaders:\n{{ tool_data }}\n{% endif %}\n\
             Group the keywords into themes, call out the strongest opportunities and explain \
             each pick with its search volume, competition and CPC.",
            "A themed list of the most promising keywords with their metrics and a one-line \
             rationale for each",
        )
        .after(&[GenerateInitialKeywords]),
        TaskSpec::new(
            PerformDeepDiveAnalysis,
            KeywordResearch,
            "Take a closer look at the top keywords for {{ initial_topic }}.\n\
             {% if context %}\nKeyword analysis so far:\n{{ context }}\n{% endif %}\
             {% if tool_data %}\nCurrent search results and web research:\n{{ tool_data }}\n{% endif %}\n\
             For each keyword describe the search intent, who ranks today, what their content \
             covers and the gap a new post could fill.",
            "A deep-dive per top keyword covering intent, current ranking content and the \
             content gap",
        )
        .after(&[ExpandAndAnalyzeKeywords]),
        TaskSpec::new(
            GenerateBlogContentIdeas,
            ContentIdeation,
            "Generate blog post ideas for {{ initial_topic }}.\n\
             {% if context %}\nResearch to build on:\n{{ context }}\n{% endif %}\
             {% if tool_data %}\nWhat is being published right now:\n{{ tool_data }}\n{% endif %}\n\
             Every idea must target a keyword from the research.",
            "At least 10 blog post ideas, each with a working title, target keyword, format and \
             a two-sentence outline",
        )
        .after(&[ExpandAndAnalyzeKeywords, PerformDeepDiveAnalysis]),
        TaskSpec::new(
            IdentifyBlogContentTrends,
            TrendAnalysis,
            "Identify content trends for {{ initial_topic }}.\n\
             {% if context %}\nKeyword and interest data:\n{{ context }}\n{% endif %}\
             {% if tool_data %}\nRecent coverage on the web:\n{{ tool_data }}\n{% endif %}\n\
             Separate rising subjects from seasonal ones and from those losing interest.",
            "A list of rising, seasonal and declining subjects with the evidence for each and \
             a suggested publishing window",
        )
        .after(&[ExpandAndAnalyzeKeywords]),
        TaskSpec::new(
            CompileStrategyReport,
            ReportGeneration,
            "Compile the blog strategy report for {{ initial_topic }} from the research below.\n\n\
             {{ context }}\n\n\
             Structure it as: executive summary, priority keywords (with metrics), content \
             ideas, trends and timing, and a 90 day publishing plan.",
            "A complete markdown report with the five sections above",
        )
        .after(&[
            GenerateInitialKeywords,
            ExpandAndAnalyzeKeywords,
            PerformDeepDiveAnalysis,
            GenerateBlogContentIdeas,
            IdentifyBlogContentTrends,
        ]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(kind: TaskKind, deps: &[TaskKind]) -> TaskSpec {
        TaskSpec::new(kind, AgentRole::KeywordResearch, "{{ initial_topic }}", "text").after(deps)
    }

    #[test]
    fn test_blog_research_order() {
        let graph = TaskGraph::blog_research().unwrap();
        assert_eq!(graph.execution_order().unwrap(), TaskKind::ALL.to_vec());
    }

    #[test]
    fn test_dependencies_come_first() {
        let graph = TaskGraph::blog_research().unwrap();
        let order = graph.execution_order().unwrap();
        let position = |k: TaskKind| order.iter().position(|o| *o == k).unwrap();

        for task in graph.tasks() {
            for dep in &task.depends_on {
                assert!(position(*dep) < position(task.kind), "{} before {}", dep, task.kind);
            }
        }
    }

    #[test]
    fn test_declaration_order_breaks_ties() {
        use TaskKind::*;
        let graph = TaskGraph::new(vec![
            spec(IdentifyBlogContentTrends, &[]),
            spec(GenerateInitialKeywords, &[]),
            spec(CompileStrategyReport, &[GenerateInitialKeywords]),
        ])
        .unwrap();

        assert_eq!(
            graph.execution_order().unwrap(),
            vec![
                IdentifyBlogContentTrends,
                GenerateInitialKeywords,
                CompileStrategyReport
            ]
        );
    }

    #[test]
    fn test_cycle_is_rejected() {
        use TaskKind::*;
        let err = TaskGraph::new(vec![
            spec(GenerateInitialKeywords, &[]),
            spec(ExpandAndAnalyzeKeywords, &[PerformDeepDiveAnalysis]),
            spec(PerformDeepDiveAnalysis, &[ExpandAndAnalyzeKeywords]),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("dependency cycle"));
    }

    #[test]
    fn test_unknown_dependency_is_rejected() {
        use TaskKind::*;
        let err = TaskGraph::new(vec![spec(ExpandAndAnalyzeKeywords, &[GenerateInitialKeywords])])
            .unwrap_err();
        assert!(err.to_string().contains("unknown task"));
    }

    #[test]
    fn test_duplicate_task_is_rejected() {
        use TaskKind::*;
        assert!(TaskGraph::new(vec![
            spec(GenerateInitialKeywords, &[]),
            spec(GenerateInitialKeywords, &[])
        ])
        .is_err());
    }

    #[test]
    fn test_render_prompt_substitutes_variables() {
        let graph = TaskGraph::blog_research().unwrap();
        let task = graph.get(TaskKind::ExpandAndAnalyzeKeywords).unwrap();

        let prompt = task
            .render_prompt(&PromptVars {
                initial_topic: "Desk Setup".to_string(),
                context: "desk mat\nmonitor arm".to_string(),
                tool_data: "[{\"keyword\": \"desk mat\"}]".to_string(),
            })
            .unwrap();

        assert!(prompt.starts_with("Analyze the expanded keyword set for Desk Setup."));
        assert!(prompt.contains("desk mat\nmonitor arm"));
        assert!(prompt.contains("[{\"keyword\": \"desk mat\"}]"));
        assert!(prompt.ends_with(&format!("Expected output: {}", task.expected_output)));
    }

    #[test]
    fn test_empty_sections_are_left_out() {
        let graph = TaskGraph::blog_research().unwrap();
        let task = graph.get(TaskKind::GenerateBlogContentIdeas).unwrap();

        let prompt = task
            .render_prompt(&PromptVars {
                initial_topic: "Desk Setup".to_string(),
                ..Default::default()
            })
            .unwrap();

        assert!(!prompt.contains("Research to build on"));
        assert!(!prompt.contains("What is being published"));
    }

    #[test]
    fn test_broken_template_is_a_task_error() {
        let task = TaskSpec::new(
            TaskKind::GenerateInitialKeywords,
            AgentRole::KeywordResearch,
            "{{ initial_topic",
            "x",
        );
        match task.render_prompt(&PromptVars::default()).unwrap_err() {
            NicheError::Task { task, .. } => assert_eq!(task, "generate_initial_keywords"),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
