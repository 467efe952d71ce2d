//! Data handed from one task to the next

use crate::agents::AgentRole;
use crate::tasks::TaskKind;
use niche_core::ScoredKeyword;
use serde::Serialize;

/// Upper bound on seeds sent to keyword expansion
pub const MAX_SEED_KEYWORDS: usize = 20;

/// How the manager handled a task output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Review {
    /// Sequential process, nobody looked
    NotReviewed,
    Approved,
    /// The manager's reply replaced the agent's output
    Revised,
}

/// Result of one task
#[derive(Debug, Clone, Serialize)]
pub struct TaskOutput {
    pub task: TaskKind,
    pub agent: AgentRole,
    pub output: String,
    /// What the tools returned before the model was asked
    pub tool_data: String,
    pub attempts: usize,
    pub review: Review,
}

/// Everything the crew has learned so far
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResearchState {
    pub topic: String,
    pub seed_keywords: Vec<String>,
    pub ranked_keywords: Vec<ScoredKeyword>,
    /// Raw trends tool output for the leading keywords
    pub trends: Option<String>,
    pub outputs: Vec<TaskOutput>,
}

impl ResearchState {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            ..Default::default()
        }
    }

    pub fn output(&self, task: TaskKind) -> Option<&TaskOutput> {
        self.outputs.iter().find(|o| o.task == task)
    }

    /// Keywords to look at more closely: ranked ones first, seeds as fallback
    pub fn leading_keywords(&self, n: usize) -> Vec<String> {
        if self.ranked_keywords.is_empty() {
            self.seed_keywords.iter().take(n).cloned().collect()
        } else {
            self.ranked_keywords
                .iter()
                .take(n)
                .map(|k| k.keyword().to_string())
                .collect()
        }
    }

    /// Outputs of the given tasks as labelled markdown sections
    pub fn context_for(&self, dependencies: &[TaskKind]) -> String {
        dependencies
            .iter()
            .filter_map(|dep| self.output(*dep))
            .map(|o| format!("## {}\n\n{}", o.task, o.output.trim()))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn record(&mut self, output: TaskOutput) {
        if output.task == TaskKind::GenerateInitialKeywords {
            self.seed_keywords = parse_seed_keywords(&output.output);
        }
        self.outputs.retain(|o| o.task != output.task);
        self.outputs.push(output);
    }
}

/// Pull keywords out of free-form model output
///
/// Accepts a JSON array of strings, or lines and comma separated items with
/// bullets, numbering and quotes stripped. Duplicates (case-insensitive) are
/// dropped and at most [`MAX_SEED_KEYWORDS`] are kept.
pub fn parse_seed_keywords(text: &str) -> Vec<String> {
    let candidates: Vec<String> = match serde_json::from_str::<Vec<String>>(text.trim()) {
        Ok(list) => list,
        Err(_) => text
            .lines()
            .flat_map(|line| line.split(','))
            .map(clean_keyword)
            .collect(),
    };

    let mut seen = std::collections::HashSet::new();
    candidates
        .into_iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty() && !k.ends_with(':'))
        .filter(|k| seen.insert(k.to_lowercase()))
        .take(MAX_SEED_KEYWORDS)
        .collect()
}

fn clean_keyword(raw: &str) -> String {
    let trimmed = raw.trim().trim_start_matches(['-', '*', '•', '#', ' ']);
    let without_number = match trimmed.find(['.', ')']) {
        Some(i) if i > 0 && trimmed[..i].chars().all(|c| c.is_ascii_digit()) => &trimmed[i + 1..],
        _ => trimmed,
    };
    without_number
        .trim()
        .trim_matches(|c| c == '"' || c == '\'' || c == '`' || c == '*')
        .trim()
        .to_string()
}
