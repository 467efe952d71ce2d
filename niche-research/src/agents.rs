//! The research crew's agents

use serde::{Deserialize, Serialize};
use std::fmt;

/// Every agent the crew knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Manager,
    KeywordResearch,
    ContentIdeation,
    TrendAnalysis,
    ReportGeneration,
}

impl AgentRole {
    pub const ALL: [AgentRole; 5] = [
        AgentRole::Manager,
        AgentRole::KeywordResearch,
        AgentRole::ContentIdeation,
        AgentRole::TrendAnalysis,
        AgentRole::ReportGeneration,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            AgentRole::Manager => "manager",
            AgentRole::KeywordResearch => "keyword_research",
            AgentRole::ContentIdeation => "content_ideation",
            AgentRole::TrendAnalysis => "trend_analysis",
            AgentRole::ReportGeneration => "report_generation",
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Persona used as the system prompt for an agent's model calls
#[derive(Debug, Clone, Serialize)]
pub struct Agent {
    pub role: AgentRole,
    pub title: &'static str,
    pub goal: &'static str,
    pub backstory: &'static str,
}

impl Agent {
    pub fn for_role(role: AgentRole) -> Self {
        match role {
            AgentRole::Manager => Agent {
                role,
                title: "Blog Research Manager",
                goal: "Coordinate the research for {topic} and make sure every deliverable is \
                       specific, grounded in the collected data and useful to a blog editor",
                backstory: "You have run content programs for niche blogs for a decade. You know \
                            when research is thin and you send it back until it is not.",
            },
            AgentRole::KeywordResearch => Agent {
                role,
                title: "Keyword Research Specialist",
                goal: "Find the keywords around {topic} with real search demand, low competition \
                       and commercial value",
                backstory: "You live in keyword tools and search result pages. You judge a keyword \
                            by its volume, competition and cost per click, never by gut feeling.",
            },
            AgentRole::ContentIdeation => Agent {
                role,
                title: "Content Ideation Strategist",
                goal: "Turn the keyword research for {topic} into blog post ideas readers will \
                       search for and click on",
                backstory: "You have pitched thousands of posts. Good ideas come from what people \
                            already search for and what the ranking pages fail to answer.",
            },
            AgentRole::TrendAnalysis => Agent {
                role,
                title: "Trend Analyst",
                goal: "Identify which {topic} subjects are rising, stable or fading and what that \
                       means for the publishing calendar",
                backstory: "You read interest-over-time charts for a living and you can tell a \
                            seasonal bump from a lasting shift.",
            },
            AgentRole::ReportGeneration => Agent {
                role,
                title: "Strategy Report Writer",
                goal: "Compile everything learned about {topic} into one clear, actionable blog \
                       strategy report in markdown",
                backstory: "You write reports that editors actually use: structured, concrete and \
                            free of filler.",
            },
        }
    }

    /// System prompt with `{topic}` filled in
    pub fn system_prompt(&self, topic: &str) -> String {
        format!(
            "You are the {}.\n\nGoal: {}\n\nBackground: {}",
            self.title,
            self.goal.replace("{topic}", topic),
            self.backstory
        )
    }
}

/// All agents, manager first
pub fn roster() -> Vec<Agent> {
    AgentRole::ALL.iter().copied().map(Agent::for_role).collect()
}
