//! Deterministic router over the workflow's session state.
//!
//! The next agent depends only on which outputs already exist:
//!
//! | research_question | pubmed_results | stage              |
//! |-------------------|----------------|--------------------|
//! | absent            | absent         | DefineQuestion     |
//! | present           | absent         | SearchLiterature   |
//! | present           | present        | GenerateHypotheses |
//! | absent            | present        | DefineQuestion     |

use serde::{Deserialize, Serialize};

use super::{
    find_agent, root_agent, AgentSpec, HYPOTHESIS_AGENT, PUBMED_RESULTS_KEY,
    RESEARCH_QUESTION_AGENT, RESEARCH_QUESTION_KEY, SEARCH_AGENT,
};

/// Outputs produced so far in one session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    #[serde(default)]
    pub research_question: Option<String>,

    #[serde(default)]
    pub pubmed_results: Option<serde_json::Value>,
}

impl WorkflowState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a runtime session-state object, reading the two output keys
    pub fn from_session(session: &serde_json::Value) -> Self {
        Self {
            research_question: session
                .get(RESEARCH_QUESTION_KEY)
                .and_then(|v| v.as_str())
                .map(str::to_string),
            pubmed_results: session
                .get(PUBMED_RESULTS_KEY)
                .filter(|v| !v.is_null())
                .cloned(),
        }
    }

    pub fn with_question(mut self, question: impl Into<String>) -> Self {
        self.research_question = Some(question.into());
        self
    }

    pub fn with_results(mut self, results: serde_json::Value) -> Self {
        self.pubmed_results = Some(results);
        self
    }

    fn has_question(&self) -> bool {
        self.research_question
            .as_deref()
            .is_some_and(|q| !q.trim().is_empty())
    }

    fn has_results(&self) -> bool {
        match &self.pubmed_results {
            None | Some(serde_json::Value::Null) => false,
            Some(serde_json::Value::String(s)) => !s.trim().is_empty(),
            Some(_) => true,
        }
    }
}

/// Step of the workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStage {
    DefineQuestion,
    SearchLiterature,
    GenerateHypotheses,
}

impl WorkflowStage {
    /// Stage implied by the outputs present in `state`
    pub fn from_state(state: &WorkflowState) -> Self {
        match (state.has_question(), state.has_results()) {
            (false, _) => WorkflowStage::DefineQuestion,
            (true, false) => WorkflowStage::SearchLiterature,
            (true, true) => WorkflowStage::GenerateHypotheses,
        }
    }

    /// Name of the agent responsible for this stage
    pub fn agent_name(&self) -> &'static str {
        match self {
            WorkflowStage::DefineQuestion => RESEARCH_QUESTION_AGENT,
            WorkflowStage::SearchLiterature => SEARCH_AGENT,
            WorkflowStage::GenerateHypotheses => HYPOTHESIS_AGENT,
        }
    }
}

/// Picks the sub-agent the root agent delegates to
#[derive(Debug, Clone, Copy)]
pub struct Router {
    root: &'static AgentSpec,
}

impl Default for Router {
    fn default() -> Self {
        Self { root: root_agent() }
    }
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// The routing agent
    pub fn root(&self) -> &'static AgentSpec {
        self.root
    }

    /// Agent to run next for `state`
    pub fn route(&self, state: &WorkflowState) -> &'static AgentSpec {
        let stage = WorkflowStage::from_state(state);
        let name = stage.agent_name();
        debug_assert!(self.root.sub_agents.contains(&name));

        tracing::debug!(?stage, agent = name, "Routing");
        // Every stage agent is in the static table.
        find_agent(name).unwrap_or(self.root)
    }
}
