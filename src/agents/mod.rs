//! Static agent table for the research workflow.
//!
//! The agents themselves run inside a hosted LLM runtime; this table is the
//! configuration handed to it: who exists, which model and tools they use,
//! and which session key each one fills in.

mod router;

pub use router::{Router, WorkflowStage, WorkflowState};

use serde::Serialize;

/// Model assigned to every agent unless configured otherwise
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Name of the tool bound to the search agent
pub const SEARCH_TOOL: &str = "search_pubmed";

/// Session key written by the research question agent
pub const RESEARCH_QUESTION_KEY: &str = "research_question";

/// Session key written by the search agent
pub const PUBMED_RESULTS_KEY: &str = "pubmed_results";

pub const ROOT_AGENT: &str = "hcls_research_agent";
pub const RESEARCH_QUESTION_AGENT: &str = "research_question_agent";
pub const SEARCH_AGENT: &str = "search_agent";
pub const HYPOTHESIS_AGENT: &str = "hypothesis_agent";

/// Configuration of one agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub instruction: &'static str,
    /// Tools the agent may call
    pub tools: &'static [&'static str],
    /// Session key the agent's final answer is stored under
    pub output_key: Option<&'static str>,
    /// Agents this one may delegate to
    pub sub_agents: &'static [&'static str],
}

static AGENTS: [AgentSpec; 4] = [
    AgentSpec {
        name: ROOT_AGENT,
        description: "Creates research hypotheses for research questions based on pubmed search results.",
        instruction: "Route the researcher: define the research question first, then search PubMed, then generate hypotheses.",
        tools: &[],
        output_key: None,
        sub_agents: &[RESEARCH_QUESTION_AGENT, SEARCH_AGENT, HYPOTHESIS_AGENT],
    },
    AgentSpec {
        name: RESEARCH_QUESTION_AGENT,
        description: "Validates and refines a researcher's question.",
        instruction: "Check the question is specific, answerable and relevant, and return the validated question.",
        tools: &[],
        output_key: Some(RESEARCH_QUESTION_KEY),
        sub_agents: &[],
    },
    AgentSpec {
        name: SEARCH_AGENT,
        description: "Conducts a literature search on PubMed.",
        instruction: "Agree a search string with the user, ask for their email, pick a limit, call search_pubmed and summarize the findings.",
        tools: &[SEARCH_TOOL],
        output_key: Some(PUBMED_RESULTS_KEY),
        sub_agents: &[],
    },
    AgentSpec {
        name: HYPOTHESIS_AGENT,
        description: "Generates testable hypotheses from the PubMed search results.",
        instruction: "Use the research question and the PubMed results to propose testable hypotheses.",
        tools: &[],
        output_key: None,
        sub_agents: &[],
    },
];

/// Every agent, root first
pub fn agents() -> &'static [AgentSpec] {
    &AGENTS
}

/// Look up an agent by name
pub fn find_agent(name: &str) -> Option<&'static AgentSpec> {
    AGENTS.iter().find(|agent| agent.name == name)
}

/// The routing agent the runtime starts with
pub fn root_agent() -> &'static AgentSpec {
    &AGENTS[0]
}

/// An agent paired with the model it should run on
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentBinding {
    #[serde(flatten)]
    pub spec: &'static AgentSpec,
    pub model: String,
}

/// Bind every agent to `model`, for export to the runtime
pub fn bind_agents(model: &str) -> Vec<AgentBinding> {
    AGENTS
        .iter()
        .map(|spec| AgentBinding {
            spec,
            model: model.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_agent_delegates_to_all_others() {
        let root = root_agent();
        assert_eq!(root.name, "hcls_research_agent");
        assert_eq!(root.sub_agents.len(), agents().len() - 1);

        for name in root.sub_agents {
            assert!(find_agent(name).is_some(), "missing sub-agent {}", name);
        }
    }

    #[test]
    fn test_only_search_agent_uses_the_tool() {
        let with_tool: Vec<_> = agents()
            .iter()
            .filter(|a| a.tools.contains(&SEARCH_TOOL))
            .map(|a| a.name)
            .collect();
        assert_eq!(with_tool, vec![SEARCH_AGENT]);
    }

    #[test]
    fn test_output_keys() {
        assert_eq!(
            find_agent(RESEARCH_QUESTION_AGENT).unwrap().output_key,
            Some("research_question")
        );
        assert_eq!(
            find_agent(SEARCH_AGENT).unwrap().output_key,
            Some("pubmed_results")
        );
        assert!(find_agent("nonexistent").is_none());
    }

    #[test]
    fn test_bind_agents_serializes_flat() {
        let bound = bind_agents("gemini-2.5-pro");
        let json = serde_json::to_value(&bound).unwrap();

        assert_eq!(json[2]["name"], "search_agent");
        assert_eq!(json[2]["model"], "gemini-2.5-pro");
        assert_eq!(json[2]["tools"][0], "search_pubmed");
    }
}
