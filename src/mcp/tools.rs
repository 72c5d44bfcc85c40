//! Tool registry for MCP tools.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::agents::SEARCH_TOOL;
use crate::models::{result_to_json, RetrievalQuery};
use crate::retrieval::Retriever;

/// An MCP tool that can be called by the client
#[derive(Clone)]
pub struct Tool {
    /// Tool name (e.g., "search_pubmed")
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// JSON Schema for input parameters
    pub input_schema: serde_json::Value,

    /// Handler function to execute the tool
    pub handler: Arc<dyn ToolHandler>,
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("input_schema", &self.input_schema)
            .finish()
    }
}

/// Handler for executing a tool
#[async_trait::async_trait]
pub trait ToolHandler: Send + Sync + std::fmt::Debug {
    /// Execute the tool with the given arguments
    async fn execute(&self, args: Value) -> Result<Value, String>;
}

/// Registry for all MCP tools
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Tool>,
}

impl ToolRegistry {
    /// Create a registry exposing the retrieval tool backed by `retriever`
    pub fn new(retriever: Retriever) -> Self {
        let mut registry = Self::default();

        registry.register(Tool {
            name: SEARCH_TOOL.to_string(),
            description: format!(
                "Fetch articles with abstracts for a search string from {}. \
                 Returns a list of {{pmid, article}} objects, or an object with \
                 error \"connection_error\" or \"no_results\".",
                retriever.source().name()
            ),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "search_string": {
                        "type": "string",
                        "description": "Search expression (e.g., 'Treatment for KRAS G13D Breast Cancer')"
                    },
                    "email": {
                        "type": "string",
                        "description": "Contact email sent to the Entrez API (e.g., 'admin@website.com')"
                    },
                    "limit": {
                        "type": "integer",
                        "minimum": 1,
                        "description": "Maximum number of articles to fetch"
                    }
                },
                "required": ["search_string", "email", "limit"]
            }),
            handler: Arc::new(SearchPubmedHandler { retriever }),
        });

        registry
    }

    /// Register a tool, replacing any tool with the same name
    pub fn register(&mut self, tool: Tool) {
        self.tools.insert(tool.name.clone(), tool);
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.tools.get(name)
    }

    /// All registered tools
    pub fn all(&self) -> impl Iterator<Item = &Tool> {
        self.tools.values()
    }

    /// Execute a tool by name
    pub async fn execute(&self, name: &str, args: Value) -> Result<Value, String> {
        let tool = self
            .get(name)
            .ok_or_else(|| format!("Unknown tool: {}", name))?;
        tool.handler.execute(args).await
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct SearchPubmedArgs {
    search_string: String,
    email: String,
    limit: u64,
}

/// Runs a PubMed retrieval for the `search_pubmed` tool
#[derive(Debug)]
pub struct SearchPubmedHandler {
    retriever: Retriever,
}

#[async_trait::async_trait]
impl ToolHandler for SearchPubmedHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let args: SearchPubmedArgs =
            serde_json::from_value(args).map_err(|e| format!("Invalid arguments: {}", e))?;

        if args.limit == 0 {
            return Err("Invalid arguments: limit must be a positive integer".to_string());
        }
        let limit = usize::try_from(args.limit)
            .map_err(|_| "Invalid arguments: limit is too large".to_string())?;

        let query = RetrievalQuery::new(args.search_string, args.email).limit(limit);
        let result = self.retriever.retrieve(&query).await;

        Ok(result_to_json(&result))
    }
}
