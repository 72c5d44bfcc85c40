//! MCP server implementation using pmcp (Pragmatic AI's rust-mcp-sdk).
//!
//! Exposes the tool registry over stdio so an agent runtime can call
//! `search_pubmed` as a function tool.

use crate::mcp::tools::ToolRegistry;
use async_trait::async_trait;
use pmcp::{Error, RequestHandlerExtra, Server, ServerCapabilities, ToolHandler, ToolInfo};
use serde_json::Value;
use std::sync::Arc;

/// The MCP server for the research workflow's tools
pub struct McpServer {
    server: Server,
    tool_names: Vec<String>,
}

impl std::fmt::Debug for McpServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpServer")
            .field("tools", &self.tool_names)
            .finish()
    }
}

impl McpServer {
    /// Create a new MCP server serving every tool in `tools`
    pub fn new(tools: ToolRegistry) -> Result<Self, pmcp::Error> {
        let mut tool_names: Vec<String> = tools.all().map(|t| t.name.clone()).collect();
        tool_names.sort();

        let server = Self::build_server_impl(tools)?;
        Ok(Self { server, tool_names })
    }

    /// Names of the tools this server exposes
    pub fn tool_names(&self) -> &[String] {
        &self.tool_names
    }

    fn build_server_impl(tools: ToolRegistry) -> Result<Server, pmcp::Error> {
        let mut builder = Server::builder()
            .name(env!("CARGO_PKG_NAME"))
            .version(env!("CARGO_PKG_VERSION"))
            .capabilities(ServerCapabilities::default());

        for tool in tools.all() {
            let tool_handler = ToolWrapper {
                name: tool.name.clone(),
                description: Some(tool.description.clone()),
                input_schema: tool.input_schema.clone(),
                handler: tool.handler.clone(),
            };
            builder = builder.tool(tool_handler.name.clone(), tool_handler);
        }

        builder.build()
    }

    /// Run the server in stdio mode until the client disconnects
    pub async fn run(self) -> Result<(), pmcp::Error> {
        tracing::info!(tools = ?self.tool_names, "Starting MCP server in stdio mode");
        self.server.run_stdio().await
    }
}

/// Wrapper for adapting our Tool to pmcp's ToolHandler
#[derive(Clone)]
struct ToolWrapper {
    name: String,
    description: Option<String>,
    input_schema: Value,
    handler: Arc<dyn crate::mcp::tools::ToolHandler>,
}

#[async_trait]
impl ToolHandler for ToolWrapper {
    async fn handle(&self, args: Value, _extra: RequestHandlerExtra) -> Result<Value, Error> {
        self.handler
            .execute(args)
            .await
            .map_err(|e| Error::internal(&e))
    }

    fn metadata(&self) -> Option<ToolInfo> {
        Some(ToolInfo::new(
            self.name.clone(),
            self.description.clone(),
            self.input_schema.clone(),
        ))
    }
}
