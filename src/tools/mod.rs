//! Tool System module.
//!
//! The tools hosted by the MCP server. Every tool implements [`Tool`];
//! the [`ToolRouter`] holds them and dispatches calls by name.

pub mod content_api;

#[cfg(test)]
pub(crate) mod testing;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::config::ToolsConfig;
use crate::types::ToolDefinition;
use content_api::{ContentApiTool, ContentKind};

/// Trait that all tools must implement.
///
/// Tools receive JSON arguments and return a string result.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g. "fetch_genre").
    fn name(&self) -> &str;

    /// A human-readable description of what this tool does.
    /// The LLM reads this to decide when to use the tool.
    fn description(&self) -> &str;

    /// JSON Schema describing the tool's input parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given JSON arguments.
    async fn execute(&self, params: serde_json::Value) -> Result<String>;

    /// Convert this tool into a ToolDefinition for listing.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.parameters_schema(),
        }
    }
}

/// Routes tool calls to the correct tool implementation.
pub struct ToolRouter {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRouter {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Register a tool with the router.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.push(tool);
    }

    /// All tool definitions, in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.to_definition()).collect()
    }

    /// Execute a tool by name with the given arguments.
    pub async fn execute(&self, name: &str, params: serde_json::Value) -> Result<String> {
        let tool = self
            .tools
            .iter()
            .find(|t| t.name() == name)
            .with_context(|| format!("Unknown tool: {}", name))?;

        tool.execute(params).await
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t.name() == name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }
}

impl Default for ToolRouter {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a ToolRouter with the content tools registered.
pub fn create_default_router(config: &ToolsConfig) -> ToolRouter {
    let client = reqwest::Client::new();
    let mut router = ToolRouter::new();
    for kind in [ContentKind::Genre, ContentKind::Story] {
        router.register(Box::new(ContentApiTool::new(
            kind,
            &config.content_api_base,
            client.clone(),
        )));
    }
    router
}
