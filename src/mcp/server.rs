//! MCP tool server.
//!
//! Serves the tools of a [`ToolRouter`] through an rmcp [`ServerHandler`].
//! `lore-engine mcp-server` runs it on stdin/stdout; stdout carries
//! protocol frames only, so all logging goes to stderr.

use anyhow::Result;
use rmcp::model::{
    CallToolRequestParams, CallToolResult, Content, Implementation, ListToolsResult,
    PaginatedRequestParams, ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData, RoleServer, ServerHandler, ServiceExt};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use crate::tools::ToolRouter;

pub const SERVER_NAME: &str = "lore-engine-mcp";

/// Exposes a [`ToolRouter`] as MCP tools.
#[derive(Clone)]
pub struct LoreToolServer {
    router: Arc<ToolRouter>,
}

impl LoreToolServer {
    pub fn new(router: Arc<ToolRouter>) -> Self {
        Self { router }
    }

    fn catalog(&self) -> Vec<Tool> {
        self.router
            .definitions()
            .into_iter()
            .map(|d| {
                let schema = match d.input_schema {
                    Value::Object(map) => map,
                    _ => Default::default(),
                };
                Tool::new(d.name, d.description, schema)
            })
            .collect()
    }
}

impl ServerHandler for LoreToolServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some("Content tools for worldbuilding lore.".to_string()),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult::with_all_items(self.catalog()))
    }

    fn get_tool(&self, name: &str) -> Option<Tool> {
        self.catalog().into_iter().find(|t| t.name == name)
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        if !self.router.has_tool(&request.name) {
            return Err(ErrorData::invalid_params(
                format!("Unknown tool: {}", request.name),
                None,
            ));
        }

        info!("Executing tool '{}'", request.name);
        let arguments = Value::Object(request.arguments.unwrap_or_default());
        match self.router.execute(&request.name, arguments).await {
            Ok(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
            Err(e) => Ok(CallToolResult::error(vec![Content::text(format!("{e:#}"))])),
        }
    }
}

/// Run the server on this process's stdio until the client disconnects.
pub async fn serve_stdio(router: ToolRouter) -> Result<()> {
    info!("Starting {} with {} tool(s)", SERVER_NAME, router.len());
    let service = LoreToolServer::new(Arc::new(router))
        .serve(rmcp::transport::io::stdio())
        .await?;
    let reason = service.waiting().await?;
    info!("MCP client disconnected ({:?}), shutting down", reason);
    Ok(())
}
