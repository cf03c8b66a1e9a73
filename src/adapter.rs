//! Tool adapter: discovered MCP tools as model-callable units.
//!
//! Each discovered [`Tool`] becomes an [`McpTool`] carrying a declarative
//! [`ArgumentSchema`]. Every declared property is a required string
//! parameter; no richer typing is inferred from the source schema. The
//! orchestration loop only sees `McpTool`, never the transport.

use rmcp::model::Tool;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{LoreError, Result};
use crate::mcp::ToolSource;
use crate::types::ToolDefinition;

/// String-typed parameters, each with its description.
///
/// Parameters follow the key order of the source schema's `properties`
/// map, which is alphabetical.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgumentSchema {
    params: Vec<(String, String)>,
}

/// Validated arguments for one call.
pub type ToolArguments = BTreeMap<String, String>;

impl ArgumentSchema {
    pub fn from_tool(tool: &Tool) -> Self {
        let params = match tool.input_schema.get("properties") {
            Some(Value::Object(properties)) => properties
                .iter()
                .map(|(name, spec)| {
                    let description = spec
                        .get("description")
                        .and_then(Value::as_str)
                        .unwrap_or_default();
                    (name.clone(), description.to_string())
                })
                .collect(),
            _ => Vec::new(),
        };
        Self { params }
    }

    /// JSON Schema advertised to the model.
    pub fn to_json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .params
            .iter()
            .map(|(name, description)| {
                (
                    name.clone(),
                    json!({ "type": "string", "description": description }),
                )
            })
            .collect();
        let required: Vec<&str> = self.params.iter().map(|(n, _)| n.as_str()).collect();
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Validate raw model arguments.
    ///
    /// Undeclared keys are dropped, missing declared keys are an error,
    /// non-string values are kept as their JSON text.
    pub fn validate(&self, tool: &str, raw: &Value) -> Result<ToolArguments> {
        let empty = Map::new();
        let object = match raw {
            Value::Object(map) => map,
            Value::Null => &empty,
            other => {
                return Err(LoreError::InvalidArguments {
                    tool: tool.to_string(),
                    message: format!("expected an object, got {other}"),
                })
            }
        };

        let mut args = ToolArguments::new();
        for (name, _) in &self.params {
            let value = object.get(name).ok_or_else(|| LoreError::InvalidArguments {
                tool: tool.to_string(),
                message: format!("missing required argument '{name}'"),
            })?;
            let text = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            args.insert(name.clone(), text);
        }
        Ok(args)
    }
}

/// A discovered tool, callable by the orchestration loop.
#[derive(Clone)]
pub struct McpTool {
    name: String,
    description: String,
    schema: ArgumentSchema,
    source: Arc<dyn ToolSource>,
}

impl std::fmt::Debug for McpTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpTool")
            .field("name", &self.name)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

impl McpTool {
    pub fn new(tool: &Tool, source: Arc<dyn ToolSource>) -> Self {
        let description = tool
            .description
            .as_deref()
            .filter(|d| !d.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Tool: {}", tool.name));
        Self {
            name: tool.name.to_string(),
            description,
            schema: ArgumentSchema::from_tool(tool),
            source,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: self.schema.to_json_schema(),
        }
    }

    /// Validate the model's JSON argument text and forward the call.
    pub async fn invoke(&self, raw_arguments: &str) -> Result<String> {
        let raw: Value = if raw_arguments.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(raw_arguments).map_err(|e| LoreError::InvalidArguments {
                tool: self.name.clone(),
                message: format!("arguments are not valid JSON: {e}"),
            })?
        };
        let args = self.schema.validate(&self.name, &raw)?;
        self.call(args).await
    }

    pub async fn call(&self, args: ToolArguments) -> Result<String> {
        let arguments: Map<String, Value> = args
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect();
        self.source.call_tool(&self.name, arguments).await
    }
}

/// Discover the source's tools and wrap each one.
pub async fn discover_tools(source: Arc<dyn ToolSource>) -> Result<Vec<McpTool>> {
    let listed = source.list_tools().await?;
    let tools: Vec<McpTool> = listed
        .iter()
        .map(|t| {
            debug!("Adapting MCP tool '{}'", t.name);
            McpTool::new(t, source.clone())
        })
        .collect();
    info!("Adapted {} MCP tool(s)", tools.len());
    Ok(tools)
}
