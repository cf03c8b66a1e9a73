//! Core data types used throughout lore-engine.
//!
//! This module defines the message types, tool call structures,
//! and request/response formats that flow between the orchestration
//! loop, the LLM provider and the tool adapter.

use serde::{Deserialize, Serialize};

// --- Message Roles ---

/// The role of a message in the conversation.
///
/// - `System`: instructions to the model (catalog + output guidelines)
/// - `User`: the generation task
/// - `Assistant`: the model's response, possibly carrying tool calls
/// - `Tool`: the result of a tool execution
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

// --- Tool Call ---

/// A tool call request from the LLM.
///
/// The `id` is used to match the tool result back to the request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    /// Unique identifier for this tool call (used to match results)
    pub id: String,
    /// Name of the tool to invoke (e.g. "fetch_genre")
    pub name: String,
    /// JSON-encoded arguments for the tool
    pub arguments: String,
}

/// The outcome of executing one [`ToolCall`].
///
/// `content` is always text: failures are rendered as an error-prefixed
/// string so the model can react to them.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallResult {
    pub call_id: String,
    pub tool_name: String,
    pub content: String,
}

// --- Tool Definition ---

/// Describes a tool's interface to the LLM via JSON Schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema describing the tool's input parameters
    pub input_schema: serde_json::Value,
}

// --- Messages ---

/// A single message in the conversation history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// If the assistant wants to call tools, this will be non-empty
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// For tool result messages, this links back to the tool call ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// For tool result messages, the tool that produced the content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Message {
    fn plain(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: vec![],
            tool_call_id: None,
            name: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(Role::Assistant, content)
    }

    /// Create an assistant message that includes tool calls.
    pub fn assistant_with_tool_calls(
        content: impl Into<String>,
        tool_calls: Vec<ToolCall>,
    ) -> Self {
        Self {
            tool_calls,
            ..Self::plain(Role::Assistant, content)
        }
    }

    /// Create a tool result message from an executed call.
    pub fn tool_result(result: ToolCallResult) -> Self {
        Self {
            tool_call_id: Some(result.call_id),
            name: Some(result.tool_name),
            ..Self::plain(Role::Tool, result.content)
        }
    }
}

// --- Chat Request / Response ---

/// A request to send to the LLM.
///
/// This is our internal representation; the provider converts it
/// into its own wire format.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    /// Tools bound for this invocation
    pub tools: Vec<ToolDefinition>,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// The response from an LLM call.
///
/// Contains either a text reply, tool calls, or both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatResponse {
    /// The text content of the response (may be empty if only tool calls)
    pub content: String,
    /// Tool calls the LLM wants to make (empty if just a text reply)
    pub tool_calls: Vec<ToolCall>,
}

impl ChatResponse {
    /// Returns true if the LLM wants to call tools.
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Returns true if the response carries visible text.
    pub fn has_content(&self) -> bool {
        !self.content.trim().is_empty()
    }
}
