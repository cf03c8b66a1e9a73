//! Error taxonomy for lore generation.
//!
//! Tool failures never surface through this type during a generation:
//! the orchestration loop renders them as text for the model. Everything
//! here is either a lifecycle error or a reason the loop cannot finish.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, LoreError>;

#[derive(Error, Debug)]
pub enum LoreError {
    /// The tool server could not be reached after all retry attempts.
    #[error("Failed to connect to MCP server after {attempts} attempt(s): {message}")]
    Connection { attempts: u32, message: String },

    #[error("Not connected to MCP server. Call connect() first.")]
    NotConnected,

    #[error("MCP transport error: {0}")]
    Transport(String),

    #[error("JSON-RPC error (code {code}): {message}")]
    Rpc { code: i64, message: String },

    #[error("Tool '{tool}' failed: {message}")]
    ToolExecution { tool: String, message: String },

    #[error("Invalid arguments for tool '{tool}': {message}")]
    InvalidArguments { tool: String, message: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Model invocation failed: {0:#}")]
    Model(anyhow::Error),

    #[error("Model returned no content after {iterations} iteration(s)")]
    EmptyResponse { iterations: u32 },

    #[error("LLM did not return valid JSON: {message}")]
    MalformedModelOutput { message: String, raw: String },
}

impl LoreError {
    pub fn malformed(message: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::MalformedModelOutput {
            message: message.into(),
            raw: raw.into(),
        }
    }

    /// The model text that failed to parse, if this is a parse failure.
    pub fn raw_output(&self) -> Option<&str> {
        match self {
            Self::MalformedModelOutput { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

impl From<rmcp::ServiceError> for LoreError {
    fn from(err: rmcp::ServiceError) -> Self {
        match err {
            rmcp::ServiceError::McpError(e) => Self::Rpc {
                code: i64::from(e.code.0),
                message: e.message.into_owned(),
            },
            other => Self::Transport(other.to_string()),
        }
    }
}
