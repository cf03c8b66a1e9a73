//! MCP client: session lifecycle, discovery and tool invocation.

use async_trait::async_trait;
use rmcp::model::{CallToolRequestParams, Tool};
use rmcp::service::{Peer, RunningService};
use rmcp::transport::{ConfigureCommandExt, TokioChildProcess};
use rmcp::{RoleClient, ServiceExt};
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::{LoreError, Result};

/// A live client session. Dropping it cancels the session in the
/// background; [`McpClient::cleanup`] closes it and waits.
pub type McpSession = RunningService<RoleClient, ()>;

/// Bounded exponential backoff for connection attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after the given failed attempt (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

/// Opens fresh sessions; one per registry session.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a transport and complete the MCP handshake over it.
    async fn open(&self) -> Result<McpSession>;

    /// Human-readable endpoint description, for logs.
    fn endpoint(&self) -> String;
}

/// Spawns the tool server as a child process speaking MCP over stdio.
///
/// The child is killed when its session is dropped, so a cancelled
/// request still releases the process.
pub struct StdioConnector {
    command: PathBuf,
    args: Vec<String>,
}

impl StdioConnector {
    pub fn new(command: PathBuf, args: Vec<String>) -> Self {
        Self { command, args }
    }
}

#[async_trait]
impl Connector for StdioConnector {
    async fn open(&self) -> Result<McpSession> {
        let transport = TokioChildProcess::new(Command::new(&self.command).configure(|cmd| {
            cmd.args(&self.args);
        }))
        .map_err(|e| {
            LoreError::Transport(format!(
                "Failed to spawn {}: {}",
                self.command.display(),
                e
            ))
        })?;

        ().serve(transport)
            .await
            .map_err(|e| LoreError::Transport(format!("MCP handshake failed: {e}")))
    }

    fn endpoint(&self) -> String {
        format!("{} {}", self.command.display(), self.args.join(" "))
    }
}

/// Anything that can list and call tools.
///
/// Implemented by [`McpClient`]; the tool adapter depends only on this.
#[async_trait]
pub trait ToolSource: Send + Sync {
    async fn list_tools(&self) -> Result<Vec<Tool>>;

    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> Result<String>;
}

/// One session with an MCP tool server.
///
/// Created disconnected; [`connect`](Self::connect) performs the handshake
/// and [`cleanup`](Self::cleanup) releases it. Calls made outside that
/// window fail with [`LoreError::NotConnected`].
pub struct McpClient {
    connector: Arc<dyn Connector>,
    retry: RetryPolicy,
    session: Mutex<Option<McpSession>>,
}

impl McpClient {
    pub fn new(connector: Arc<dyn Connector>, retry: RetryPolicy) -> Self {
        Self {
            connector,
            retry,
            session: Mutex::new(None),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.session
            .lock()
            .map(|slot| slot.is_some())
            .unwrap_or(false)
    }

    /// Open a session, retrying with backoff.
    pub async fn connect(&self) -> Result<()> {
        if self.is_connected() {
            return Ok(());
        }
        let endpoint = self.connector.endpoint();
        let mut last_error = String::new();

        for attempt in 1..=self.retry.max_attempts {
            info!("Connecting to MCP server at {} (attempt {})", endpoint, attempt);
            match self.connector.open().await {
                Ok(session) => {
                    if let Some(info) = session.peer_info() {
                        debug!(
                            "MCP server {} {} (protocol {})",
                            info.server_info.name,
                            info.server_info.version,
                            info.protocol_version
                        );
                    }
                    self.set_session(Some(session));
                    info!("Successfully connected to MCP server");
                    return Ok(());
                }
                Err(e) => {
                    warn!("Failed to connect to MCP server: {}", e);
                    last_error = e.to_string();
                }
            }
            if attempt < self.retry.max_attempts {
                tokio::time::sleep(self.retry.delay_after(attempt)).await;
            }
        }

        Err(LoreError::Connection {
            attempts: self.retry.max_attempts,
            message: last_error,
        })
    }

    fn set_session(&self, session: Option<McpSession>) -> Option<McpSession> {
        match self.session.lock() {
            Ok(mut slot) => std::mem::replace(&mut *slot, session),
            Err(poisoned) => std::mem::replace(&mut *poisoned.into_inner(), session),
        }
    }

    fn peer(&self) -> Result<Peer<RoleClient>> {
        self.session
            .lock()
            .ok()
            .and_then(|slot| slot.as_ref().map(|s| s.peer().clone()))
            .ok_or(LoreError::NotConnected)
    }

    /// Release the session. Safe to call any number of times.
    pub async fn cleanup(&self) {
        if let Some(session) = self.set_session(None) {
            info!("Cleaning up MCP client resources");
            if let Err(e) = session.cancel().await {
                warn!("Error during MCP cleanup: {}", e);
            }
        }
    }
}

/// Concatenated text blocks of a tool result.
fn joined_text(result: &rmcp::model::CallToolResult) -> String {
    result
        .content
        .iter()
        .filter_map(|c| c.raw.as_text())
        .map(|t| t.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl ToolSource for McpClient {
    async fn list_tools(&self) -> Result<Vec<Tool>> {
        let tools = self.peer()?.list_all_tools().await?;
        info!("Found {} available tools", tools.len());
        Ok(tools)
    }

    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> Result<String> {
        let peer = self.peer()?;
        info!("Calling tool '{}' with arguments: {:?}", name, arguments);

        let result = peer
            .call_tool(CallToolRequestParams {
                meta: None,
                name: name.to_string().into(),
                arguments: Some(arguments),
                task: None,
            })
            .await?;

        if result.is_error == Some(true) {
            return Err(LoreError::ToolExecution {
                tool: name.to_string(),
                message: joined_text(&result),
            });
        }
        debug!("Tool '{}' executed successfully", name);
        Ok(joined_text(&result))
    }
}
