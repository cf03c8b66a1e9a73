//! Model Context Protocol plumbing, built on `rmcp`.
//!
//! ```text
//! LoreGenerator --(McpTool)--> McpClient --(stdio)--> lore-engine mcp-server
//!                                                           |
//!                                                           v
//!                                                     ToolRouter (fetch_genre, fetch_story)
//! ```
//!
//! The client side is the tool registry: one session per API request,
//! discovered tools, call-by-name. The server side hosts the content
//! tools in a child process.

pub mod client;
pub mod server;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{Connector, McpClient, RetryPolicy, StdioConnector, ToolSource};
