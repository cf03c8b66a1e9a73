//! HTTP API.
//!
//! Every generation request opens its own MCP session, discovers the tools,
//! runs one [`LoreGenerator`] call and releases the session before the
//! response is written. Sessions are never pooled.

pub mod error;
mod routes;

use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::adapter::discover_tools;
use crate::agent::AgentSettings;
use crate::config::AppConfig;
use crate::error::LoreError;
use crate::llm::LlmProvider;
use crate::lore::LoreGenerator;
use crate::mcp::{Connector, McpClient, RetryPolicy};

pub const SERVICE_NAME: &str = "lore-engine";

/// Shared, read-only state handed to every handler.
pub struct AppState {
    settings: AgentSettings,
    llm: Arc<dyn LlmProvider>,
    connector: Arc<dyn Connector>,
    retry: RetryPolicy,
}

/// A connected MCP client and the generator built over its tools.
pub(crate) struct Session {
    client: Arc<McpClient>,
    pub(crate) generator: LoreGenerator,
}

impl Session {
    pub(crate) async fn close(self) {
        self.client.cleanup().await;
    }
}

impl AppState {
    pub fn new(
        config: &AppConfig,
        llm: Arc<dyn LlmProvider>,
        connector: Arc<dyn Connector>,
    ) -> Self {
        Self {
            settings: AgentSettings::from_config(config),
            llm,
            connector,
            retry: config.mcp.retry_policy(),
        }
    }

    /// Connect to the tool server and discover its tools.
    pub(crate) async fn open_session(&self) -> Result<Session, LoreError> {
        let client = Arc::new(McpClient::new(self.connector.clone(), self.retry));
        client.connect().await?;

        let tools = match discover_tools(client.clone()).await {
            Ok(tools) => tools,
            Err(e) => {
                client.cleanup().await;
                return Err(e);
            }
        };
        let generator = LoreGenerator::new(self.llm.clone(), tools, self.settings.clone());
        Ok(Session { client, generator })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    Router::new()
        .route("/health", get(routes::health))
        .route("/factions/:count", get(routes::factions))
        .route("/quests", post(routes::quests))
        .route("/quests/", post(routes::quests))
        .with_state(state)
        .layer(cors)
}

/// Bind the configured address and serve until Ctrl-C.
pub async fn run(config: &AppConfig, state: Arc<AppState>) -> Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Lore engine listening on {}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
            info!("Shutting down");
        })
        .await
        .context("HTTP server failed")
}
