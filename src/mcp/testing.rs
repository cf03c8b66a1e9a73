//! In-memory connectors for exercising the MCP client without processes.

use async_trait::async_trait;
use rmcp::ServiceExt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::duplex;

use super::client::{Connector, McpSession};
use super::server::LoreToolServer;
use crate::error::{LoreError, Result};
use crate::tools::ToolRouter;

/// Sessions opened through a connector and sessions whose server side
/// has shut down because the client closed or dropped its end.
#[derive(Clone, Default)]
pub struct SessionTally {
    opened: Arc<AtomicU32>,
    released: Arc<AtomicU32>,
}

impl SessionTally {
    pub fn opened(&self) -> u32 {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> u32 {
        self.released.load(Ordering::SeqCst)
    }

    /// Wait up to two seconds for `expected` sessions to be released.
    pub async fn wait_for_release(&self, expected: u32) -> u32 {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while self.released() < expected && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        self.released()
    }
}

/// Serves a router over an in-process duplex pipe, one server task per open.
pub struct InMemoryConnector {
    server: LoreToolServer,
    failures_before_success: u32,
    attempts: Arc<AtomicU32>,
    tally: SessionTally,
}

#[async_trait]
impl Connector for InMemoryConnector {
    async fn open(&self) -> Result<McpSession> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt <= self.failures_before_success {
            return Err(LoreError::Transport(format!(
                "connection refused (attempt {attempt})"
            )));
        }

        let (client_io, server_io) = duplex(64 * 1024);
        let server = self.server.clone();
        let released = self.tally.released.clone();
        tokio::spawn(async move {
            if let Ok(running) = server.serve(server_io).await {
                let _ = running.waiting().await;
            }
            released.fetch_add(1, Ordering::SeqCst);
        });

        let session = ()
            .serve(client_io)
            .await
            .map_err(|e| LoreError::Transport(format!("MCP handshake failed: {e}")))?;
        self.tally.opened.fetch_add(1, Ordering::SeqCst);
        Ok(session)
    }

    fn endpoint(&self) -> String {
        "in-memory".to_string()
    }
}

fn connector(failures: u32, router: ToolRouter) -> InMemoryConnector {
    InMemoryConnector {
        server: LoreToolServer::new(Arc::new(router)),
        failures_before_success: failures,
        attempts: Arc::new(AtomicU32::new(0)),
        tally: SessionTally::default(),
    }
}

pub fn in_memory_connector(router: ToolRouter) -> Arc<dyn Connector> {
    Arc::new(connector(0, router))
}

/// Serves `router` and reports how many sessions were opened and released.
pub fn tracked_connector(router: ToolRouter) -> (Arc<dyn Connector>, SessionTally) {
    let connector = connector(0, router);
    let tally = connector.tally.clone();
    (Arc::new(connector), tally)
}

/// Fails the first `failures` opens, then serves `router`.
pub fn flaky_connector(
    failures: u32,
    router: ToolRouter,
) -> (Arc<dyn Connector>, Arc<AtomicU32>) {
    let connector = connector(failures, router);
    let attempts = connector.attempts.clone();
    (Arc::new(connector), attempts)
}

/// Never connects.
pub fn failing_connector() -> (Arc<dyn Connector>, Arc<AtomicU32>) {
    flaky_connector(u32::MAX, ToolRouter::new())
}
