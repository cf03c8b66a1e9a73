//! Scripted LLM providers for driving the agent loop in tests.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::LlmProvider;
use crate::types::{ChatRequest, ChatResponse, ToolCall};

/// Replays a fixed list of responses and records every request it sees.
///
/// Once the script runs out, `fallback` is repeated; without one the
/// provider fails.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<ChatResponse>>,
    fallback: Option<ChatResponse>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<ChatResponse>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn repeating(response: ChatResponse) -> Self {
        Self {
            fallback: Some(response),
            ..Self::new(vec![])
        }
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn invocations(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn chat_completion(&self, request: &ChatRequest) -> Result<ChatResponse> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.script.lock().unwrap().pop_front();
        match next.or_else(|| self.fallback.clone()) {
            Some(response) => Ok(response),
            None => bail!("script exhausted"),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Accepts requests and never answers them.
#[derive(Default)]
pub struct PendingProvider {
    invocations: AtomicUsize,
}

impl PendingProvider {
    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for PendingProvider {
    async fn chat_completion(&self, _request: &ChatRequest) -> Result<ChatResponse> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        std::future::pending().await
    }

    fn name(&self) -> &str {
        "pending"
    }
}

pub fn text(content: &str) -> ChatResponse {
    ChatResponse {
        content: content.to_string(),
        tool_calls: vec![],
    }
}

pub fn calls(calls: &[(&str, &str, &str)]) -> ChatResponse {
    ChatResponse {
        content: String::new(),
        tool_calls: calls
            .iter()
            .map(|(id, name, arguments)| ToolCall {
                id: id.to_string(),
                name: name.to_string(),
                arguments: arguments.to_string(),
            })
            .collect(),
    }
}
