//! LLM Client module.
//!
//! This module defines the `LlmProvider` trait that abstracts over
//! chat-completion APIs, and provides the OpenAI-compatible implementation.
//! The orchestration loop only ever sees the trait, which is what lets tests
//! drive it with scripted providers.

pub mod openai_compatible;

#[cfg(test)]
pub(crate) mod testing;

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::types::{ChatRequest, ChatResponse};
use openai_compatible::OpenAiCompatibleProvider;

/// Trait that all LLM providers must implement.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a chat completion request and wait for the full response.
    async fn chat_completion(&self, request: &ChatRequest) -> Result<ChatResponse>;

    /// Return the provider's display name (for logging).
    fn name(&self) -> &str;
}

/// Create the LLM provider based on config.
pub fn create_llm_provider(config: &AppConfig) -> Result<Arc<dyn LlmProvider>> {
    let api_key = config.api_key()?;
    let api_base = config.llm.api_base.clone();

    match config.llm.provider.as_str() {
        "openai_compatible" | "openai" => {
            Ok(Arc::new(OpenAiCompatibleProvider::new(api_key, api_base)))
        }
        other => {
            bail!(
                "Unknown provider: '{}'. Supported: 'openai_compatible'",
                other
            )
        }
    }
}
