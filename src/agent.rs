//! Agent Loop - the bounded conversation between the model and the tools.
//!
//! ```text
//! seed (system + user)
//!     |
//!     v
//! +--------+  tool calls  +-------+
//! |  LLM   |------------->| Tools |
//! +--------+<-------------+-------+
//!     |        results
//!     v
//! final text | exhausted | failed
//! ```
//!
//! Each iteration is one model invocation. A response with tool calls runs
//! the whole batch (concurrently, joined before the next invocation) and
//! feeds every result back; a response with text and no tool calls ends the
//! loop; an empty response is skipped. The iteration cap bounds cost: at
//! the cap, the text of the last response is the result, and if that text is
//! empty the run fails.

use futures_util::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::adapter::McpTool;
use crate::config::AppConfig;
use crate::error::{LoreError, Result};
use crate::llm::LlmProvider;
use crate::types::{ChatRequest, Message, ToolCall, ToolCallResult, ToolDefinition};

/// Model parameters and the iteration cap for one loop.
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub max_iterations: u32,
}

impl AgentSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            model: config.llm.model.clone(),
            max_tokens: config.llm.max_tokens,
            temperature: config.llm.temperature,
            max_iterations: config.agent.max_iterations,
        }
    }
}

/// Per-tool execution limits over a whole loop. Tools not listed are unlimited.
#[derive(Debug, Clone, Default)]
pub struct CallBudget {
    remaining: HashMap<String, usize>,
}

impl CallBudget {
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn limit(mut self, tool: impl Into<String>, calls: usize) -> Self {
        self.remaining.insert(tool.into(), calls);
        self
    }

    /// Consume one call of `tool`; false when its budget is spent.
    fn take(&mut self, tool: &str) -> bool {
        match self.remaining.get_mut(tool) {
            None => true,
            Some(0) => false,
            Some(left) => {
                *left -= 1;
                true
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The model answered with text and no tool calls.
    Final,
    /// The iteration cap was hit; the last non-empty content is returned.
    Exhausted,
}

/// Outcome of a finished loop.
#[derive(Debug, Clone)]
pub struct AgentRun {
    pub content: String,
    pub stop: StopReason,
    pub iterations: u32,
    /// The full conversation, including the final assistant turn.
    pub messages: Vec<Message>,
}

impl AgentRun {
    /// Number of executed-or-refused calls to `tool` across all rounds.
    pub fn tool_calls_named(&self, tool: &str) -> usize {
        self.messages
            .iter()
            .flat_map(|m| m.tool_calls.iter())
            .filter(|c| c.name == tool)
            .count()
    }
}

/// Runs tool-calling conversations against one model and one tool catalog.
pub struct Agent {
    llm: Arc<dyn LlmProvider>,
    tools: Vec<McpTool>,
    definitions: Vec<ToolDefinition>,
    settings: AgentSettings,
}

impl Agent {
    pub fn new(llm: Arc<dyn LlmProvider>, tools: Vec<McpTool>, settings: AgentSettings) -> Self {
        let definitions = tools.iter().map(McpTool::definition).collect();
        Self {
            llm,
            tools,
            definitions,
            settings,
        }
    }

    pub fn tools(&self) -> &[McpTool] {
        &self.tools
    }

    /// Run the loop from the seed conversation until a final answer.
    pub async fn run(&self, seed: Vec<Message>, mut budget: CallBudget) -> Result<AgentRun> {
        let mut messages = seed;
        let mut last_content = String::new();
        let max_iterations = self.settings.max_iterations;

        for iteration in 1..=max_iterations {
            debug!("LLM invocation iteration {}", iteration);
            let request = ChatRequest {
                model: self.settings.model.clone(),
                messages: messages.clone(),
                tools: self.definitions.clone(),
                max_tokens: self.settings.max_tokens,
                temperature: self.settings.temperature,
            };

            let response = self
                .llm
                .chat_completion(&request)
                .await
                .map_err(LoreError::Model)?;
            // Only the latest response counts if the cap is reached.
            last_content = response.content.clone();

            if response.has_tool_calls() {
                info!("LLM requested {} tool call(s)", response.tool_calls.len());
                messages.push(Message::assistant_with_tool_calls(
                    &response.content,
                    response.tool_calls.clone(),
                ));
                let results = self.execute_round(&response.tool_calls, &mut budget).await;
                messages.extend(results.into_iter().map(Message::tool_result));
                continue;
            }

            if response.has_content() {
                info!("LLM returned final response after {} iteration(s)", iteration);
                messages.push(Message::assistant(&response.content));
                return Ok(AgentRun {
                    content: response.content,
                    stop: StopReason::Final,
                    iterations: iteration,
                    messages,
                });
            }

            warn!("LLM returned an empty response, retrying");
        }

        warn!("Max iterations ({}) reached", max_iterations);
        if !last_content.trim().is_empty() {
            return Ok(AgentRun {
                content: last_content,
                stop: StopReason::Exhausted,
                iterations: max_iterations,
                messages,
            });
        }
        Err(LoreError::EmptyResponse {
            iterations: max_iterations,
        })
    }

    /// Execute one round of tool calls. Results keep the order of `calls`,
    /// and every call yields a result, failed or not.
    async fn execute_round(
        &self,
        calls: &[ToolCall],
        budget: &mut CallBudget,
    ) -> Vec<ToolCallResult> {
        let pending = calls.iter().map(|call| {
            let permitted = budget.take(&call.name);
            async move {
                let content = if permitted {
                    self.execute_call(call).await
                } else {
                    warn!("Refusing call to '{}': budget exhausted", call.name);
                    format!("Error: call budget for '{}' exhausted", call.name)
                };
                ToolCallResult {
                    call_id: call.id.clone(),
                    tool_name: call.name.clone(),
                    content,
                }
            }
        });
        join_all(pending).await
    }

    async fn execute_call(&self, call: &ToolCall) -> String {
        info!("Executing tool call: {} with args: {}", call.name, call.arguments);
        let Some(tool) = self.tools.iter().find(|t| t.name() == call.name) else {
            warn!("Model requested unknown tool '{}'", call.name);
            return format!("Error: Unknown tool: {}", call.name);
        };
        match tool.invoke(&call.arguments).await {
            Ok(output) => output,
            Err(e) => {
                warn!("Tool call failed for {}: {}", call.name, e);
                format!("Error: {}", e)
            }
        }
    }
}
