//! ReAct reasoning loop: the model thinks, calls tools, and observes results
//! until it produces a final answer.
//!
//! The model reasons step by step, requesting tools to gather
//! information, then synthesizes a final answer. The loop terminates
//! when the model returns a response with no tool calls, or when max
//! iterations is reached.

use std::sync::Arc;
use tether_core::message::Message;
use tether_core::provider::{Provider, ProviderRequest};
use tether_core::tool::{ToolCall, ToolRegistry};
use tracing::{debug, info, warn};

/// The tool-calling reasoning loop.
pub struct ReactAgent {
    /// LLM provider.
    provider: Arc<dyn Provider>,
    /// Model name.
    model: String,
    /// Temperature.
    temperature: f32,
    /// Default max tokens per response.
    max_tokens: Option<u32>,
    /// Tool registry.
    tools: Arc<ToolRegistry>,
    /// Maximum reasoning iterations.
    max_iterations: u32,
}

/// The result of a ReAct execution.
#[derive(Debug)]
pub struct ReactResult {
    /// Messages produced by this run, in order: assistant turns and the
    /// tool results they triggered. Never includes the input messages.
    pub messages: Vec<Message>,
    /// The final answer text.
    pub answer: String,
    /// Number of iterations used.
    pub iterations: usize,
    /// Total tool calls made.
    pub tool_calls_made: usize,
}

impl ReactAgent {
    /// Create a new ReAct agent.
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        temperature: f32,
        tools: Arc<ToolRegistry>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature,
            max_tokens: None,
            tools,
            max_iterations: 10,
        }
    }

    /// Set max iterations.
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    /// Set the default max tokens per LLM response.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Execute the ReAct loop against an existing transcript.
    ///
    /// The transcript is not modified; everything the run produces comes
    /// back in [`ReactResult::messages`] for the caller to append.
    pub async fn run(&self, transcript: &[Message]) -> Result<ReactResult, tether_core::Error> {
        let tool_defs = self.tools.definitions();
        let mut produced: Vec<Message> = Vec::new();
        let mut total_tool_calls = 0usize;
        let mut iterations = 0usize;

        info!(
            model = %self.model,
            tools = self.tools.len(),
            max_iter = self.max_iterations,
            "ReAct loop starting"
        );

        while iterations < self.max_iterations as usize {
            iterations += 1;
            debug!(iteration = iterations, "ReAct iteration");

            let mut messages = transcript.to_vec();
            messages.extend(produced.iter().cloned());

            let request = ProviderRequest {
                model: self.model.clone(),
                messages,
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                tools: tool_defs.clone(),
            };

            let response = self.provider.complete(request).await?;

            if let Some(usage) = &response.usage {
                debug!(
                    model = %response.model,
                    tokens = usage.total_tokens,
                    "Completion received"
                );
            }

            // No tool calls means the model is done.
            if response.message.tool_calls.is_empty() {
                let answer = response.message.content.clone();
                produced.push(response.message);

                info!(
                    iterations,
                    tool_calls = total_tool_calls,
                    "ReAct loop completed"
                );

                return Ok(ReactResult {
                    messages: produced,
                    answer,
                    iterations,
                    tool_calls_made: total_tool_calls,
                });
            }

            let tool_calls = response.message.tool_calls.clone();
            produced.push(response.message);

            for tc in &tool_calls {
                total_tool_calls += 1;

                // Models occasionally emit broken argument JSON; report it
                // back as a tool result so the model can correct itself.
                let arguments = match serde_json::from_str(&tc.arguments) {
                    Ok(value) => value,
                    Err(e) => {
                        warn!(tool = %tc.name, error = %e, "Malformed tool arguments");
                        produced.push(Message::tool_result(
                            &tc.id,
                            &format!("Error: invalid tool arguments: {e}"),
                        ));
                        continue;
                    }
                };

                let call = ToolCall {
                    id: tc.id.clone(),
                    name: tc.name.clone(),
                    arguments,
                };

                match self.tools.execute(&call).await {
                    Ok(tool_result) => {
                        debug!(
                            tool = %tc.name,
                            success = tool_result.success,
                            "Tool executed"
                        );
                        produced.push(Message::tool_result(&tc.id, &tool_result.output));
                    }
                    Err(e) => {
                        // The model sees the failure and can recover.
                        warn!(tool = %tc.name, error = %e, "Tool execution failed");
                        produced.push(Message::tool_result(&tc.id, &format!("Error: {e}")));
                    }
                }
            }
        }

        warn!("ReAct: max iterations reached ({})", self.max_iterations);

        let answer =
            "I've reached the maximum number of reasoning iterations. Here's what I found so far."
                .to_string();
        produced.push(Message::assistant(&answer));

        Ok(ReactResult {
            messages: produced,
            answer,
            iterations,
            tool_calls_made: total_tool_calls,
        })
    }
}
