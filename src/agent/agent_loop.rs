//! Core agent loop implementation.

use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::{Config, DEFAULT_MAX_ITERATIONS};
use crate::conversation::{ConversationStore, Message, DEFAULT_MAX_HISTORY};
use crate::llm::{ModelClient, ModelClientError, ModelStep};
use crate::tools::{ToolRegistry, ToolResult};

use super::error::AgentError;
use super::prompt::build_system_prompt;

/// Tunables for a single agent.
#[derive(Debug, Clone)]
pub struct AgentOptions {
    /// Tool turns allowed per user message.
    pub max_iterations: usize,
    /// User turns kept in the model context.
    pub max_history: usize,
    /// Seeded as the first message of every fresh conversation.
    pub system_prompt: Option<String>,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            max_history: DEFAULT_MAX_HISTORY,
            system_prompt: None,
        }
    }
}

impl AgentOptions {
    pub fn from_config(config: &Config, tools: &ToolRegistry) -> Self {
        Self {
            max_iterations: config.max_iterations,
            max_history: config.max_history,
            system_prompt: Some(build_system_prompt(&config.agent_name, tools)),
        }
    }
}

/// A tool-using agent bound to one conversation.
///
/// Each call to [`Agent::process`] runs one user message to completion; the
/// conversation store is the only state carried between calls.
pub struct Agent {
    client: Arc<dyn ModelClient>,
    tools: Arc<ToolRegistry>,
    conversation: ConversationStore,
    max_iterations: usize,
    system_prompt: Option<String>,
}

impl Agent {
    /// Create an agent with an empty conversation (plus the system prompt,
    /// if one is configured).
    pub fn new(client: Arc<dyn ModelClient>, tools: Arc<ToolRegistry>, options: AgentOptions) -> Self {
        let mut agent = Self {
            client,
            tools,
            conversation: ConversationStore::new(options.max_history),
            max_iterations: options.max_iterations.max(1),
            system_prompt: options.system_prompt,
        };
        agent.seed();
        agent
    }

    fn seed(&mut self) {
        if let Some(prompt) = &self.system_prompt {
            self.conversation.append(Message::system(prompt.clone()));
        }
    }

    pub fn conversation(&self) -> &ConversationStore {
        &self.conversation
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.tools
    }

    /// Process a user message and return the model's final answer.
    pub async fn process(&mut self, user_text: &str) -> Result<String, AgentError> {
        self.process_with_cancel(user_text, &CancellationToken::new())
            .await
    }

    /// Like [`Agent::process`], but stops at the next model call or tool
    /// dispatch once `cancel` fires. Tools already run are not undone.
    pub async fn process_with_cancel(
        &mut self,
        user_text: &str,
        cancel: &CancellationToken,
    ) -> Result<String, AgentError> {
        self.conversation.append(Message::user(user_text));

        let schemas = self.tools.list_schemas();
        let mut tool_turns = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(AgentError::Cancelled);
            }

            tracing::debug!("Agent model turn {}", tool_turns + 1);
            let step = {
                let context = self.conversation.get_context();
                self.client.next_step(&context, &schemas).await?
            };

            let (content, calls) = match step {
                ModelStep::FinalAnswer(text) => {
                    self.conversation.append(Message::assistant(text.clone()));
                    return Ok(text);
                }
                ModelStep::ToolRequest { calls, .. } if calls.is_empty() => {
                    return Err(ModelClientError::InvalidStep(
                        "tool request without tool calls".to_string(),
                    )
                    .into());
                }
                ModelStep::ToolRequest { content, calls } => (content, calls),
            };

            if tool_turns >= self.max_iterations {
                tracing::warn!(
                    "Max iterations ({}) reached, dropping request for {} tool call(s)",
                    self.max_iterations,
                    calls.len()
                );
                return Err(AgentError::MaxIterationsExceeded {
                    limit: self.max_iterations,
                });
            }
            tool_turns += 1;

            self.conversation
                .append(Message::assistant_tool_calls(content, calls.clone()));

            // Sequential on purpose: later calls may depend on earlier side effects.
            for (i, call) in calls.iter().enumerate() {
                if cancel.is_cancelled() {
                    // Answer the remaining calls so the transcript stays paired.
                    for skipped in &calls[i..] {
                        self.conversation.append(Message::tool_result(&ToolResult::err(
                            skipped.call_id.clone(),
                            "Cancelled before execution",
                        )));
                    }
                    return Err(AgentError::Cancelled);
                }

                tracing::info!("Calling tool: {} with args: {:?}", call.name, call.arguments);
                let result = self.tools.dispatch(call).await;
                self.conversation.append(Message::tool_result(&result));
            }
        }
    }

    /// Empty the conversation, then re-seed the system prompt.
    pub fn clear(&mut self) {
        self.conversation.clear();
        self.seed();
    }

    pub async fn save(&self, path: &Path) -> Result<(), AgentError> {
        self.conversation.save(path).await?;
        Ok(())
    }

    /// Replace the conversation with the one saved at `path`.
    pub async fn load(&mut self, path: &Path) -> Result<(), AgentError> {
        self.conversation.load(path).await?;
        Ok(())
    }
}
