//! Name-to-tool registry with deterministic ordering.

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde_json::Value;
use thiserror::Error;

use super::{SharedTool, Tool, ToolCall, ToolError, ToolResult, ToolSchema};

/// What `register` does when a name is already taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegistrationPolicy {
    /// Reject the second registration; the first tool stays in place.
    #[default]
    Strict,
    /// Replace the existing tool, keeping its position in the schema list.
    Permissive,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("tool with name '{0}' already registered")]
    DuplicateTool(String),

    #[error("invalid tool: {0}")]
    InvalidTool(String),
}

/// Registry of the tools available to the agent.
///
/// Populated during setup and read-only afterwards, so it can be shared
/// behind an `Arc` by any number of conversations.
pub struct ToolRegistry {
    policy: RegistrationPolicy,
    tools: Vec<SharedTool>,
    index: HashMap<String, usize>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    /// Create an empty registry in strict mode.
    pub fn new() -> Self {
        Self::with_policy(RegistrationPolicy::Strict)
    }

    pub fn with_policy(policy: RegistrationPolicy) -> Self {
        Self {
            policy,
            tools: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn policy(&self) -> RegistrationPolicy {
        self.policy
    }

    pub fn register<T>(&mut self, tool: T) -> Result<(), RegistryError>
    where
        T: Tool + 'static,
    {
        self.register_shared(Arc::new(tool))
    }

    pub fn register_shared(&mut self, tool: SharedTool) -> Result<(), RegistryError> {
        let name = tool.name().trim().to_string();

        if name.is_empty() {
            return Err(RegistryError::InvalidTool(
                "tool name cannot be empty".to_string(),
            ));
        }

        match (self.index.get(&name).copied(), self.policy) {
            (Some(_), RegistrationPolicy::Strict) => Err(RegistryError::DuplicateTool(name)),
            (Some(slot), RegistrationPolicy::Permissive) => {
                tracing::warn!("Replacing previously registered tool: {}", name);
                self.tools[slot] = tool;
                Ok(())
            }
            (None, _) => {
                tracing::debug!("Registered tool: {}", name);
                self.index.insert(name, self.tools.len());
                self.tools.push(tool);
                Ok(())
            }
        }
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Result<SharedTool, ToolError> {
        self.index
            .get(name)
            .map(|&slot| Arc::clone(&self.tools[slot]))
            .ok_or_else(|| ToolError::NotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Schemas of every registered tool, in registration order.
    pub fn list_schemas(&self) -> Vec<ToolSchema> {
        self.tools
            .iter()
            .map(|tool| ToolSchema {
                name: tool.name().trim().to_string(),
                description: tool.description().to_string(),
                parameters: tool.parameters_schema(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Run a tool call. Never fails: a missing tool, an error returned by the
    /// tool and a panic inside it all become a failed [`ToolResult`].
    pub async fn dispatch(&self, call: &ToolCall) -> ToolResult {
        let tool = match self.get(&call.name) {
            Ok(tool) => tool,
            Err(e) => {
                tracing::warn!("{}", e);
                return ToolResult::err(call.call_id.clone(), e.to_string());
            }
        };

        tracing::info!("Using tool: {} ({})", call.name, call.call_id);
        let args = Value::Object(call.arguments.clone());
        let outcome = AssertUnwindSafe(tool.execute(args)).catch_unwind().await;

        let message = match outcome {
            Ok(Ok(value)) => return ToolResult::ok(call.call_id.clone(), value),
            Ok(Err(e)) => format!("{:#}", e),
            Err(panic) => panic_message(panic.as_ref()),
        };

        let error = ToolError::Execution {
            tool: call.name.clone(),
            message,
        };
        tracing::warn!("{}", error);
        ToolResult::err(call.call_id.clone(), error.to_string())
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}
