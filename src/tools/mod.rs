//! Tool definitions and the registry the agent dispatches through.
//!
//! A tool is a named capability with a JSON schema describing its arguments.
//! The model asks for tools by name; the registry resolves the name and turns
//! every outcome (including a missing tool or a failing one) into a
//! [`ToolResult`] the model can read.

mod content;
mod filesystem;
mod registry;
mod web;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::Config;

pub use content::{ContentTool, ContentToolSpec, CONTENT_TOOLS};
pub use filesystem::{ListDirectory, ReadFile, WriteFile};
pub use registry::{RegistrationPolicy, RegistryError, ToolRegistry};
pub use web::WebSearch;

/// Trait for tools that the agent can invoke.
///
/// Implementations own whatever state they need (a root directory, an HTTP
/// client); the agent treats them as stateless.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name of the tool within a registry.
    fn name(&self) -> &str;

    /// Human-readable description shown to the model.
    fn description(&self) -> &str;

    /// JSON schema for the tool's arguments.
    fn parameters_schema(&self) -> Value;

    /// Execute the tool with the given arguments (always a JSON object).
    async fn execute(&self, args: Value) -> anyhow::Result<Value>;
}

pub type SharedTool = Arc<dyn Tool>;

/// Errors raised while resolving or running a tool.
///
/// These never escape [`ToolRegistry::dispatch`]; they are rendered into a
/// failed [`ToolResult`] instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ToolError {
    #[error("Tool '{0}' not found")]
    NotFound(String),

    #[error("Tool '{tool}' failed: {message}")]
    Execution { tool: String, message: String },
}

/// A request from the model to invoke a named tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
    /// Opaque id echoed back in the matching [`ToolResult`].
    pub call_id: String,
}

impl ToolCall {
    /// Create a call with a freshly generated id.
    pub fn new(name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string(), name, arguments)
    }

    pub fn with_id(
        call_id: impl Into<String>,
        name: impl Into<String>,
        arguments: Map<String, Value>,
    ) -> Self {
        Self {
            name: name.into(),
            arguments,
            call_id: call_id.into(),
        }
    }
}

/// Outcome of a single tool call.
///
/// Exactly one of `result` and `error` is present, matching `success`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawToolResult")]
pub struct ToolResult {
    call_id: String,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ToolResult {
    pub fn ok(call_id: impl Into<String>, result: Value) -> Self {
        Self {
            call_id: call_id.into(),
            success: true,
            result: Some(result),
            error: None,
        }
    }

    pub fn err(call_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            success: false,
            result: None,
            error: Some(error.into()),
        }
    }

    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[derive(Deserialize)]
struct RawToolResult {
    call_id: String,
    success: bool,
    // Present-but-null is a successful `null` result, not a missing one.
    #[serde(default, deserialize_with = "present")]
    result: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl TryFrom<RawToolResult> for ToolResult {
    type Error = String;

    fn try_from(raw: RawToolResult) -> Result<Self, Self::Error> {
        match (raw.success, raw.result, raw.error) {
            (true, Some(result), None) => Ok(ToolResult::ok(raw.call_id, result)),
            (false, None, Some(error)) => Ok(ToolResult::err(raw.call_id, error)),
            _ => Err(format!(
                "tool result '{}' must carry exactly one of result/error matching success",
                raw.call_id
            )),
        }
    }
}

/// What the model is told about a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Build the registry with every built-in tool, honoring the configured
/// duplicate-name policy.
pub fn default_registry(config: &Config) -> Result<ToolRegistry, RegistryError> {
    let policy = if config.strict_tools {
        RegistrationPolicy::Strict
    } else {
        RegistrationPolicy::Permissive
    };
    let mut registry = ToolRegistry::with_policy(policy);

    let root = config.workspace_path.clone();
    registry.register(ListDirectory::new(root.clone()))?;
    registry.register(ReadFile::new(root.clone()))?;
    registry.register(WriteFile::new(root))?;
    registry.register(WebSearch::new())?;

    for spec in CONTENT_TOOLS {
        registry.register(ContentTool::new(spec))?;
    }

    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tool_result_serializes_only_the_populated_side() {
        let ok = serde_json::to_value(ToolResult::ok("c1", json!("done"))).unwrap();
        assert_eq!(ok, json!({"call_id": "c1", "success": true, "result": "done"}));

        let err = serde_json::to_value(ToolResult::err("c2", "boom")).unwrap();
        assert_eq!(err, json!({"call_id": "c2", "success": false, "error": "boom"}));
    }

    #[test]
    fn tool_result_rejects_ambiguous_documents() {
        let both = json!({"call_id": "c", "success": true, "result": 1, "error": "x"});
        assert!(serde_json::from_value::<ToolResult>(both).is_err());

        let mismatched = json!({"call_id": "c", "success": false, "result": 1});
        assert!(serde_json::from_value::<ToolResult>(mismatched).is_err());
    }

    #[test]
    fn null_result_round_trips() {
        let original = ToolResult::ok("c", Value::Null);
        let restored: ToolResult =
            serde_json::from_value(serde_json::to_value(&original).unwrap()).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn default_registry_advertises_builtin_tools_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new(None, "test-model".to_string(), dir.path().to_path_buf());
        let registry = default_registry(&config).unwrap();

        let names: Vec<String> = registry
            .list_schemas()
            .into_iter()
            .map(|schema| schema.name)
            .collect();
        assert_eq!(
            names,
            vec![
                "list", "read", "write", "web_search", "text", "image", "video", "audio",
                "workflow", "seo", "social"
            ]
        );
    }
}
