//! Configuration management for the tool agent.
//!
//! Configuration can be set via environment variables:
//! - `OPENROUTER_API_KEY` - Optional. Without it the agent runs with an offline client.
//! - `OPENROUTER_BASE_URL` - Optional. OpenAI-compatible endpoint. Defaults to OpenRouter.
//! - `DEFAULT_MODEL` - Optional. Model identifier. Defaults to `google/gemini-flash-1.5`.
//! - `WORKSPACE_PATH` - Optional. Root for file tools. Defaults to current directory.
//! - `AGENT_NAME` - Optional. Display name. Defaults to `AI Agent`.
//! - `MAX_ITERATIONS` - Optional. Tool turns allowed per user message. Defaults to `10`.
//! - `MAX_HISTORY` - Optional. User turns kept in model context. Defaults to `20`.
//! - `STRICT_TOOLS` - Optional. Reject duplicate tool names. Defaults to `true`.
//! - `CONVERSATION_PATH` - Optional. Conversation file loaded at startup and saved on exit.

use std::path::PathBuf;
use thiserror::Error;

use crate::conversation::DEFAULT_MAX_HISTORY;
use crate::llm::DEFAULT_BASE_URL;

pub const DEFAULT_MAX_ITERATIONS: usize = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Agent configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// OpenRouter API key
    pub api_key: Option<String>,

    /// Chat-completions base URL
    pub base_url: String,

    /// Default LLM model identifier (OpenRouter format)
    pub default_model: String,

    /// Workspace directory for file operations
    pub workspace_path: PathBuf,

    /// Display name of the agent
    pub agent_name: String,

    /// Maximum tool turns per user message
    pub max_iterations: usize,

    /// User turns retained in the model context
    pub max_history: usize,

    /// Reject (true) or replace (false) tools registered under a taken name
    pub strict_tools: bool,

    /// Where the conversation is persisted, if anywhere
    pub conversation_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for unparseable or zero bounds.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("OPENROUTER_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());

        let base_url = std::env::var("OPENROUTER_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let default_model = std::env::var("DEFAULT_MODEL")
            .unwrap_or_else(|_| "google/gemini-flash-1.5".to_string());

        let workspace_path = std::env::var("WORKSPACE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

        let agent_name = std::env::var("AGENT_NAME").unwrap_or_else(|_| "AI Agent".to_string());

        let max_iterations = parse_bound("MAX_ITERATIONS", DEFAULT_MAX_ITERATIONS)?;
        let max_history = parse_bound("MAX_HISTORY", DEFAULT_MAX_HISTORY)?;

        let strict_tools = std::env::var("STRICT_TOOLS")
            .ok()
            .map(|v| parse_bool(&v).map_err(|e| ConfigError::InvalidValue("STRICT_TOOLS".to_string(), e)))
            .transpose()?
            .unwrap_or(true);

        let conversation_path = std::env::var("CONVERSATION_PATH")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            api_key,
            base_url,
            default_model,
            workspace_path,
            agent_name,
            max_iterations,
            max_history,
            strict_tools,
            conversation_path,
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(api_key: Option<String>, default_model: String, workspace_path: PathBuf) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            default_model,
            workspace_path,
            agent_name: "AI Agent".to_string(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            max_history: DEFAULT_MAX_HISTORY,
            strict_tools: true,
            conversation_path: None,
        }
    }
}

fn parse_bound(var: &str, default: usize) -> Result<usize, ConfigError> {
    let Ok(raw) = std::env::var(var) else {
        return Ok(default);
    };
    match raw.trim().parse::<usize>() {
        Ok(0) => Err(ConfigError::InvalidValue(
            var.to_string(),
            "must be at least 1".to_string(),
        )),
        Ok(value) => Ok(value),
        Err(e) => Err(ConfigError::InvalidValue(var.to_string(), format!("{}", e))),
    }
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => Ok(true),
        "0" | "false" | "f" | "no" | "n" | "off" => Ok(false),
        other => Err(format!("expected boolean-like value, got: {}", other)),
    }
}
