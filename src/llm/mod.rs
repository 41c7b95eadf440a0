//! Model client abstraction.
//!
//! The agent loop only ever asks a [`ModelClient`] for its next step; how
//! that step is obtained (which provider, which wire format) is the client's
//! business.

mod offline;
mod openrouter;

use async_trait::async_trait;
use thiserror::Error;

use crate::conversation::Message;
use crate::tools::{ToolCall, ToolSchema};

pub use offline::OfflineClient;
pub use openrouter::{OpenRouterClient, DEFAULT_BASE_URL};

/// What the model wants to do next.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelStep {
    /// A final textual answer for the user.
    FinalAnswer(String),
    /// One or more tool invocations, in the order they should run.
    ToolRequest {
        /// Optional text the model produced alongside the calls.
        content: Option<String>,
        calls: Vec<ToolCall>,
    },
}

#[derive(Debug, Error)]
pub enum ModelClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid step: {0}")]
    InvalidStep(String),
}

/// Trait for model backends.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Decide the next step given the current context and available tools.
    async fn next_step(
        &self,
        context: &[Message],
        tools: &[ToolSchema],
    ) -> Result<ModelStep, ModelClientError>;
}
