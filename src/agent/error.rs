use thiserror::Error;

use crate::conversation::ConversationError;
use crate::llm::ModelClientError;

/// Failures of the orchestration itself. Tool failures never show up here;
/// they are fed back to the model as tool results.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Max iterations ({limit}) reached without a final answer")]
    MaxIterationsExceeded { limit: usize },

    #[error("Model client error: {0}")]
    ModelClient(#[from] ModelClientError),

    #[error("Cancelled")]
    Cancelled,

    #[error("Conversation error: {0}")]
    Conversation(#[from] ConversationError),
}
