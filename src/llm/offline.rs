//! Fallback client used when no API key is configured.

use async_trait::async_trait;

use super::{ModelClient, ModelClientError, ModelStep};
use crate::conversation::Message;
use crate::tools::ToolSchema;

/// Answers every message by listing the available tools.
#[derive(Debug, Default, Clone)]
pub struct OfflineClient;

#[async_trait]
impl ModelClient for OfflineClient {
    async fn next_step(
        &self,
        _context: &[Message],
        tools: &[ToolSchema],
    ) -> Result<ModelStep, ModelClientError> {
        let names = tools
            .iter()
            .map(|t| t.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        Ok(ModelStep::FinalAnswer(format!(
            "No API key configured. Available tools: {}",
            names
        )))
    }
}
