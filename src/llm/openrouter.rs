//! OpenRouter (OpenAI-compatible chat completions) client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{ModelClient, ModelClientError, ModelStep};
use crate::conversation::{Message, Role};
use crate::tools::{ToolCall, ToolSchema};

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Chat-completions client for OpenRouter or any OpenAI-compatible endpoint.
pub struct OpenRouterClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenRouterClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self::with_base_url(api_key, model, DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url(api_key: String, model: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool<'a>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<WireToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    #[serde(default)]
    id: String,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    function: WireFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunction {
    name: String,
    /// JSON-encoded argument object.
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Serialize)]
struct WireTool<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireFunctionDef<'a>,
}

#[derive(Debug, Serialize)]
struct WireFunctionDef<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: WireMessage,
}

fn function_kind() -> String {
    "function".to_string()
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    }
}

fn to_wire(message: &Message) -> WireMessage {
    let text = message.text().into_owned();
    let content = if text.is_empty() && !message.tool_calls.is_empty() {
        None
    } else {
        Some(text)
    };

    WireMessage {
        role: role_name(message.role).to_string(),
        content,
        tool_calls: message
            .tool_calls
            .iter()
            .map(|call| WireToolCall {
                id: call.call_id.clone(),
                kind: function_kind(),
                function: WireFunction {
                    name: call.name.clone(),
                    arguments: Value::Object(call.arguments.clone()).to_string(),
                },
            })
            .collect(),
        tool_call_id: message.tool_call_id.clone(),
    }
}

fn parse_step(response: ChatResponse) -> Result<ModelStep, ModelClientError> {
    let message = response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message)
        .ok_or_else(|| ModelClientError::InvalidResponse("no choices in response".to_string()))?;

    let content = message.content.filter(|c| !c.trim().is_empty());

    if !message.tool_calls.is_empty() {
        let calls = message
            .tool_calls
            .into_iter()
            .map(parse_tool_call)
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(ModelStep::ToolRequest { content, calls });
    }

    content
        .map(ModelStep::FinalAnswer)
        .ok_or_else(|| ModelClientError::InvalidResponse("LLM returned empty response".to_string()))
}

fn parse_tool_call(call: WireToolCall) -> Result<ToolCall, ModelClientError> {
    let arguments = if call.function.arguments.trim().is_empty() {
        Map::new()
    } else {
        serde_json::from_str::<Map<String, Value>>(&call.function.arguments).map_err(|e| {
            ModelClientError::InvalidResponse(format!(
                "arguments for '{}' are not a JSON object: {}",
                call.function.name, e
            ))
        })?
    };

    Ok(if call.id.is_empty() {
        ToolCall::new(call.function.name, arguments)
    } else {
        ToolCall::with_id(call.id, call.function.name, arguments)
    })
}

#[async_trait]
impl ModelClient for OpenRouterClient {
    async fn next_step(
        &self,
        context: &[Message],
        tools: &[ToolSchema],
    ) -> Result<ModelStep, ModelClientError> {
        let request = ChatRequest {
            model: &self.model,
            messages: context.iter().map(to_wire).collect(),
            tools: tools
                .iter()
                .map(|t| WireTool {
                    kind: "function",
                    function: WireFunctionDef {
                        name: &t.name,
                        description: &t.description,
                        parameters: &t.parameters,
                    },
                })
                .collect(),
        };

        tracing::debug!(
            "Requesting next step from {} ({} messages, {} tools)",
            self.model,
            request.messages.len(),
            request.tools.len()
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ModelClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| ModelClientError::InvalidResponse(e.to_string()))?;
        parse_step(body)
    }
}
