//! Conversation history: messages, the bounded model context, persistence.
//!
//! The store keeps the full transcript. Only the view handed to the model
//! ([`ConversationStore::get_context`]) is bounded, by a number of user
//! turns. Saving and loading always cover the whole transcript.
//!
//! Persisting while a turn is running is the caller's responsibility; the
//! agent holds the store mutably for the duration of a turn.

use std::borrow::Cow;
use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::tools::{ToolCall, ToolResult};

/// Version tag written into every saved conversation.
pub const FORMAT_VERSION: u32 = 1;

/// Default number of user turns kept in the model context.
pub const DEFAULT_MAX_HISTORY: usize = 20;

#[derive(Debug, Error)]
pub enum ConversationError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed conversation document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported conversation format version {0} (expected {})", FORMAT_VERSION)]
    UnsupportedVersion(u32),

    #[error("Message {index}: {reason}")]
    InvalidPairing { index: usize, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// Message body: plain text, or a JSON value for tool results.
///
/// A JSON string is always stored as text, so the untagged form reads back
/// as the same body it was written from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Content(Body);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
enum Body {
    Text(String),
    Structured(Value),
}

impl Content {
    pub fn text(text: impl Into<String>) -> Self {
        Content(Body::Text(text.into()))
    }

    pub fn structured(value: Value) -> Self {
        match value {
            Value::String(text) => Content::text(text),
            other => Content(Body::Structured(other)),
        }
    }

    /// The JSON body, if this is not plain text.
    pub fn as_structured(&self) -> Option<&Value> {
        match &self.0 {
            Body::Text(_) => None,
            Body::Structured(value) => Some(value),
        }
    }

    /// Text rendering of the content (JSON for structured bodies).
    pub fn as_text(&self) -> Cow<'_, str> {
        match &self.0 {
            Body::Text(text) => Cow::Borrowed(text),
            Body::Structured(value) => Cow::Owned(value.to_string()),
        }
    }
}

impl From<Value> for Content {
    fn from(value: Value) -> Self {
        Content::structured(value)
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Content::text(text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Content,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn new(role: Role, content: Content) -> Self {
        Self {
            role,
            content,
            tool_calls: Vec::new(),
            tool_call_id: None,
            timestamp: Utc::now(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, Content::text(content))
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, Content::text(content))
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, Content::text(content))
    }

    /// Assistant message carrying the tool calls it requested.
    pub fn assistant_tool_calls(content: Option<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            ..Self::new(Role::Assistant, Content::text(content.unwrap_or_default()))
        }
    }

    /// Tool message tagged with the id of the call it answers.
    pub fn tool_result(result: &ToolResult) -> Self {
        let body = serde_json::to_value(result).unwrap_or(Value::Null);
        Self {
            tool_call_id: Some(result.call_id().to_string()),
            ..Self::new(Role::Tool, Content::from(body))
        }
    }

    pub fn text(&self) -> Cow<'_, str> {
        self.content.as_text()
    }
}

#[derive(Serialize)]
struct DocumentRef<'a> {
    version: u32,
    messages: &'a [Message],
}

#[derive(Deserialize)]
struct Document {
    version: u32,
    messages: Vec<Message>,
}

/// Ordered message history with a bounded model view.
#[derive(Debug, Clone)]
pub struct ConversationStore {
    messages: Vec<Message>,
    max_history: usize,
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

impl ConversationStore {
    /// Create an empty store keeping `max_history` user turns in context.
    /// A bound of zero is treated as one.
    pub fn new(max_history: usize) -> Self {
        Self {
            messages: Vec::new(),
            max_history: max_history.max(1),
        }
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// The full, untruncated transcript.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of user turns in the transcript.
    pub fn turn_count(&self) -> usize {
        self.messages.iter().filter(|m| m.role == Role::User).count()
    }

    /// The view sent to the model.
    ///
    /// Keeps the last `max_history` user turns. A turn runs from a user
    /// message to the next one, so tool calls are never separated from
    /// their results. System messages before the cut are always kept.
    pub fn get_context(&self) -> Cow<'_, [Message]> {
        let turn_starts: Vec<usize> = self
            .messages
            .iter()
            .enumerate()
            .filter(|(_, m)| m.role == Role::User)
            .map(|(i, _)| i)
            .collect();

        if turn_starts.len() <= self.max_history {
            return Cow::Borrowed(&self.messages);
        }

        let cut = turn_starts[turn_starts.len() - self.max_history];
        let mut context: Vec<Message> = self.messages[..cut]
            .iter()
            .filter(|m| m.role == Role::System)
            .cloned()
            .collect();
        context.extend_from_slice(&self.messages[cut..]);
        Cow::Owned(context)
    }

    /// Drop every message. Only ever called explicitly.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Render the full transcript as a JSON document.
    pub fn serialize(&self) -> Result<String, ConversationError> {
        let doc = DocumentRef {
            version: FORMAT_VERSION,
            messages: &self.messages,
        };
        Ok(serde_json::to_string_pretty(&doc)?)
    }

    /// Replace the transcript with one parsed from `doc`.
    ///
    /// The document is fully validated first; on error the store is left
    /// untouched.
    pub fn deserialize(&mut self, doc: &str) -> Result<(), ConversationError> {
        let doc: Document = serde_json::from_str(doc)?;
        if doc.version != FORMAT_VERSION {
            return Err(ConversationError::UnsupportedVersion(doc.version));
        }
        validate_pairing(&doc.messages)?;
        self.messages = doc.messages;
        Ok(())
    }

    pub async fn save(&self, path: &Path) -> Result<(), ConversationError> {
        let doc = self.serialize()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, doc).await?;
        tokio::fs::rename(&tmp, path).await?;
        tracing::debug!(
            "Saved {} messages to {}",
            self.messages.len(),
            path.display()
        );
        Ok(())
    }

    pub async fn load(&mut self, path: &Path) -> Result<(), ConversationError> {
        let doc = tokio::fs::read_to_string(path).await?;
        self.deserialize(&doc)?;
        tracing::debug!(
            "Loaded {} messages from {}",
            self.messages.len(),
            path.display()
        );
        Ok(())
    }
}

/// Every tool message must answer a call made by an earlier assistant
/// message, and only tool messages may carry a `tool_call_id`.
fn validate_pairing(messages: &[Message]) -> Result<(), ConversationError> {
    let mut issued: HashSet<&str> = HashSet::new();

    for (index, message) in messages.iter().enumerate() {
        if message.role != Role::Assistant && !message.tool_calls.is_empty() {
            return Err(ConversationError::InvalidPairing {
                index,
                reason: "only assistant messages may carry tool calls".to_string(),
            });
        }
        issued.extend(message.tool_calls.iter().map(|c| c.call_id.as_str()));

        match (message.role, message.tool_call_id.as_deref()) {
            (Role::Tool, Some(id)) if issued.contains(id) => {}
            (Role::Tool, Some(id)) => {
                return Err(ConversationError::InvalidPairing {
                    index,
                    reason: format!("tool result for unknown call '{}'", id),
                })
            }
            (Role::Tool, None) => {
                return Err(ConversationError::InvalidPairing {
                    index,
                    reason: "tool message without tool_call_id".to_string(),
                })
            }
            (_, Some(_)) => {
                return Err(ConversationError::InvalidPairing {
                    index,
                    reason: "tool_call_id on a non-tool message".to_string(),
                })
            }
            (_, None) => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    fn sample() -> ConversationStore {
        let mut store = ConversationStore::new(DEFAULT_MAX_HISTORY);
        store.append(Message::system("You are helpful."));
        store.append(Message::user("list files in ."));
        let first = ToolCall::with_id("call-1", "list", args(json!({"path": "."})));
        let second = ToolCall::with_id("call-2", "read", args(json!({"path": "a.txt"})));
        store.append(Message::assistant_tool_calls(
            Some("Looking".to_string()),
            vec![first, second],
        ));
        store.append(Message::tool_result(&ToolResult::ok(
            "call-1",
            json!("[FILE] a.txt"),
        )));
        store.append(Message::tool_result(&ToolResult::err(
            "call-2",
            "Tool 'read' failed: denied",
        )));
        store.append(Message::assistant("There is one file."));
        store
    }

    fn turn(store: &mut ConversationStore, n: usize) {
        store.append(Message::user(format!("question {}", n)));
        store.append(Message::assistant(format!("answer {}", n)));
    }

    #[test]
    fn serialize_round_trip_is_byte_identical() {
        let store = sample();
        let first = store.serialize().unwrap();

        let mut restored = ConversationStore::default();
        restored.deserialize(&first).unwrap();
        let second = restored.serialize().unwrap();

        assert_eq!(first, second);
        assert_eq!(restored.messages(), store.messages());
    }

    #[test]
    fn float_arguments_round_trip_exactly() {
        let values = [
            1.0715660391465826e-75,
            -1.81996730402717e-179,
            -1.603964615428183e143,
            -9.643915712060552e-234,
            0.1,
            f64::MAX,
            f64::MIN_POSITIVE,
        ];

        let mut store = ConversationStore::default();
        store.append(Message::user("measure"));
        let calls: Vec<ToolCall> = values
            .iter()
            .enumerate()
            .map(|(i, v)| ToolCall::with_id(format!("c{}", i), "measure", args(json!({"v": v}))))
            .collect();
        store.append(Message::assistant_tool_calls(None, calls));
        for (i, v) in values.iter().enumerate() {
            store.append(Message::tool_result(&ToolResult::ok(
                format!("c{}", i),
                json!({"v": v}),
            )));
        }

        let first = store.serialize().unwrap();
        let mut restored = ConversationStore::default();
        restored.deserialize(&first).unwrap();

        assert_eq!(restored.serialize().unwrap(), first);
        assert_eq!(restored.messages(), store.messages());
        for (call, v) in restored.messages()[1].tool_calls.iter().zip(values) {
            assert_eq!(call.arguments["v"].as_f64().unwrap().to_bits(), v.to_bits());
        }
    }

    #[test]
    fn structured_string_content_reads_back_equal() {
        let content = Content::structured(json!("plain"));
        assert_eq!(content, Content::text("plain"));
        assert_eq!(content.as_structured(), None);

        let mut store = ConversationStore::default();
        store.append(Message {
            content,
            ..Message::user("placeholder")
        });
        let mut restored = ConversationStore::default();
        restored.deserialize(&store.serialize().unwrap()).unwrap();
        assert_eq!(restored.messages(), store.messages());
    }

    #[test]
    fn round_trip_preserves_tool_pairing_and_timestamps() {
        let store = sample();
        let mut restored = ConversationStore::default();
        restored.deserialize(&store.serialize().unwrap()).unwrap();

        let assistant = &restored.messages()[2];
        assert_eq!(assistant.tool_calls.len(), 2);
        assert_eq!(assistant.tool_calls[0].arguments["path"], json!("."));
        assert_eq!(restored.messages()[3].tool_call_id.as_deref(), Some("call-1"));
        assert_eq!(restored.messages()[4].tool_call_id.as_deref(), Some("call-2"));
        for (a, b) in restored.messages().iter().zip(store.messages()) {
            assert_eq!(a.timestamp, b.timestamp);
        }
    }

    #[test]
    fn context_is_untruncated_within_bound() {
        let mut store = ConversationStore::new(3);
        turn(&mut store, 1);
        turn(&mut store, 2);
        turn(&mut store, 3);

        assert!(matches!(store.get_context(), Cow::Borrowed(_)));
        assert_eq!(store.get_context().len(), 6);
    }

    #[test]
    fn context_keeps_system_message_when_truncating() {
        for extra in 0..5 {
            let mut store = ConversationStore::new(2);
            store.append(Message::system("rules"));
            for n in 0..(2 + extra) {
                turn(&mut store, n);
            }

            let context = store.get_context();
            assert_eq!(context[0].role, Role::System);
            assert_eq!(context[0].text(), "rules");
            assert_eq!(context.iter().filter(|m| m.role == Role::User).count(), 2);
        }
    }

    #[test]
    fn truncation_keeps_whole_turns_and_full_record() {
        let mut store = sample();
        store.max_history = 1;
        turn(&mut store, 2);

        let context = store.get_context();
        assert_eq!(context.len(), 3);
        assert_eq!(context[1].text(), "question 2");

        // The durable record is untouched.
        assert_eq!(store.len(), 8);

        let mut store = sample();
        store.max_history = 1;
        store.append(Message::user("again"));
        let context = store.get_context();
        assert_eq!(context.len(), 2);
    }

    #[test]
    fn tool_turns_stay_together_after_truncation() {
        let mut store = ConversationStore::new(1);
        turn(&mut store, 0);
        for message in sample().messages().iter().skip(1) {
            store.append(message.clone());
        }

        let context = store.get_context();
        assert_eq!(context[0].role, Role::User);
        assert_eq!(context.len(), 5);
        assert_eq!(context[2].tool_call_id.as_deref(), Some("call-1"));
    }

    #[test]
    fn clear_empties_store() {
        let mut store = sample();
        store.clear();
        assert!(store.is_empty());
        assert!(store.get_context().is_empty());
    }

    #[test]
    fn deserialize_rejects_unknown_version_and_keeps_state() {
        let mut store = sample();
        let err = store
            .deserialize(r#"{"version": 99, "messages": []}"#)
            .unwrap_err();
        assert!(matches!(err, ConversationError::UnsupportedVersion(99)));
        assert_eq!(store.len(), 6);
    }

    #[test]
    fn deserialize_rejects_orphan_tool_result() {
        let doc = json!({
            "version": 1,
            "messages": [{
                "role": "tool",
                "content": {"call_id": "x", "success": true, "result": 1},
                "tool_call_id": "x",
                "timestamp": "2024-01-01T00:00:00Z"
            }]
        });

        let mut store = ConversationStore::default();
        let err = store.deserialize(&doc.to_string()).unwrap_err();
        assert!(matches!(err, ConversationError::InvalidPairing { index: 0, .. }));
    }

    #[test]
    fn tool_result_messages_carry_structured_content() {
        let message = Message::tool_result(&ToolResult::ok("c", json!({"files": 2})));
        assert_eq!(message.role, Role::Tool);
        assert_eq!(
            message.content,
            Content::structured(json!({"call_id": "c", "success": true, "result": {"files": 2}}))
        );
    }

    #[tokio::test]
    async fn clear_then_load_restores_saved_transcript() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("conversation.json");

        let mut store = sample();
        let original = store.messages().to_vec();
        store.save(&path).await.unwrap();

        store.clear();
        store.load(&path).await.unwrap();

        assert_eq!(store.messages(), original.as_slice());
    }

    #[tokio::test]
    async fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ConversationStore::default();
        let err = store.load(&dir.path().join("absent.json")).await.unwrap_err();
        assert!(matches!(err, ConversationError::Io(_)));
    }
}
