//! Content-creation helpers (text, image, video, audio, workflow, SEO, social).
//!
//! These are placeholders for real generation backends: each one validates
//! its action and renders a short description of what would be produced.
//! All seven share one implementation driven by a [`ContentToolSpec`].

use async_trait::async_trait;
use serde_json::{json, Value};

use super::Tool;

/// Static description of one content tool.
#[derive(Debug)]
pub struct ContentToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    /// Argument selecting the operation ("action" or "task").
    pub action_key: &'static str,
    /// Argument holding the main text the action works on.
    pub payload_key: &'static str,
    /// Secondary argument (style, voice, platform...) and its default.
    pub option_key: &'static str,
    pub option_default: &'static str,
    /// Supported actions and their output templates. `{payload}` and
    /// `{option}` are substituted.
    pub actions: &'static [(&'static str, &'static str)],
}

pub static CONTENT_TOOLS: &[ContentToolSpec] = &[
    ContentToolSpec {
        name: "text",
        description: "Generate, rewrite, and brainstorm text content",
        action_key: "task",
        payload_key: "content",
        option_key: "style",
        option_default: "professional",
        actions: &[
            ("generate", "Generated {option} content: {payload}"),
            ("rewrite", "Rewritten in {option} style: {payload}"),
            ("brainstorm", "Brainstorming ideas for: {payload}"),
            ("research", "Research summary for: {payload}"),
        ],
    },
    ContentToolSpec {
        name: "image",
        description: "Generate and edit images using AI",
        action_key: "action",
        payload_key: "prompt",
        option_key: "style",
        option_default: "realistic",
        actions: &[
            ("generate", "Generated {option} image: '{payload}'"),
            ("edit", "Edited image with prompt: '{payload}'"),
            ("thumbnail", "Created thumbnail for: '{payload}'"),
        ],
    },
    ContentToolSpec {
        name: "video",
        description: "Generate videos from text and images",
        action_key: "action",
        payload_key: "content",
        option_key: "duration",
        option_default: "30s",
        actions: &[
            ("text_to_video", "Generated {option} video from text: '{payload}'"),
            ("animate", "Animated image/avatar: '{payload}'"),
            ("edit", "Edited video: '{payload}'"),
        ],
    },
    ContentToolSpec {
        name: "audio",
        description: "Generate speech and audio content",
        action_key: "action",
        payload_key: "text",
        option_key: "voice",
        option_default: "default",
        actions: &[
            ("tts", "Generated {option} voice audio: '{payload}'"),
            ("podcast", "Created podcast segment: '{payload}'"),
            ("audiobook", "Generated audiobook narration: '{payload}'"),
        ],
    },
    ContentToolSpec {
        name: "workflow",
        description: "Manage content calendar and project workflows",
        action_key: "action",
        payload_key: "content",
        option_key: "date",
        option_default: "",
        actions: &[
            ("plan", "Created content plan: '{payload}'"),
            ("schedule", "Scheduled content for {option}: '{payload}'"),
            ("collaborate", "Set up collaboration for: '{payload}'"),
            ("review", "Content review cycle started for: '{payload}'"),
        ],
    },
    ContentToolSpec {
        name: "seo",
        description: "Optimize content for search engines",
        action_key: "action",
        payload_key: "content",
        option_key: "keywords",
        option_default: "",
        actions: &[
            ("optimize", "SEO optimized content for keywords '{option}': {payload}"),
            ("analyze", "SEO analysis for: '{payload}'"),
            ("keywords", "Keyword research for: '{payload}'"),
            ("meta", "Generated meta description for: '{payload}'"),
        ],
    },
    ContentToolSpec {
        name: "social",
        description: "Manage social media posting and analytics",
        action_key: "action",
        payload_key: "content",
        option_key: "platform",
        option_default: "all",
        actions: &[
            ("post", "Posted to {option}: '{payload}'"),
            ("schedule", "Scheduled post for {option}: '{payload}'"),
            ("analytics", "Analytics report for {option}: '{payload}'"),
            ("hashtags", "Generated hashtags for: '{payload}'"),
        ],
    },
];

/// A content tool built from a static spec.
pub struct ContentTool {
    spec: &'static ContentToolSpec,
}

impl ContentTool {
    pub fn new(spec: &'static ContentToolSpec) -> Self {
        Self { spec }
    }
}

#[async_trait]
impl Tool for ContentTool {
    fn name(&self) -> &str {
        self.spec.name
    }

    fn description(&self) -> &str {
        self.spec.description
    }

    fn parameters_schema(&self) -> Value {
        let spec = self.spec;
        let actions: Vec<&str> = spec.actions.iter().map(|(action, _)| *action).collect();
        json!({
            "type": "object",
            "properties": {
                spec.action_key: {
                    "type": "string",
                    "enum": actions,
                    "description": "Operation to perform"
                },
                spec.payload_key: {
                    "type": "string",
                    "description": "Content the operation works on"
                },
                spec.option_key: {
                    "type": "string",
                    "description": format!("Optional {} (default: '{}')", spec.option_key, spec.option_default)
                }
            },
            "required": [spec.action_key]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<Value> {
        let spec = self.spec;
        let action = args[spec.action_key]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing '{}' argument", spec.action_key))?;
        let payload = args[spec.payload_key].as_str().unwrap_or("");
        let option = args[spec.option_key]
            .as_str()
            .unwrap_or(spec.option_default);

        let template = spec
            .actions
            .iter()
            .find(|(name, _)| *name == action)
            .map(|(_, template)| *template)
            .ok_or_else(|| anyhow::anyhow!("Unknown {} {}: {}", spec.name, spec.action_key, action))?;

        Ok(json!(template
            .replace("{option}", option)
            .replace("{payload}", payload)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool(name: &str) -> ContentTool {
        let spec = CONTENT_TOOLS
            .iter()
            .find(|spec| spec.name == name)
            .expect("known content tool");
        ContentTool::new(spec)
    }

    #[tokio::test]
    async fn renders_action_with_defaults() {
        let out = tool("text")
            .execute(json!({"task": "generate", "content": "blog post about AI"}))
            .await
            .unwrap();
        assert_eq!(out, json!("Generated professional content: blog post about AI"));
    }

    #[tokio::test]
    async fn option_overrides_default() {
        let out = tool("social")
            .execute(json!({"action": "post", "content": "launch", "platform": "mastodon"}))
            .await
            .unwrap();
        assert_eq!(out, json!("Posted to mastodon: 'launch'"));
    }

    #[tokio::test]
    async fn unknown_action_is_an_error() {
        let err = tool("image")
            .execute(json!({"action": "paint"}))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Unknown image action: paint");
    }

    #[test]
    fn schema_lists_supported_actions() {
        let schema = tool("audio").parameters_schema();
        assert_eq!(
            schema["properties"]["action"]["enum"],
            json!(["tts", "podcast", "audiobook"])
        );
        assert_eq!(schema["required"], json!(["action"]));
    }
}
