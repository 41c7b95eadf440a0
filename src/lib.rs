//! # Tool Agent
//!
//! A minimal agent that lets a language model call tools in a loop.
//!
//! This library provides:
//! - A [`ToolRegistry`](tools::ToolRegistry) that validates and dispatches named tools
//! - A bounded, persistent [`ConversationStore`](conversation::ConversationStore)
//! - The [`Agent`](agent::Agent) loop driving an injected [`ModelClient`](llm::ModelClient)
//!
//! ## Architecture
//!
//! The agent follows the "tools in a loop" pattern:
//! 1. Receive a user message and append it to the conversation
//! 2. Ask the model client for its next step, given context and tool schemas
//! 3. Execute any requested tool calls in order and feed the results back
//! 4. Repeat until the model answers, or the tool-turn bound is reached
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tool_agent::{agent::{Agent, AgentOptions}, llm::OfflineClient, tools, Config};
//!
//! let config = Config::from_env()?;
//! let registry = tools::default_registry(&config)?;
//! let options = AgentOptions::from_config(&config, &registry);
//! let mut agent = Agent::new(Arc::new(OfflineClient), Arc::new(registry), options);
//! let answer = agent.process("list files in .").await?;
//! ```

pub mod agent;
pub mod cli;
pub mod config;
pub mod conversation;
pub mod llm;
pub mod tools;

pub use config::Config;
