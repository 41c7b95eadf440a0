//! Agent module - the orchestration loop.
//!
//! The agent follows a "tools in a loop" pattern:
//! 1. Append the user message to the conversation
//! 2. Ask the model client for its next step, with the bounded context and tool schemas
//! 3. If the model requests tool calls, run them in order and feed the results back
//! 4. Repeat until the model produces a final answer or the tool-turn bound is hit

mod agent_loop;
mod error;
mod prompt;

pub use agent_loop::{Agent, AgentOptions};
pub use error::AgentError;
pub use prompt::build_system_prompt;
