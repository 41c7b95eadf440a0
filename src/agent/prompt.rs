//! System prompt templates for the agent.

use crate::tools::ToolRegistry;

/// Build the system prompt with tool definitions.
pub fn build_system_prompt(agent_name: &str, tools: &ToolRegistry) -> String {
    let tool_descriptions = tools
        .list_schemas()
        .iter()
        .map(|t| format!("- **{}**: {}", t.name, t.description))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are {agent_name}, an assistant with access to tools.

## Available Tools
{tool_descriptions}

## Rules
1. When a request can be fulfilled with a tool, call it instead of describing what you would do.
2. Tools run in the order you request them; later calls may depend on earlier ones.
3. If a tool fails, read the error and either retry with corrected arguments or explain the problem.
4. When you are done, answer in plain text without further tool calls."#,
        agent_name = agent_name,
        tool_descriptions = tool_descriptions
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ListDirectory;

    #[test]
    fn prompt_lists_registered_tools() {
        let mut tools = ToolRegistry::new();
        tools.register(ListDirectory::new(".")).unwrap();

        let prompt = build_system_prompt("Content Agent", &tools);

        assert!(prompt.starts_with("You are Content Agent"));
        assert!(prompt.contains("- **list**: List files"));
    }
}
