//! Parsing of interactive REPL input.
//!
//! Lines starting with `/` are commands; everything else is a chat message.
//! `/<tool> key=value ...` runs a tool directly. A token without `=`
//! continues the previous value, so `/text task=generate content=a blog post`
//! passes `content = "a blog post"`.

use std::future::Future;
use std::io;
use std::path::PathBuf;

use serde_json::{Map, Value};
use tokio::io::{AsyncBufRead, Lines};

use crate::tools::ToolRegistry;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Blank input.
    Empty,
    Quit,
    Help,
    ListTools,
    Clear,
    Save(PathBuf),
    Load(PathBuf),
    /// Direct tool invocation, bypassing the model.
    Tool {
        name: String,
        arguments: Map<String, Value>,
    },
    /// A message for the agent.
    Chat(String),
    /// Malformed command with an explanation.
    Invalid(String),
}

pub fn parse(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }
    if matches!(line.to_lowercase().as_str(), "quit" | "exit") {
        return Command::Quit;
    }

    let Some(rest) = line.strip_prefix('/') else {
        return Command::Chat(line.to_string());
    };

    let mut parts = rest.split_whitespace();
    let Some(name) = parts.next() else {
        return Command::Help;
    };
    let tail: Vec<&str> = parts.collect();

    match name {
        "help" => Command::Help,
        "tools" => Command::ListTools,
        "clear" => Command::Clear,
        "save" | "load" => {
            if tail.is_empty() {
                return Command::Invalid(format!("usage: /{} <path>", name));
            }
            let path = PathBuf::from(tail.join(" "));
            if name == "save" {
                Command::Save(path)
            } else {
                Command::Load(path)
            }
        }
        _ => match parse_arguments(&tail) {
            Ok(arguments) => Command::Tool {
                name: name.to_string(),
                arguments,
            },
            Err(reason) => Command::Invalid(reason),
        },
    }
}

/// Wait for the next input line, or for `interrupt` to fire.
///
/// An interrupt at the prompt or end of input both read as [`Command::Quit`],
/// so the caller's exit path runs either way.
pub async fn read_command<R, F>(lines: &mut Lines<R>, interrupt: F) -> io::Result<Command>
where
    R: AsyncBufRead + Unpin,
    F: Future,
{
    tokio::select! {
        biased;
        _ = interrupt => Ok(Command::Quit),
        line = lines.next_line() => Ok(line?.map_or(Command::Quit, |line| parse(&line))),
    }
}

fn parse_arguments(tokens: &[&str]) -> Result<Map<String, Value>, String> {
    let mut pairs: Vec<(String, String)> = Vec::new();

    for token in tokens {
        match token.split_once('=') {
            Some((key, value)) if !key.is_empty() => {
                pairs.push((key.to_string(), value.to_string()));
            }
            _ => match pairs.last_mut() {
                Some((_, value)) => {
                    value.push(' ');
                    value.push_str(token);
                }
                None => return Err(format!("expected key=value, got '{}'", token)),
            },
        }
    }

    Ok(pairs
        .into_iter()
        .map(|(key, value)| (key, scalar(&value)))
        .collect())
}

/// Booleans and numbers keep their JSON type; anything else is a string.
fn scalar(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ (Value::Bool(_) | Value::Number(_))) => value,
        _ => Value::String(raw.to_string()),
    }
}

pub fn help_text(tools: &ToolRegistry) -> String {
    let mut text = String::from(
        "Commands:\n  /tools                 list available tools\n  /clear                 start a fresh conversation\n  /save <path>           save the conversation\n  /load <path>           load a saved conversation\n  /<tool> key=value ...  run a tool directly\n  quit | exit            leave\n\nTools:",
    );
    for schema in tools.list_schemas() {
        text.push_str(&format!("\n  /{:<10} {}", schema.name, schema.description));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::AsyncBufReadExt;

    #[test]
    fn plain_text_is_chat() {
        assert_eq!(parse("  hello there "), Command::Chat("hello there".to_string()));
        assert_eq!(parse("   "), Command::Empty);
        assert_eq!(parse("EXIT"), Command::Quit);
    }

    #[test]
    fn builtin_commands() {
        assert_eq!(parse("/tools"), Command::ListTools);
        assert_eq!(parse("/clear"), Command::Clear);
        assert_eq!(parse("/"), Command::Help);
        assert_eq!(
            parse("/save out/chat.json"),
            Command::Save(PathBuf::from("out/chat.json"))
        );
        assert!(matches!(parse("/load"), Command::Invalid(_)));
    }

    #[test]
    fn tool_command_collects_arguments() {
        let command = parse("/text task=generate content=blog post about AI count=3 draft=true");

        let Command::Tool { name, arguments } = command else {
            panic!("expected tool command");
        };
        assert_eq!(name, "text");
        assert_eq!(
            Value::Object(arguments),
            json!({
                "task": "generate",
                "content": "blog post about AI",
                "count": 3,
                "draft": true
            })
        );
    }

    #[tokio::test]
    async fn read_command_parses_lines_until_eof() {
        let mut lines = b"hello\n/clear\n".as_slice().lines();

        let first = read_command(&mut lines, std::future::pending::<()>()).await.unwrap();
        assert_eq!(first, Command::Chat("hello".to_string()));
        let second = read_command(&mut lines, std::future::pending::<()>()).await.unwrap();
        assert_eq!(second, Command::Clear);
        let eof = read_command(&mut lines, std::future::pending::<()>()).await.unwrap();
        assert_eq!(eof, Command::Quit);
    }

    #[tokio::test]
    async fn interrupt_at_prompt_quits() {
        let mut lines = b"hello\n".as_slice().lines();

        let command = read_command(&mut lines, std::future::ready(())).await.unwrap();
        assert_eq!(command, Command::Quit);

        // The pending line is still there for the next read.
        let next = read_command(&mut lines, std::future::pending::<()>()).await.unwrap();
        assert_eq!(next, Command::Chat("hello".to_string()));
    }

    #[test]
    fn tool_command_requires_leading_key() {
        assert!(matches!(parse("/list somewhere"), Command::Invalid(_)));
    }
}
