//! Tool Agent - interactive entry point.
//!
//! Reads lines from stdin, routes `/` commands locally and sends everything
//! else through the agent loop.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;
use tool_agent::agent::{Agent, AgentOptions};
use tool_agent::cli::{self, Command};
use tool_agent::llm::{ModelClient, OfflineClient, OpenRouterClient};
use tool_agent::tools::{self, ToolCall};
use tool_agent::Config;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tool_agent=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Loaded configuration: model={}, workspace={}",
        config.default_model,
        config.workspace_path.display()
    );

    let registry = Arc::new(tools::default_registry(&config)?);
    let client: Arc<dyn ModelClient> = match &config.api_key {
        Some(key) => Arc::new(OpenRouterClient::with_base_url(
            key.clone(),
            config.default_model.clone(),
            config.base_url.clone(),
        )),
        None => {
            warn!("OPENROUTER_API_KEY not set, running with the offline client");
            Arc::new(OfflineClient)
        }
    };

    let options = AgentOptions::from_config(&config, &registry);
    let mut agent = Agent::new(client, Arc::clone(&registry), options);

    if let Some(path) = config.conversation_path.as_deref().filter(|p| p.exists()) {
        agent.load(path).await?;
        info!("Restored conversation from {}", path.display());
    }

    println!(
        "{} started with {} tools. Type 'quit' to exit, '/help' for commands.",
        config.agent_name,
        registry.len()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"\nYou: ").await?;
        stdout.flush().await?;

        let command = cli::read_command(&mut lines, tokio::signal::ctrl_c()).await?;

        match command {
            Command::Empty => continue,
            Command::Quit => {
                println!();
                break;
            }
            Command::Help | Command::ListTools => println!("{}", cli::help_text(&registry)),
            Command::Clear => {
                agent.clear();
                println!("Conversation cleared.");
            }
            Command::Save(path) => match agent.save(&path).await {
                Ok(()) => println!("Saved to {}", path.display()),
                Err(e) => println!("Save failed: {}", e),
            },
            Command::Load(path) => match agent.load(&path).await {
                Ok(()) => println!(
                    "Loaded {} messages from {}",
                    agent.conversation().len(),
                    path.display()
                ),
                Err(e) => println!("Load failed: {}", e),
            },
            Command::Tool { name, arguments } => {
                let result = registry.dispatch(&ToolCall::new(name, arguments)).await;
                match result.result() {
                    Some(value) => println!("Tool result: {}", render(value)),
                    None => println!("Tool error: {}", result.error().unwrap_or_default()),
                }
            }
            Command::Invalid(reason) => println!("{}", reason),
            Command::Chat(text) => {
                // Ctrl-C stops the turn at the next model call or tool dispatch.
                let cancel = CancellationToken::new();
                let watcher = {
                    let cancel = cancel.clone();
                    tokio::spawn(async move {
                        if tokio::signal::ctrl_c().await.is_ok() {
                            cancel.cancel();
                        }
                    })
                };
                let outcome = agent.process_with_cancel(&text, &cancel).await;
                watcher.abort();

                match outcome {
                    Ok(answer) => println!("Agent: {}", answer),
                    Err(e) => println!("Agent error: {}", e),
                }
            }
        }
    }

    if let Some(path) = &config.conversation_path {
        agent.save(path).await?;
        info!("Saved conversation to {}", path.display());
    }
    println!("Goodbye!");

    Ok(())
}

fn render(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}
