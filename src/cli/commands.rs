//! CLI commands
//!
//! Special commands that can be executed in the REPL.

use crate::agent::DeepAgent;
use crate::core::{Config, DeepAgentError, Result, ToolCategory};
use crate::tools::ToolRegistry;

/// What the REPL is currently talking to
pub struct Session {
    pub agent: DeepAgent,
    pub config: Config,
    /// Current thread; `None` until the first message creates one
    pub thread_id: Option<String>,
    /// Print answers as they are produced
    pub stream: bool,
}

impl Session {
    pub fn new(agent: DeepAgent, config: Config) -> Self {
        Self {
            agent,
            config,
            thread_id: None,
            stream: false,
        }
    }
}

/// Result of parsing a command
#[derive(Debug, PartialEq)]
pub enum CommandResult {
    /// Continue processing as normal input
    Continue(String),
    /// Command was handled, show output
    Handled(String),
    /// Exit the REPL
    Exit,
}

/// Parse and handle special commands
pub async fn handle_command(input: &str, session: &mut Session) -> Result<CommandResult> {
    let input = input.trim();
    let line = input.strip_prefix('/').unwrap_or(input);
    let mut parts = line.split_whitespace();
    let cmd = parts.next().unwrap_or("").to_lowercase();
    let arg = parts.next();
    let extra = parts.next().is_some();

    // Anything that doesn't look exactly like a command is a message
    let takes_arg = matches!(cmd.as_str(), "thread" | "stream");
    if extra || (arg.is_some() && !takes_arg) {
        return Ok(CommandResult::Continue(input.to_string()));
    }

    match cmd.as_str() {
        "exit" | "quit" | "q" => Ok(CommandResult::Exit),

        "help" | "?" => Ok(CommandResult::Handled(help_text())),

        "new" => {
            session.thread_id = None;
            Ok(CommandResult::Handled(
                "Started a new conversation. The next message creates a thread.".to_string(),
            ))
        }

        "thread" => match arg {
            Some(id) => {
                session.agent.get_state(id).await.map_err(not_found_hint)?;
                session.thread_id = Some(id.to_string());
                Ok(CommandResult::Handled(format!("Switched to thread {}", id)))
            }
            None => Ok(CommandResult::Handled(match &session.thread_id {
                Some(id) => format!("Current thread: {}", id),
                None => "No thread yet. Send a message to start one.".to_string(),
            })),
        },

        "files" => {
            let Some(id) = session.thread_id.clone() else {
                return Ok(CommandResult::Handled("No files.".to_string()));
            };
            let snapshot = session.agent.get_state(&id).await?;
            if snapshot.files.is_empty() {
                return Ok(CommandResult::Handled("No files.".to_string()));
            }
            let output = snapshot
                .files
                .iter()
                .map(|(path, content)| format!("── {} ──\n{}", path, content))
                .collect::<Vec<_>>()
                .join("\n\n");
            Ok(CommandResult::Handled(output))
        }

        "todos" => {
            let Some(id) = session.thread_id.clone() else {
                return Ok(CommandResult::Handled("No TODOs.".to_string()));
            };
            let snapshot = session.agent.get_state(&id).await?;
            Ok(CommandResult::Handled(
                snapshot
                    .todos
                    .render()
                    .unwrap_or_else(|| "No TODOs.".to_string()),
            ))
        }

        "state" => {
            let Some(id) = session.thread_id.clone() else {
                return Ok(CommandResult::Handled(
                    "No thread yet. Send a message to start one.".to_string(),
                ));
            };
            let snapshot = session.agent.get_state(&id).await?;
            Ok(CommandResult::Handled(serde_json::to_string_pretty(
                &snapshot,
            )?))
        }

        "stream" => {
            let enabled = match arg.map(str::to_lowercase).as_deref() {
                None => !session.stream,
                Some("on" | "true" | "1" | "yes") => true,
                Some("off" | "false" | "0" | "no") => false,
                Some(other) => {
                    return Ok(CommandResult::Handled(format!(
                        "Unknown value '{}'. Usage: stream [on|off]",
                        other
                    )))
                }
            };
            session.stream = enabled;
            Ok(CommandResult::Handled(format!(
                "Streaming: {}",
                if enabled { "ON" } else { "OFF" }
            )))
        }

        "status" => Ok(CommandResult::Handled(status_text(session))),

        "tools" => Ok(CommandResult::Handled(tools_text(&ToolRegistry::new()))),

        "config" => Ok(CommandResult::Handled(config_text(&session.config))),

        _ => Ok(CommandResult::Continue(input.to_string())),
    }
}

fn not_found_hint(e: DeepAgentError) -> DeepAgentError {
    if e.is_not_found() {
        DeepAgentError::with_context("Cannot switch thread", e)
    } else {
        e
    }
}

fn status_text(session: &Session) -> String {
    let config = &session.config;
    format!(
        "DeepAgent Status:\n\
         ─────────────────────────────\n\
         Provider:   {}\n\
         Model:      {}\n\
         Storage:    {}\n\
         Max steps:  {}\n\
         Sub-agents: {}\n\
         Thread:     {}\n\
         Streaming:  {}",
        config.provider,
        config.model_name(),
        if session.agent.is_persistent() {
            format!("file ({})", config.checkpoint_dir().display())
        } else {
            "memory".to_string()
        },
        config
            .max_steps()
            .map_or_else(|| "unlimited".to_string(), |n| n.to_string()),
        session.agent.sub_agents().names().join(", "),
        session.thread_id.as_deref().unwrap_or("(none)"),
        if session.stream { "on" } else { "off" }
    )
}

fn tools_text(registry: &ToolRegistry) -> String {
    let mut output = String::from("Available Tools:");
    for category in [
        ToolCategory::FileSystem,
        ToolCategory::Planning,
        ToolCategory::Delegation,
    ] {
        output.push_str(&format!("\n\n[{}]", category));
        for tool in registry.definitions_by_category(category) {
            let summary = tool
                .function
                .description
                .lines()
                .next()
                .unwrap_or_default();
            output.push_str(&format!("\n  {:<22} {}", tool.name(), summary));
        }
    }
    output
}

fn config_text(config: &Config) -> String {
    let mut shown = config.clone();
    if shown.openai.api_key.is_some() {
        shown.openai.api_key = Some("***".to_string());
    }
    if shown.anthropic.api_key.is_some() {
        shown.anthropic.api_key = Some("***".to_string());
    }
    let body = toml::to_string_pretty(&shown)
        .unwrap_or_else(|e| format!("# Failed to render config: {}", e));
    format!("# {}\n{}", Config::config_file().display(), body)
}

/// Generate help text
fn help_text() -> String {
    r#"DeepAgent Commands:
─────────────────────────────────────────────
  help, ?          Show this help message
  exit, quit, q    Exit DeepAgent
  new              Start a new conversation thread
  thread [id]      Show the current thread or switch to another
  files            Show the thread's virtual files
  todos            Show the thread's TODO list
  state            Dump the thread's full state as JSON
  stream [on|off]  Toggle streaming output
  status           Show current configuration summary
  tools            List the tools the agent can call
  config           Show the effective configuration file

Anything else is sent to the agent.

Keyboard Shortcuts:
  Ctrl+D           Exit DeepAgent
─────────────────────────────────────────────"#
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::llm::{ChatModel, MockProvider};

    fn session() -> Session {
        let model = ChatModel::new(Arc::new(MockProvider::new()), "mock");
        let agent = DeepAgent::builder(Arc::new(model)).build();
        Session::new(agent, Config::default())
    }

    #[tokio::test]
    async fn test_plain_input_is_a_message() {
        let mut session = session();
        assert_eq!(
            handle_command("new plan for the week", &mut session)
                .await
                .unwrap(),
            CommandResult::Continue("new plan for the week".to_string())
        );
        assert_eq!(
            handle_command("write a poem", &mut session).await.unwrap(),
            CommandResult::Continue("write a poem".to_string())
        );
    }

    #[tokio::test]
    async fn test_stream_toggle() {
        let mut session = session();
        handle_command("stream on", &mut session).await.unwrap();
        assert!(session.stream);
        handle_command("/stream", &mut session).await.unwrap();
        assert!(!session.stream);
    }

    #[tokio::test]
    async fn test_thread_commands() {
        let mut session = session();
        let response = session.agent.invoke(None, "hi").await.unwrap();

        assert!(handle_command("thread missing", &mut session).await.is_err());

        let out = handle_command(&format!("thread {}", response.thread_id), &mut session)
            .await
            .unwrap();
        assert!(matches!(out, CommandResult::Handled(_)));
        assert_eq!(session.thread_id.as_deref(), Some(response.thread_id.as_str()));

        handle_command("new", &mut session).await.unwrap();
        assert!(session.thread_id.is_none());
        assert_eq!(
            handle_command("todos", &mut session).await.unwrap(),
            CommandResult::Handled("No TODOs.".to_string())
        );
    }

    #[tokio::test]
    async fn test_tools_listing() {
        let mut session = session();
        let CommandResult::Handled(text) = handle_command("tools", &mut session).await.unwrap()
        else {
            panic!("tools should be handled");
        };
        assert!(text.contains("[filesystem]"));
        assert!(text.contains("[delegation]"));
        let planning = text.find("[planning]").unwrap();
        let add_todo = text.find("plan_add_todo").unwrap();
        assert!(add_todo > planning);
        assert!(text.find("fs_edit_file").unwrap() < planning);
    }

    #[test]
    fn test_config_text_masks_key() {
        let mut config = Config::default();
        config.openai.api_key = Some("sk-secret".to_string());
        config.anthropic.api_key = Some("sk-ant-secret".to_string());
        let text = config_text(&config);
        assert!(!text.contains("sk-secret"));
        assert!(!text.contains("sk-ant-secret"));
        assert!(text.contains("***"));
    }
}
