//! Interactive REPL for DeepAgent
//!
//! Provides the main user interaction loop.

use std::io::{self, BufRead, Write};

use futures::StreamExt;

use crate::agent::{DeepAgent, StreamEvent};
use crate::cli::commands::{handle_command, CommandResult, Session};
use crate::core::{Config, DeepAgentError, Result};

/// Interactive REPL (Read-Eval-Print Loop)
pub struct Repl {
    session: Session,
}

impl Repl {
    /// Create a REPL with custom configuration
    pub fn with_config(config: Config) -> Result<Self> {
        let agent = DeepAgent::from_config(&config)?;
        Ok(Self {
            session: Session::new(agent, config),
        })
    }

    /// Start on an existing thread
    pub fn with_thread(mut self, thread_id: Option<String>) -> Self {
        self.session.thread_id = thread_id;
        self
    }

    /// Start with streaming on or off
    pub fn with_stream(mut self, stream: bool) -> Self {
        self.session.stream = stream;
        self
    }

    /// Run the REPL
    pub async fn run(&mut self) -> Result<()> {
        self.print_banner();

        let stdin = io::stdin();
        let mut stdout = io::stdout();

        loop {
            print!("You: ");
            stdout.flush()?;

            let mut input = String::new();
            match stdin.lock().read_line(&mut input) {
                Ok(0) => {
                    // EOF (Ctrl+D)
                    println!("\nGoodbye!");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    eprintln!("Error reading input: {}", e);
                    continue;
                }
            }

            let input = input.trim();
            if input.is_empty() {
                continue;
            }

            match handle_command(input, &mut self.session).await {
                Ok(CommandResult::Exit) => {
                    println!("\nGoodbye!");
                    break;
                }
                Ok(CommandResult::Handled(output)) => {
                    println!("{}\n", output);
                }
                Ok(CommandResult::Continue(message)) => {
                    if let Err(e) = self.send(&message).await {
                        eprintln!("\nError: {}\n", e);
                    }
                }
                Err(e) => {
                    eprintln!("Command error: {}\n", e);
                }
            }
        }

        Ok(())
    }

    /// Send a message on the current thread, creating one if needed
    async fn send(&mut self, message: &str) -> Result<()> {
        if self.session.stream {
            return self.send_streaming(message).await;
        }

        let response = self
            .session
            .agent
            .invoke(self.session.thread_id.as_deref(), message)
            .await?;
        self.session.thread_id = Some(response.thread_id);
        println!("\nAssistant:\n{}\n", response.response);
        Ok(())
    }

    async fn send_streaming(&mut self, message: &str) -> Result<()> {
        let mut events = self
            .session
            .agent
            .stream(self.session.thread_id.clone(), message.to_string());

        println!("\nAssistant:");
        while let Some(event) = events.next().await {
            match event {
                StreamEvent::StateUpdate { files, todos, .. } => {
                    if self.session.config.agent.debug {
                        eprintln!("  [state] files: {}, todos: {}", files.len(), todos.len());
                    }
                }
                StreamEvent::Content { content } => println!("{}", content),
                StreamEvent::Complete { thread_id, .. } => {
                    self.session.thread_id = Some(thread_id);
                    println!();
                }
                StreamEvent::Error { error } => return Err(DeepAgentError::Other(error)),
            }
        }
        Ok(())
    }

    /// Print the startup banner
    fn print_banner(&self) {
        let config = &self.session.config;

        println!(
            r#"
╔═══════════════════════════════════════════════╗
║                                               ║
║   DeepAgent                                   ║
║   Plans, files and sub-agents for your tasks  ║
║                                               ║
╚═══════════════════════════════════════════════╝
"#
        );
        println!("Provider:   {}", config.provider);
        println!("Model:      {}", config.model_name());
        if let Some(id) = &self.session.thread_id {
            println!("Thread:     {}", id);
        }
        println!();
        println!("Commands: help, new, thread, files, todos, state, stream, status, tools, exit");
        println!("─────────────────────────────────────────────────");
    }
}
