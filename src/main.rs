//! DeepAgent - planning agent with a virtual filesystem and sub-agents
//!
//! Main entry point for the CLI application.

use clap::Parser;
use deepagent::core::config::{ProviderType, StorageBackend};
use deepagent::{Config, DeepAgent, Repl, StreamEvent};
use futures::StreamExt;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// DeepAgent - plans, files and sub-agents for multi-step tasks
#[derive(Parser, Debug)]
#[command(name = "deepagent")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Model provider (ollama, openai, anthropic, mock)
    #[arg(long)]
    provider: Option<ProviderType>,

    /// Model name
    #[arg(long, short = 'm')]
    model: Option<String>,

    /// Thread to continue
    #[arg(long, short = 't')]
    thread: Option<String>,

    /// Single prompt mode (non-interactive)
    #[arg(long, short = 'p')]
    prompt: Option<String>,

    /// Print output as it is produced
    #[arg(long, short = 's')]
    stream: bool,

    /// Checkpoint storage (memory, file)
    #[arg(long)]
    store: Option<StorageBackend>,

    /// Enable debug output
    #[arg(long, short = 'd')]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Build configuration
    let mut config = Config::load();

    // Apply CLI overrides
    if let Some(provider) = args.provider {
        config.provider = provider;
    }

    if let Some(ref model) = args.model {
        config.models.default = model.clone();
    }

    if let Some(store) = args.store {
        config.storage.backend = store;
    }

    if args.debug {
        config.agent.debug = true;
    }

    // Logs go to stderr; RUST_LOG wins over --debug
    let default_filter = if config.agent.debug {
        "deepagent=debug"
    } else {
        "deepagent=info"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    // Single prompt mode
    if let Some(prompt) = args.prompt {
        let agent = DeepAgent::from_config(&config)?;

        if args.stream {
            let mut events = agent.stream(args.thread, prompt);
            while let Some(event) = events.next().await {
                match event {
                    StreamEvent::Content { content } => println!("{}", content),
                    StreamEvent::Complete { thread_id, .. } => {
                        eprintln!("thread: {}", thread_id);
                    }
                    StreamEvent::Error { error } => anyhow::bail!(error),
                    StreamEvent::StateUpdate { .. } => {}
                }
            }
        } else {
            let response = agent.invoke(args.thread.as_deref(), &prompt).await?;
            println!("{}", response.response);
            eprintln!("thread: {}", response.thread_id);
        }
        return Ok(());
    }

    // Interactive REPL mode
    let mut repl = Repl::with_config(config)?
        .with_thread(args.thread)
        .with_stream(args.stream);
    repl.run().await?;

    Ok(())
}
