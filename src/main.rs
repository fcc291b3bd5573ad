//! # Main Entry Point
//!
//! Runs the dispatch runtime against the console transport:
//! - Domain: Configuration
//! - Infrastructure: Console transport, Logging
//! - Application: Registry, Responder, Bot
//! - Interface: Built-in command handlers

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use courier::application::bot::Bot;
use courier::application::cancellation::CancellationRegistry;
use courier::application::message::MessageBinding;
use courier::application::registry::CommandRegistry;
use courier::application::responder::ChatResponder;
use courier::domain::config::AppConfig;
use courier::infrastructure::console::ConsoleTransport;
use courier::infrastructure::logging;
use courier::interface::commands;

const INBOUND_BUFFER: usize = 64;

#[derive(Debug, Parser)]
#[command(name = "courier", about = "Chat bot command runtime on a local console")]
struct Args {
    /// Path to the YAML configuration file
    #[arg(long, default_value = "data/config.yaml")]
    config: PathBuf,

    /// Override the command prefix
    #[arg(long)]
    prefix: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 1. Load Configuration
    let mut config = AppConfig::load(&args.config)?;
    if let Some(prefix) = args.prefix {
        config.bot.prefix = prefix;
    }

    // 2. Logging Setup
    let _guard = logging::init(&config.logging)?;
    tracing::info!("Starting Courier...");

    // 3. Commands
    let mut registry = CommandRegistry::new();
    commands::register_all(&mut registry).context("Failed to register commands")?;
    tracing::info!("Registered {} commands", registry.len());

    // 4. Transport & Bot
    let transport = Arc::new(ConsoleTransport::new(config.console.clone()));
    let binding = MessageBinding::new(transport.clone(), Arc::new(CancellationRegistry::new()));
    let responder = Arc::new(ChatResponder::new(config.bot.clone()));
    let prefix = config.bot.prefix.clone();
    let bot = Arc::new(Bot::new(config, registry, responder, binding));

    let (tx, rx) = mpsc::channel(INBOUND_BUFFER);
    let dispatcher = tokio::spawn(bot.serve(rx));

    println!("Type `{prefix}help` to list commands. Prefix a line with `^<id>` to reply to message <id>.");

    // 5. Input Loop
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        if line.trim().is_empty() {
            continue;
        }
        let message = transport.inbound(&line).await;
        if tx.send(message).await.is_err() {
            tracing::error!("Dispatcher stopped, exiting input loop");
            break;
        }
    }

    drop(tx);
    if let Err(e) = dispatcher.await {
        tracing::error!("Dispatcher panicked: {}", e);
    }
    Ok(())
}
