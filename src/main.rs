//! docshelf - Versioned document store plugin for a chat-bot message bus
//!
//! Main entry point for the docshelf CLI.

use anyhow::Context;
use clap::{Parser, Subcommand};
use docshelf::agent::Agent;
use docshelf::bus::InboundMessage;
use docshelf::config::Settings;
use docshelf::ingest;
use std::io::BufRead;
use std::path::PathBuf;
use std::process;

/// docshelf - versioned document store driven by bus commands
#[derive(Parser, Debug)]
#[command(name = "docshelf")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: ~/.config/docshelf/config.yaml)
    #[arg(short, long, env = "DOCSHELF_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Process one inbound bus message and print the outbound messages
    Handle {
        /// Wire message, e.g. "dst=docshelf&tag=docs&sender=alice"
        message: String,
    },

    /// Read wire messages from stdin until EOF
    Serve,

    /// Ingest one email file and print the resulting store command
    Ingest {
        /// Path to the locally-stored email
        mail_file: PathBuf,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    docshelf::logging::init()?;

    let cli = Cli::parse();
    let settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::load_default()?,
    };

    match cli.command {
        Commands::Handle { message } => {
            let mut agent = Agent::new(settings)?;
            let inbound = InboundMessage::parse(&message)?;
            for outbound in agent.dispatch(&inbound)? {
                println!("{}", outbound.to_wire());
            }
        }
        Commands::Serve => {
            let mut agent = Agent::new(settings)?;
            serve(&mut agent)?;
        }
        Commands::Ingest { mail_file } => {
            if let Some(line) = ingest::ingest_file(&mail_file, &settings)? {
                println!("{line}");
            }
        }
    }

    Ok(())
}

/// Handle wire messages from stdin, one per line
///
/// A failed command terminates that command only, not the loop.
fn serve(agent: &mut Agent) -> anyhow::Result<()> {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("reading stdin")?;
        if line.trim().is_empty() {
            continue;
        }

        let inbound = match InboundMessage::parse(&line) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed message");
                continue;
            }
        };

        match agent.dispatch(&inbound) {
            Ok(outbound) => {
                for message in outbound {
                    println!("{}", message.to_wire());
                }
            }
            Err(e) => tracing::error!(tag = %inbound.tag, error = %e, "command failed"),
        }
    }
    Ok(())
}
