// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use triad_verify::commands::{check, run};

#[derive(Parser)]
#[command(name = "triad-verify")]
#[command(author, version, about = "Run intents through the triad kernel and verify signed records", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute an intent and emit the signed record envelope
    Run {
        /// Intent text (use --intent-file for binary input)
        intent: Option<String>,

        /// Read the intent bytes from a file instead
        #[arg(long)]
        intent_file: Option<PathBuf>,

        /// 32-byte hex seed (defaults to the built-in deterministic seed)
        #[arg(long)]
        seed: Option<String>,

        /// Lane timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Write the envelope here instead of stdout
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
    /// Re-verify a record envelope offline
    Check {
        record: PathBuf,

        /// Trusted public key (hex). Without it the embedded key is used.
        #[arg(long)]
        public_key: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "triad_kernel=info,triad_verify=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            intent,
            intent_file,
            seed,
            timeout_ms,
            out,
        } => {
            let intent = match (intent, intent_file) {
                (_, Some(path)) => fs::read(&path)
                    .with_context(|| format!("Failed to read intent file {}", path.display()))?,
                (Some(text), None) => text.into_bytes(),
                (None, None) => anyhow::bail!("Provide an intent or --intent-file"),
            };
            run::run(&intent, seed.as_deref(), timeout_ms, out.as_deref())?;
        }
        Commands::Check { record, public_key } => {
            check::run(&record, public_key.as_deref())?;
        }
    }

    Ok(())
}
