use anyhow::Context;
use clap::{Parser, Subcommand};
use fleetnorm::commands::{read_labels, render, AggregateRequest, Engine};
use fleetnorm_core::{Config, MessageKind};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fleetnorm", about = "fleetnorm — canonical device records from agent payloads")]
struct Cli {
    /// Write debug logs to /tmp/fleetnorm-debug.log (tail -f to inspect).
    #[arg(long, global = true)]
    debug: bool,

    /// Print single-line JSON.
    #[arg(long, global = true)]
    compact: bool,

    /// Config file to use instead of ~/.config/fleetnorm/config.toml.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the normalized payload.
    Normalize { file: PathBuf },
    /// Print the per-module device summary.
    Summarize { file: PathBuf },
    /// Group errors or warnings across many device payloads.
    Aggregate {
        /// `errors` or `warnings`.
        #[arg(long, default_value = "errors")]
        kind: MessageKind,
        /// Restrict to one managed install item.
        #[arg(long)]
        item: Option<String>,
        /// JSON object mapping device id to display label.
        #[arg(long, value_name = "FILE")]
        labels: Option<PathBuf>,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.debug {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open("/tmp/fleetnorm-debug.log")?;
        tracing_subscriber::fmt()
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
            )
            .init();
        tracing::info!("fleetnorm debug log started — tail -f /tmp/fleetnorm-debug.log");
    }

    let config = match &cli.config {
        Some(path) => Config::load_from(path).with_context(|| format!("loading config {}", path.display()))?,
        None => Config::load().unwrap_or_else(|err| {
            tracing::warn!("falling back to default config: {err:#}");
            Config::defaults()
        }),
    };
    let engine = Engine::new(&config);

    let output = match cli.command {
        Command::Normalize { file } => render(&engine.normalize_file(&file)?, cli.compact)?,
        Command::Summarize { file } => render(&engine.summarize_file(&file)?, cli.compact)?,
        Command::Aggregate {
            kind,
            item,
            labels,
            files,
        } => {
            let labels = labels.as_deref().map(read_labels).transpose()?;
            let request = AggregateRequest {
                files,
                kind,
                item,
                labels,
            };
            render(&engine.aggregate_files(&request)?, cli.compact)?
        }
    };
    println!("{output}");
    Ok(())
}
