use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod config;
mod replay;
mod tracker;

use config::Config;

#[derive(Parser)]
#[command(name = "strabo", version, about = "Iris metrics and ocular deviation tracking")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay recorded landmark frames (JSON Lines) through the pipeline
    Replay {
        /// Input file, or `-` for stdin
        #[arg(long, short, default_value = "-")]
        input: String,
        /// Output file, or `-` for stdout
        #[arg(long, short, default_value = "-")]
        output: String,
        /// TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Camera focal length in pixels (overrides config)
        #[arg(long)]
        focal_length_px: Option<f32>,
        /// Print per-track counters to stderr when done
        #[arg(long)]
        summary: bool,
    },
    /// Print the effective configuration as TOML
    Config {
        /// TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

/// Effective config for a replay: file and env layers, then CLI flags.
fn replay_config(path: Option<&Path>, focal_length_px: Option<f32>) -> Result<Config> {
    let mut cfg = Config::load(path)?;
    if focal_length_px.is_some() {
        cfg.focal_length_px = focal_length_px;
        cfg.validate()?;
    }
    Ok(cfg)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Replay {
            input,
            output,
            config,
            focal_length_px,
            summary,
        } => {
            let cfg = replay_config(config.as_deref(), focal_length_px)?;
            tracing::info!(
                input = %input,
                output = %output,
                focal_length_px = ?cfg.focal_length_px,
                "replay starting"
            );

            let reader: Box<dyn io::BufRead> = if input == "-" {
                Box::new(io::stdin().lock())
            } else {
                let file = File::open(&input).with_context(|| format!("failed to open {input}"))?;
                Box::new(BufReader::new(file))
            };
            let writer: Box<dyn io::Write> = if output == "-" {
                Box::new(io::stdout().lock())
            } else {
                let file =
                    File::create(&output).with_context(|| format!("failed to create {output}"))?;
                Box::new(BufWriter::new(file))
            };

            let stats = replay::run(reader, writer, &cfg.pipeline_config()).await?;

            if summary {
                eprintln!("{}", serde_json::to_string_pretty(&stats)?);
            }
        }
        Command::Config { config } => {
            let cfg = Config::load(config.as_deref())?;
            print!(
                "{}",
                toml::to_string_pretty(&cfg).context("failed to render config")?
            );
        }
    }

    Ok(())
}
