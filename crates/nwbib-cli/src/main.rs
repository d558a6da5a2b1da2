//! nwbib - NWBib subject-classification dataset preparation
//!
//! Splits the lobid.org NWBib JSON-lines export into shards, then builds
//! training, evaluation, and unlabeled files from them.

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod cmd;
mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "nwbib")]
#[command(about = "Prepare NWBib records for subject classification")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Config file path (default: ./nwbib.toml or ~/.config/nwbib/config.toml)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Split a JSON-lines export into fixed-size JSON shards
    Chunk(cmd::chunk::ChunkArgs),
    /// Extract subjects and write train/eval/unlabeled files
    Prepare(cmd::prepare::PrepareArgs),
    /// Show current configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let progress = Arc::new(nwbib_core::ProgressContext::new());

    // TTY: warn unless --debug, progress bars show activity.
    // Non-TTY: info unless --debug.
    let is_tty = progress.is_tty();
    let multi = if is_tty { Some(progress.multi()) } else { None };
    let quiet = is_tty && !cli.debug;
    nwbib_core::init_logging(quiet, cli.debug, multi)?;

    let config = if let Some(path) = cli.config {
        Config::from_file(&path)?
    } else {
        Config::load()?
    };

    match cli.command {
        Command::Chunk(args) => cmd::chunk::run(args, &config, &progress),
        Command::Prepare(args) => cmd::prepare::run(args, &config, &progress),
        Command::Config => {
            let vocabulary = config
                .prepare
                .vocabulary
                .as_ref()
                .map_or_else(|| "not set".to_string(), |p| p.display().to_string());
            cmd::print_summary(
                "Setting",
                &[
                    ("Chunk size", config.chunk.chunk_size.to_string()),
                    ("Shard directory", config.chunk.shard_dir.display().to_string()),
                    ("Eval fraction", config.prepare.eval_fraction.to_string()),
                    ("Vocabulary", vocabulary),
                    ("Train file", config.prepare.train_file.display().to_string()),
                    ("Eval file", config.prepare.eval_file.display().to_string()),
                    (
                        "Unlabeled file",
                        config.prepare.unlabeled_file.display().to_string(),
                    ),
                    ("Workers", config.workers.default.to_string()),
                ],
            );
            Ok(())
        }
    }
}
