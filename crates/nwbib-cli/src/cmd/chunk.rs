//! Chunk subcommand - split the JSON-lines export into shards

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use nwbib_core::{ChunkConfig, SharedProgress, fmt_num};

use super::print_summary;
use crate::config::Config;

#[derive(Args, Debug)]
pub struct ChunkArgs {
    /// JSON-lines export, plain or gzipped ("-" for stdin)
    #[arg(default_value = "nwbib")]
    pub input: PathBuf,

    /// Shard output directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Records per shard
    #[arg(long)]
    pub chunk_size: Option<usize>,
}

pub fn run(args: ChunkArgs, config: &Config, progress: &SharedProgress) -> Result<()> {
    let chunk_config = ChunkConfig {
        input: args.input,
        output_dir: args
            .output
            .unwrap_or_else(|| config.chunk.shard_dir.clone()),
        chunk_size: args.chunk_size.unwrap_or(config.chunk.chunk_size),
    };

    let pb = progress.stage_line("chunk");
    let result = nwbib_core::chunk_file(&chunk_config, &pb);
    pb.finish_and_clear();
    let summary = result
        .with_context(|| format!("Failed to chunk {}", chunk_config.input.display()))?;

    print_summary(
        "Chunk",
        &[
            ("Records", fmt_num(summary.records)),
            ("Shards", fmt_num(summary.shards)),
            ("Blank lines", fmt_num(summary.blank_lines)),
            ("Output", chunk_config.output_dir.display().to_string()),
            ("Time", format!("{:.1}s", summary.elapsed.as_secs_f64())),
        ],
    );
    Ok(())
}
