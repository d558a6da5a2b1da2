//! Prepare subcommand - build the train/eval/unlabeled dataset files

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use nwbib_core::{SharedProgress, fmt_num};

use super::print_summary;
use crate::config::Config;

#[derive(Args, Debug)]
pub struct PrepareArgs {
    /// Shard directory written by `nwbib chunk`
    #[arg(long)]
    pub shards: Option<PathBuf>,

    /// Collect and print corpus statistics
    #[arg(short, long)]
    pub stats: bool,

    /// Also write the full statistics tables as JSON
    #[arg(long)]
    pub stats_json: Option<PathBuf>,

    /// NWBib subject vocabulary (SKOS Turtle) used to filter subjects
    #[arg(long)]
    pub vocabulary: Option<PathBuf>,

    /// Fraction of labeled records held out for evaluation (0-1)
    #[arg(long)]
    pub eval_fraction: Option<f64>,

    /// Take a contiguous evaluation range starting at this index
    #[arg(long)]
    pub eval_start: Option<usize>,

    /// Seed for the random evaluation sample
    #[arg(long, conflicts_with = "eval_start")]
    pub seed: Option<u64>,

    /// Number of parallel workers
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Training TSV output
    #[arg(long)]
    pub train: Option<PathBuf>,

    /// Evaluation TSV output
    #[arg(long)]
    pub eval: Option<PathBuf>,

    /// Unlabeled titles output
    #[arg(long)]
    pub unlabeled: Option<PathBuf>,
}

impl PrepareArgs {
    /// Merge flags over file configuration
    fn into_config(self, config: &Config) -> nwbib_subjects::Config {
        nwbib_subjects::Config {
            shard_dir: self
                .shards
                .unwrap_or_else(|| config.chunk.shard_dir.clone()),
            vocabulary: self
                .vocabulary
                .or_else(|| config.prepare.vocabulary.clone()),
            collect_stats: self.stats,
            stats_json: self.stats_json,
            eval_fraction: self
                .eval_fraction
                .unwrap_or(config.prepare.eval_fraction),
            eval_start: self.eval_start,
            seed: self.seed,
            workers: self.workers.unwrap_or(config.workers.default),
            train_file: self
                .train
                .unwrap_or_else(|| config.prepare.train_file.clone()),
            eval_file: self
                .eval
                .unwrap_or_else(|| config.prepare.eval_file.clone()),
            unlabeled_file: self
                .unlabeled
                .unwrap_or_else(|| config.prepare.unlabeled_file.clone()),
        }
    }
}

pub fn run(args: PrepareArgs, config: &Config, progress: &SharedProgress) -> Result<()> {
    let prepare_config = args.into_config(config);

    log::info!("Preparing NWBib subject dataset");
    log::info!("  Shards: {}", prepare_config.shard_dir.display());
    if let Some(vocab) = &prepare_config.vocabulary {
        log::info!("  Vocabulary: {}", vocab.display());
    }

    let pb = progress.stage_line("prepare");
    let result = nwbib_subjects::run(&prepare_config, &pb);
    pb.finish_and_clear();
    let summary = result?;

    if prepare_config.collect_stats {
        if let Some(stats) = &summary.stats {
            progress.println(stats.format_tables(&summary.scan));
        }
    }

    let mut eval = fmt_num(summary.eval_records);
    if summary.eval_records < summary.eval_requested {
        eval.push_str(&format!(" of {} requested", fmt_num(summary.eval_requested)));
    }
    print_summary(
        "Prepare",
        &[
            (
                "Shards",
                format!(
                    "{}/{} ({} failed)",
                    summary.scan.total_shards - summary.scan.failed_shards,
                    summary.scan.total_shards,
                    summary.scan.failed_shards
                ),
            ),
            ("Records", fmt_num(summary.scan.records)),
            ("Train", fmt_num(summary.train_records)),
            ("Eval", eval),
            ("Unlabeled", fmt_num(summary.unlabeled_records)),
            ("Time", format!("{:.1}s", summary.elapsed.as_secs_f64())),
        ],
    );
    Ok(())
}
