//! Main runner: vocabulary → scan → split → write

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use indicatif::ProgressBar;
use nwbib_core::fmt_num;

use crate::config::Config;
use crate::output::{write_labeled, write_unlabeled};
use crate::scanner::{ScanOptions, ScanSummary, scan_corpus};
use crate::split::{partition, select_eval_indices};
use crate::stats::Statistics;
use crate::vocab::load_vocabulary;

/// Preparation run summary
#[derive(Debug)]
pub struct RunSummary {
    pub scan: ScanSummary,
    pub stats: Option<Statistics>,
    pub train_records: usize,
    pub eval_records: usize,
    /// Evaluation records asked for; above `eval_records` when truncated
    pub eval_requested: usize,
    pub unlabeled_records: usize,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn log(&self) {
        log::info!(
            "Dataset ready: {} train, {} eval, {} unlabeled [{:.1}s]",
            fmt_num(self.train_records),
            fmt_num(self.eval_records),
            fmt_num(self.unlabeled_records),
            self.elapsed.as_secs_f64()
        );
    }
}

/// Prepare the train/eval/unlabeled files from a shard directory.
///
/// Configuration errors (fraction, start index) abort before any output
/// file is created.
pub fn run(config: &Config, pb: &ProgressBar) -> Result<RunSummary> {
    let start = Instant::now();
    config.validate()?;

    let vocabulary = config
        .vocabulary
        .as_deref()
        .map(|path| {
            load_vocabulary(path)
                .with_context(|| format!("Failed to load vocabulary {}", path.display()))
        })
        .transpose()?;

    let opts = ScanOptions {
        vocabulary: vocabulary.as_ref(),
        collect_stats: config.wants_stats(),
        workers: config.workers,
    };
    let corpus = scan_corpus(&config.shard_dir, &opts, pb)?;

    let selection = select_eval_indices(
        corpus.valid_records.len(),
        config.eval_fraction,
        config.strategy(),
    )?;
    let (train, eval) = partition(&corpus.valid_records, &selection.indices);

    pb.set_message("writing");
    write_labeled(&config.train_file, &train)
        .with_context(|| format!("Failed to write {}", config.train_file.display()))?;
    write_labeled(&config.eval_file, &eval)
        .with_context(|| format!("Failed to write {}", config.eval_file.display()))?;
    write_unlabeled(&config.unlabeled_file, &corpus.records_without_subjects)
        .with_context(|| format!("Failed to write {}", config.unlabeled_file.display()))?;

    if let (Some(path), Some(stats)) = (&config.stats_json, &corpus.stats) {
        let json = stats.to_json_pretty().context("Failed to serialize statistics")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        log::info!("Statistics written to {}", path.display());
    }

    let summary = RunSummary {
        train_records: train.len(),
        eval_records: eval.len(),
        eval_requested: selection.requested,
        unlabeled_records: corpus.records_without_subjects.len(),
        scan: corpus.summary,
        stats: corpus.stats,
        elapsed: start.elapsed(),
    };
    summary.log();
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_shard(dir: &Path, offset: usize, records: &[String]) {
        std::fs::create_dir_all(dir).unwrap();
        let content = format!("[{}]", records.join(","));
        std::fs::write(dir.join(nwbib_core::shard_file_name(offset)), content).unwrap();
    }

    fn labeled(i: usize) -> String {
        format!(
            r#"{{"title": "T{i}", "subject": [{{"id": "https://nwbib.de/subjects#N{i}", "label": "L{i}"}}]}}"#
        )
    }

    fn config_in(dir: &Path) -> Config {
        Config {
            shard_dir: dir.join("chunks"),
            train_file: dir.join("train.tsv"),
            eval_file: dir.join("test.tsv"),
            unlabeled_file: dir.join("unlabeled.txt"),
            ..Default::default()
        }
    }

    fn line_count(path: &Path) -> usize {
        std::fs::read_to_string(path).unwrap().lines().count()
    }

    #[test]
    fn writes_all_outputs() {
        let dir = TempDir::new().unwrap();
        let mut records: Vec<String> = (0..10).map(labeled).collect();
        records.push(r#"{"title": "no subjects"}"#.to_string());
        write_shard(&dir.path().join("chunks"), 0, &records);

        let config = Config {
            eval_fraction: 0.2,
            seed: Some(3),
            ..config_in(dir.path())
        };
        let summary = run(&config, &ProgressBar::hidden()).unwrap();
        assert_eq!(summary.train_records, 8);
        assert_eq!(summary.eval_records, 2);
        assert_eq!(summary.unlabeled_records, 1);
        assert!(summary.stats.is_none());

        assert_eq!(line_count(&config.train_file), 8);
        assert_eq!(line_count(&config.eval_file), 2);
        assert_eq!(
            std::fs::read_to_string(&config.unlabeled_file).unwrap(),
            "no subjects\n"
        );
    }

    #[test]
    fn start_out_of_bounds_writes_nothing() {
        let dir = TempDir::new().unwrap();
        write_shard(&dir.path().join("chunks"), 0, &[labeled(1), labeled(2)]);

        let config = Config {
            eval_start: Some(2),
            ..config_in(dir.path())
        };
        assert!(run(&config, &ProgressBar::hidden()).is_err());
        assert!(!config.train_file.exists());
        assert!(!config.eval_file.exists());
        assert!(!config.unlabeled_file.exists());
    }

    #[test]
    fn invalid_fraction_fails_before_scan() {
        let dir = TempDir::new().unwrap();
        // No shard directory: the fraction check must fire first
        let config = Config {
            eval_fraction: -0.5,
            ..config_in(dir.path())
        };
        let err = run(&config, &ProgressBar::hidden()).unwrap_err();
        assert!(err.to_string().contains("fraction"));
        assert!(!config.train_file.exists());
    }

    #[test]
    fn missing_vocabulary_is_fatal() {
        let dir = TempDir::new().unwrap();
        write_shard(&dir.path().join("chunks"), 0, &[labeled(1)]);
        let config = Config {
            vocabulary: Some(dir.path().join("missing.ttl")),
            ..config_in(dir.path())
        };
        assert!(run(&config, &ProgressBar::hidden()).is_err());
        assert!(!config.train_file.exists());
    }

    #[test]
    fn contiguous_split_with_stats_json() {
        let dir = TempDir::new().unwrap();
        let records: Vec<String> = (0..10).map(labeled).collect();
        write_shard(&dir.path().join("chunks"), 0, &records);

        let config = Config {
            eval_fraction: 0.5,
            eval_start: Some(8),
            stats_json: Some(dir.path().join("stats.json")),
            ..config_in(dir.path())
        };
        let summary = run(&config, &ProgressBar::hidden()).unwrap();
        assert_eq!(summary.eval_records, 1);
        assert_eq!(summary.eval_requested, 5);
        assert_eq!(summary.train_records, 9);
        assert!(
            std::fs::read_to_string(&config.eval_file)
                .unwrap()
                .starts_with("T8\t")
        );

        let stats: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("stats.json")).unwrap())
                .unwrap();
        assert_eq!(stats["total_records"], 10);
        assert_eq!(summary.stats.unwrap().total_records, 10);
    }
}
