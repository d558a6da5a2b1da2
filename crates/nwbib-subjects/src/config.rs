//! Dataset preparation configuration

use std::path::PathBuf;

use crate::split::{SplitError, SplitStrategy, validate_fraction};

pub const DEFAULT_TRAIN_FILE: &str = "nwbib_subjects_train.tsv";
pub const DEFAULT_EVAL_FILE: &str = "nwbib_subjects_test.tsv";
pub const DEFAULT_UNLABELED_FILE: &str = "nwbib_subjects_unlabeled.txt";

/// Runtime configuration for dataset preparation
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding `nwbib_<offset>.json` shards
    pub shard_dir: PathBuf,
    /// Vocabulary file; `None` disables subject filtering
    pub vocabulary: Option<PathBuf>,
    pub collect_stats: bool,
    /// Write the full statistics tables here as JSON
    pub stats_json: Option<PathBuf>,
    /// Fraction of valid records held out for evaluation
    pub eval_fraction: f64,
    /// Start of a contiguous evaluation range; random sampling when `None`
    pub eval_start: Option<usize>,
    /// Seed for random sampling
    pub seed: Option<u64>,
    pub workers: usize,
    pub train_file: PathBuf,
    pub eval_file: PathBuf,
    pub unlabeled_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            shard_dir: PathBuf::from("chunks"),
            vocabulary: None,
            collect_stats: false,
            stats_json: None,
            eval_fraction: 0.1,
            eval_start: None,
            seed: None,
            workers: 1,
            train_file: PathBuf::from(DEFAULT_TRAIN_FILE),
            eval_file: PathBuf::from(DEFAULT_EVAL_FILE),
            unlabeled_file: PathBuf::from(DEFAULT_UNLABELED_FILE),
        }
    }
}

impl Config {
    /// Checks that need no corpus data
    pub fn validate(&self) -> Result<(), SplitError> {
        validate_fraction(self.eval_fraction)
    }

    pub fn strategy(&self) -> SplitStrategy {
        match self.eval_start {
            Some(start) => SplitStrategy::Contiguous { start },
            None => SplitStrategy::Random { seed: self.seed },
        }
    }

    /// Statistics are needed for the report or the JSON dump
    pub fn wants_stats(&self) -> bool {
        self.collect_stats || self.stats_json.is_some()
    }
}
