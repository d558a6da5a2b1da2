//! Corpus scan: decode every shard, extract records, route by subject presence

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use indicatif::ProgressBar;
use nwbib_core::progress::upgrade_to_shard_bar;
use nwbib_core::{ShardError, fmt_num, list_shards};
use rayon::prelude::*;
use serde_json::Value;

use crate::extract::{NormalizedRecord, extract_record};
use crate::stats::Statistics;
use crate::vocab::VocabularySet;

/// Log a progress line every N records
const LOG_INTERVAL: usize = 100_000;

/// Scan settings
#[derive(Debug, Clone, Copy)]
pub struct ScanOptions<'a> {
    pub vocabulary: Option<&'a VocabularySet>,
    pub collect_stats: bool,
    /// Threads decoding shards in parallel
    pub workers: usize,
}

impl Default for ScanOptions<'_> {
    fn default() -> Self {
        Self {
            vocabulary: None,
            collect_stats: false,
            workers: 1,
        }
    }
}

/// Counters from a full scan
#[derive(Debug, Clone, Default)]
pub struct ScanSummary {
    pub total_shards: usize,
    pub failed_shards: usize,
    pub records: usize,
    pub valid: usize,
    pub unlabeled: usize,
    /// Array elements that were not JSON objects
    pub malformed: usize,
    pub vocabulary_rejections: usize,
    pub elapsed: Duration,
}

impl ScanSummary {
    pub fn log(&self) {
        log::info!(
            "Scanned {} records from {}/{} shards: {} with subjects, {} without [{:.1}s]",
            fmt_num(self.records),
            self.total_shards - self.failed_shards,
            self.total_shards,
            fmt_num(self.valid),
            fmt_num(self.unlabeled),
            self.elapsed.as_secs_f64()
        );
        if self.failed_shards > 0 {
            log::warn!("{} shards could not be decoded and were skipped", self.failed_shards);
        }
        if self.malformed > 0 {
            log::warn!("{} non-object records skipped", fmt_num(self.malformed));
        }
        if self.vocabulary_rejections > 0 {
            log::warn!(
                "{} subjects dropped (not in vocabulary)",
                fmt_num(self.vocabulary_rejections)
            );
        }
    }
}

/// Normalized corpus, in shard-offset order
#[derive(Debug, Default)]
pub struct Corpus {
    pub valid_records: Vec<NormalizedRecord>,
    pub records_without_subjects: Vec<NormalizedRecord>,
    /// Present when statistics collection was enabled
    pub stats: Option<Statistics>,
    pub summary: ScanSummary,
}

/// Records extracted from a single shard
#[derive(Debug, Default)]
struct ShardScan {
    valid: Vec<NormalizedRecord>,
    unlabeled: Vec<NormalizedRecord>,
    stats: Option<Statistics>,
    malformed: usize,
    rejections: usize,
}

impl ShardScan {
    fn records(&self) -> usize {
        self.valid.len() + self.unlabeled.len()
    }
}

/// Scan all shards in `shard_dir`.
///
/// Shards are visited in offset order, so `valid_records` follows corpus
/// order regardless of how many workers decode in parallel. A shard that
/// cannot be read or decoded is logged and skipped.
pub fn scan_corpus(shard_dir: &Path, opts: &ScanOptions<'_>, pb: &ProgressBar) -> Result<Corpus> {
    let start = Instant::now();
    let shards = list_shards(shard_dir)
        .with_context(|| format!("Failed to list shards in {}", shard_dir.display()))?;
    if shards.is_empty() {
        log::warn!("No shards found in {}", shard_dir.display());
    }
    log::info!(
        "Scanning {} shards with {} workers",
        shards.len(),
        opts.workers.max(1)
    );
    upgrade_to_shard_bar(pb, shards.len() as u64);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(opts.workers.max(1))
        .build()
        .context("Failed to build scan thread pool")?;

    // Indexed collect keeps results in shard order
    let results: Vec<(PathBuf, Result<ShardScan, ShardError>)> = pool.install(|| {
        shards
            .into_par_iter()
            .map(|path| {
                let result = scan_shard(&path, opts);
                pb.inc(1);
                (path, result)
            })
            .collect()
    });

    let mut corpus = Corpus {
        stats: opts.collect_stats.then(Statistics::default),
        ..Default::default()
    };
    corpus.summary.total_shards = results.len();

    for (path, result) in results {
        let shard = match result {
            Ok(shard) => shard,
            Err(e) => {
                let what = if e.is_decode() { "decode" } else { "read" };
                log::warn!("Could not {what} shard {}, skipped: {e}", path.display());
                corpus.summary.failed_shards += 1;
                continue;
            }
        };

        let before = corpus.summary.records;
        corpus.summary.records += shard.records();
        corpus.summary.malformed += shard.malformed;
        corpus.summary.vocabulary_rejections += shard.rejections;
        if before / LOG_INTERVAL != corpus.summary.records / LOG_INTERVAL {
            log::info!("{} records processed", fmt_num(corpus.summary.records));
        }

        if let (Some(total), Some(part)) = (corpus.stats.as_mut(), shard.stats) {
            total.merge(part);
        }
        corpus.valid_records.extend(shard.valid);
        corpus.records_without_subjects.extend(shard.unlabeled);
    }

    corpus.summary.valid = corpus.valid_records.len();
    corpus.summary.unlabeled = corpus.records_without_subjects.len();
    corpus.summary.elapsed = start.elapsed();
    pb.set_message(format!("{} records", fmt_num(corpus.summary.records)));
    corpus.summary.log();
    Ok(corpus)
}

/// Decode one shard and extract its records
fn scan_shard(path: &Path, opts: &ScanOptions<'_>) -> Result<ShardScan, ShardError> {
    let bytes = std::fs::read(path)?;
    let values: Vec<Value> = sonic_rs::from_slice(&bytes).map_err(ShardError::decode)?;

    let mut shard = ShardScan {
        stats: opts.collect_stats.then(Statistics::default),
        ..Default::default()
    };
    for value in values {
        let Value::Object(raw) = value else {
            shard.malformed += 1;
            continue;
        };
        let out = extract_record(&raw, opts.vocabulary);
        shard.rejections += out.rejected.len();
        if let Some(stats) = shard.stats.as_mut() {
            stats.observe(&raw, &out.record);
        }
        if out.record.has_subjects() {
            shard.valid.push(out.record);
        } else {
            shard.unlabeled.push(out.record);
        }
    }
    log::debug!(
        "{}: {} records ({} with subjects)",
        path.display(),
        shard.records(),
        shard.valid.len()
    );
    Ok(shard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_shard(dir: &Path, offset: usize, records: &[&str]) {
        let content = format!("[{}]", records.join(",\n"));
        std::fs::write(dir.join(nwbib_core::shard_file_name(offset)), content).unwrap();
    }

    fn labeled(title: &str, n: u32) -> String {
        format!(
            r#"{{"title": "{title}", "subject": [{{"id": "https://nwbib.de/subjects#N{n}", "label": "S{n}"}}]}}"#
        )
    }

    fn scan(dir: &Path, opts: &ScanOptions<'_>) -> Corpus {
        scan_corpus(dir, opts, &ProgressBar::hidden()).unwrap()
    }

    fn titles(records: &[NormalizedRecord]) -> Vec<&str> {
        records.iter().map(|r| r.title.as_str()).collect()
    }

    #[test]
    fn routes_by_subject_presence() {
        let dir = TempDir::new().unwrap();
        write_shard(
            dir.path(),
            0,
            &[&labeled("a", 1), r#"{"title": "b"}"#, &labeled("c", 2)],
        );
        let corpus = scan(dir.path(), &ScanOptions::default());
        assert_eq!(titles(&corpus.valid_records), vec!["a", "c"]);
        assert_eq!(titles(&corpus.records_without_subjects), vec!["b"]);
        assert_eq!(corpus.summary.records, 3);
        assert!(corpus.stats.is_none());
    }

    #[test]
    fn shards_visited_in_offset_order() {
        let dir = TempDir::new().unwrap();
        // Written out of order; 10 sorts before 2 lexically
        write_shard(dir.path(), 10, &[&labeled("third", 3)]);
        write_shard(dir.path(), 0, &[&labeled("first", 1)]);
        write_shard(dir.path(), 2, &[&labeled("second", 2)]);
        let opts = ScanOptions {
            workers: 3,
            ..Default::default()
        };
        let corpus = scan(dir.path(), &opts);
        assert_eq!(
            titles(&corpus.valid_records),
            vec!["first", "second", "third"]
        );
    }

    #[test]
    fn malformed_shard_skipped() {
        let dir = TempDir::new().unwrap();
        write_shard(dir.path(), 0, &[&labeled("ok", 1)]);
        std::fs::write(dir.path().join("nwbib_1.json"), "[{\"title\": ").unwrap();
        write_shard(dir.path(), 2, &[&labeled("also ok", 2)]);

        let corpus = scan(dir.path(), &ScanOptions::default());
        assert_eq!(corpus.summary.total_shards, 3);
        assert_eq!(corpus.summary.failed_shards, 1);
        assert_eq!(titles(&corpus.valid_records), vec!["ok", "also ok"]);
    }

    #[test]
    fn non_object_elements_counted() {
        let dir = TempDir::new().unwrap();
        write_shard(dir.path(), 0, &["42", &labeled("ok", 1), "null"]);
        let corpus = scan(dir.path(), &ScanOptions::default());
        assert_eq!(corpus.summary.malformed, 2);
        assert_eq!(corpus.summary.records, 1);
    }

    #[test]
    fn vocabulary_applied_and_rejections_counted() {
        let dir = TempDir::new().unwrap();
        write_shard(dir.path(), 0, &[&labeled("kept", 1), &labeled("dropped", 2)]);
        let vocab: VocabularySet = ["https://nwbib.de/subjects#N1".to_string()]
            .into_iter()
            .collect();
        let opts = ScanOptions {
            vocabulary: Some(&vocab),
            ..Default::default()
        };
        let corpus = scan(dir.path(), &opts);
        assert_eq!(titles(&corpus.valid_records), vec!["kept"]);
        assert_eq!(titles(&corpus.records_without_subjects), vec!["dropped"]);
        assert_eq!(corpus.summary.vocabulary_rejections, 1);
    }

    #[test]
    fn statistics_collected_across_shards() {
        let dir = TempDir::new().unwrap();
        write_shard(dir.path(), 0, &[&labeled("a", 1), r#"{"title": "b"}"#]);
        write_shard(dir.path(), 2, &[&labeled("c", 1)]);
        let opts = ScanOptions {
            collect_stats: true,
            workers: 2,
            ..Default::default()
        };
        let stats = scan(dir.path(), &opts).stats.unwrap();
        assert_eq!(stats.total_records, 3);
        assert_eq!(stats.record_keys["title"], 3);
        assert_eq!(stats.subjects["https://nwbib.de/subjects#N1 (S1)"], 2);
        assert_eq!(stats.subjects_per_record[&0], 1);
        assert_eq!(stats.subjects_per_record[&1], 2);
    }

    #[test]
    fn rescan_is_identical() {
        let dir = TempDir::new().unwrap();
        for offset in 0..5 {
            write_shard(
                dir.path(),
                offset * 2,
                &[&labeled(&format!("l{offset}"), 1), r#"{"title": "u"}"#],
            );
        }
        let opts = ScanOptions {
            workers: 4,
            ..Default::default()
        };
        let first = scan(dir.path(), &opts);
        let second = scan(dir.path(), &opts);
        assert_eq!(first.valid_records, second.valid_records);
        assert_eq!(
            first.records_without_subjects,
            second.records_without_subjects
        );
    }

    #[test]
    fn shard_dir_with_glob_metacharacters() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("run[1]").join("chunks");
        std::fs::create_dir_all(&dir).unwrap();
        write_shard(&dir, 0, &[&labeled("a", 1)]);
        write_shard(&dir, 1, &[&labeled("b", 2)]);

        let corpus = scan(&dir, &ScanOptions::default());
        assert_eq!(corpus.summary.total_shards, 2);
        assert_eq!(titles(&corpus.valid_records), vec!["a", "b"]);
    }

    #[test]
    fn empty_directory_scans_nothing() {
        let dir = TempDir::new().unwrap();
        let corpus = scan(dir.path(), &ScanOptions::default());
        assert_eq!(corpus.summary.total_shards, 0);
        assert!(corpus.valid_records.is_empty());
    }

    #[test]
    fn missing_directory_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(
            scan_corpus(
                &dir.path().join("absent"),
                &ScanOptions::default(),
                &ProgressBar::hidden()
            )
            .is_err()
        );
    }
}
