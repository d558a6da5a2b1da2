//! NWBib Subjects - subject-classification dataset preparation
//!
//! Scans the shards written by `nwbib_core::chunk_file`, extracts each
//! record's title and NWBib subjects, and splits the labeled records into
//! training and evaluation TSV files.
//!
//! # Features
//!
//! - Optional subject filtering against the NWBib SKOS vocabulary
//! - Parallel shard decoding with sonic-rs and rayon, merged in corpus order
//! - Contiguous or (optionally seeded) random evaluation split
//! - Frequency statistics with table and JSON reports
//!
//! # Example
//!
//! ```ignore
//! use nwbib_subjects::{Config, run};
//!
//! let config = Config {
//!     shard_dir: "chunks".into(),
//!     vocabulary: Some("nwbib.ttl".into()),
//!     eval_fraction: 0.1,
//!     ..Default::default()
//! };
//!
//! let summary = run(&config, &indicatif::ProgressBar::hidden())?;
//! println!("{} training records", summary.train_records);
//! ```

pub mod config;
pub mod extract;
pub mod output;
pub mod runner;
pub mod scanner;
pub mod split;
pub mod stats;
pub mod vocab;

// Re-exports
pub use config::Config;
pub use extract::{Extraction, NormalizedRecord, RawRecord, Subject, extract_record};
pub use runner::{RunSummary, run};
pub use scanner::{Corpus, ScanOptions, ScanSummary, scan_corpus};
pub use split::{EvalSelection, SplitError, SplitStrategy, partition, select_eval_indices};
pub use stats::Statistics;
pub use vocab::{VocabularySet, load_vocabulary};
