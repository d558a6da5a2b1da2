//! Bounded-memory chunking of a JSON-lines stream into JSON-array shards.
//!
//! A full NWBib export is several GB and cannot be decoded in one pass.
//! The chunker streams it line by line and writes every `chunk_size` records
//! to `nwbib_<offset>.json`. Records are copied verbatim, never parsed, and
//! only the current line is held in memory.

use std::fs;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use indicatif::ProgressBar;

use crate::progress::{fmt_num, upgrade_to_bar};
use crate::sink::{ShardSink, cleanup_tmp_files, remove_shards};
use crate::stream::{ByteCounter, open_input};

/// Records per shard
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Initial capacity for the per-line read buffer
const LINE_BUF_CAPACITY: usize = 16 * 1024;

/// Progress update interval (every N lines to avoid overhead)
const UPDATE_INTERVAL: usize = 10_000;

/// Runtime configuration for a chunking run
#[derive(Debug, Clone)]
pub struct ChunkConfig {
    /// JSON-lines input, plain or gzipped; `-` for stdin
    pub input: PathBuf,
    /// Directory receiving the shard files
    pub output_dir: PathBuf,
    /// Maximum records per shard
    pub chunk_size: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("nwbib"),
            output_dir: PathBuf::from("chunks"),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Summary of a chunking run
#[derive(Debug, Default)]
pub struct ChunkSummary {
    pub records: usize,
    pub shards: usize,
    /// Whitespace-only lines (not records, not written)
    pub blank_lines: usize,
    pub elapsed: Duration,
}

impl ChunkSummary {
    pub fn log(&self) {
        log::info!(
            "Chunked {} records into {} shards ({} blank lines skipped) in {:.1}s",
            fmt_num(self.records),
            fmt_num(self.shards),
            self.blank_lines,
            self.elapsed.as_secs_f64()
        );
    }
}

/// Split the configured input into shards under `config.output_dir`.
///
/// The input is opened before anything is created on disk, so an unreadable
/// input leaves no partial output behind.
pub fn chunk_file(config: &ChunkConfig, pb: &ProgressBar) -> io::Result<ChunkSummary> {
    if config.chunk_size == 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "chunk size must be at least 1",
        ));
    }

    let (mut reader, counter, total_bytes) = open_input(&config.input).map_err(|e| {
        io::Error::new(
            e.kind(),
            format!("cannot open input {}: {e}", config.input.display()),
        )
    })?;

    fs::create_dir_all(&config.output_dir)?;
    cleanup_tmp_files(&config.output_dir)?;
    remove_shards(&config.output_dir)?;

    if let Some(total) = total_bytes {
        upgrade_to_bar(pb, total);
    }
    log::info!(
        "Chunking {} into {} ({} records per shard)",
        config.input.display(),
        config.output_dir.display(),
        config.chunk_size
    );

    let summary = write_shards(
        &mut reader,
        &config.output_dir,
        config.chunk_size,
        &counter,
        pb,
    )?;
    summary.log();
    Ok(summary)
}

/// Stream lines from `reader` into shards of at most `chunk_size` records.
///
/// Shard files are named by the cumulative offset of their first record.
/// Lines are handled as raw bytes, so a record that is not valid UTF-8 is
/// still copied. An empty input produces no shards.
pub fn write_shards<R: BufRead>(
    reader: &mut R,
    output_dir: &Path,
    chunk_size: usize,
    counter: &ByteCounter,
    pb: &ProgressBar,
) -> io::Result<ChunkSummary> {
    let start = Instant::now();
    let mut buf: Vec<u8> = Vec::with_capacity(LINE_BUF_CAPACITY);
    let mut open: Option<ShardSink> = None;
    let mut summary = ChunkSummary::default();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let record = trim_line_end(&buf);
        if record.iter().all(u8::is_ascii_whitespace) {
            summary.blank_lines += 1;
            continue;
        }

        let mut shard = match open.take() {
            Some(shard) => shard,
            None => ShardSink::new(output_dir, summary.records)?,
        };
        shard.write_record(record)?;
        summary.records += 1;

        if shard.record_count() >= chunk_size {
            log::debug!("Closing {}", shard.path().display());
            shard.finalize()?;
            summary.shards += 1;
        } else {
            open = Some(shard);
        }

        if summary.records % UPDATE_INTERVAL == 0 {
            pb.set_position(counter.load(Ordering::Relaxed));
            pb.set_message(format!(
                "{} records, {} shards",
                fmt_num(summary.records),
                fmt_num(summary.shards)
            ));
        }
    }

    // Partial final shard
    if let Some(shard) = open {
        shard.finalize()?;
        summary.shards += 1;
    }

    summary.elapsed = start.elapsed();
    Ok(summary)
}

/// Strip a trailing `\n` / `\r\n` (and any stray `\r`)
fn trim_line_end(line: &[u8]) -> &[u8] {
    let end = line
        .iter()
        .rposition(|&b| b != b'\n' && b != b'\r')
        .map_or(0, |i| i + 1);
    &line[..end]
}
