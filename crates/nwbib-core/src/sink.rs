//! Shard files: JSON-array writer with atomic tmp→rename, and shard discovery

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Filename prefix for shard files (`nwbib_<offset>.json`)
pub const SHARD_PREFIX: &str = "nwbib";

/// Shard filename for a shard whose first record has cumulative offset `offset`
pub fn shard_file_name(offset: usize) -> String {
    format!("{SHARD_PREFIX}_{offset}.json")
}

/// Parse the record offset back out of a shard path.
///
/// Returns `None` for files not following the `nwbib_<digits>.json` scheme.
pub fn parse_shard_offset(path: &Path) -> Option<usize> {
    let name = path.file_name()?.to_str()?;
    let digits = name
        .strip_prefix(SHARD_PREFIX)?
        .strip_prefix('_')?
        .strip_suffix(".json")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// List shard files in `dir`, ordered by record offset.
///
/// Directory iteration order is filesystem-defined, so shards are sorted
/// explicitly. Files with a non-numeric suffix sort last, by name.
pub fn list_shards(dir: &Path) -> io::Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("shard directory not found: {}", dir.display()),
        ));
    }
    // Metacharacters in the directory itself (`run[1]/`) must match literally
    let pattern_str = format!(
        "{}/{SHARD_PREFIX}_*.json",
        glob::Pattern::escape(&dir.to_string_lossy())
    );
    let entries = glob::glob(&pattern_str)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let mut shards: Vec<(Option<usize>, PathBuf)> = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) => shards.push((parse_shard_offset(&path), path)),
            Err(e) => log::warn!("Skipping unreadable shard entry: {e}"),
        }
    }
    // Numbered shards first (by offset), unnumbered names last
    shards.sort_by(|(a_off, a_path), (b_off, b_path)| {
        a_off
            .is_none()
            .cmp(&b_off.is_none())
            .then(a_off.cmp(b_off))
            .then_with(|| a_path.cmp(b_path))
    });
    Ok(shards.into_iter().map(|(_, path)| path).collect())
}

/// Buffered shard writer: records are written verbatim into a JSON array.
///
/// The array is built in `<name>.tmp` and renamed on [`finalize`](Self::finalize),
/// so a shard is either complete under its final name or absent.
pub struct ShardSink {
    writer: BufWriter<File>,
    tmp_path: PathBuf,
    final_path: PathBuf,
    record_count: usize,
}

impl std::fmt::Debug for ShardSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShardSink")
            .field("final_path", &self.final_path)
            .field("record_count", &self.record_count)
            .finish_non_exhaustive()
    }
}

impl ShardSink {
    /// Open a new shard starting at cumulative record `offset`
    pub fn new(output_dir: &Path, offset: usize) -> io::Result<Self> {
        let filename = shard_file_name(offset);
        let final_path = output_dir.join(&filename);
        let tmp_path = output_dir.join(format!("{filename}.tmp"));

        let mut writer = BufWriter::new(File::create(&tmp_path)?);
        writer.write_all(b"[")?;

        Ok(Self {
            writer,
            tmp_path,
            final_path,
            record_count: 0,
        })
    }

    /// Append one raw record (a single JSON value without line terminator).
    ///
    /// Bytes are copied as-is; they are not checked for UTF-8 or JSON.
    pub fn write_record(&mut self, record: impl AsRef<[u8]>) -> io::Result<()> {
        if self.record_count > 0 {
            self.writer.write_all(b",")?;
        }
        self.writer.write_all(record.as_ref())?;
        self.writer.write_all(b"\n")?;
        self.record_count += 1;
        Ok(())
    }

    pub fn record_count(&self) -> usize {
        self.record_count
    }

    pub fn path(&self) -> &Path {
        &self.final_path
    }

    /// Close the array and atomically rename tmp → final
    pub fn finalize(mut self) -> io::Result<usize> {
        self.writer.write_all(b"]")?;
        self.writer.flush()?;
        drop(self.writer);
        fs::rename(&self.tmp_path, &self.final_path)?;
        Ok(self.record_count)
    }
}

/// Remove shard files left in `output_dir` by an earlier run.
///
/// A new chunking run must own the whole shard set; leftovers with offsets
/// past the new input would otherwise be scanned as part of it.
pub fn remove_shards(output_dir: &Path) -> io::Result<usize> {
    let stale = list_shards(output_dir)?;
    for path in &stale {
        fs::remove_file(path)?;
    }
    if !stale.is_empty() {
        log::warn!(
            "Removed {} shards from a previous run in {}",
            stale.len(),
            output_dir.display()
        );
    }
    Ok(stale.len())
}

/// Remove stale .tmp files in the output directory
pub fn cleanup_tmp_files(output_dir: &Path) -> io::Result<()> {
    for entry in fs::read_dir(output_dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "tmp") {
            log::warn!("Removing stale tmp file: {}", path.display());
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}
