//! Local input streams with transparent gzip decompression.
//!
//! The lobid.org JSON-lines export is delivered gzipped. [`open_input`] sniffs
//! the gzip magic bytes, so compressed and plain files (or stdin) are read
//! through the same line-oriented interface.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use flate2::read::MultiGzDecoder;

/// First two bytes of every gzip member
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Buffer size for input readers (256KB)
const INPUT_BUF_SIZE: usize = 256 * 1024;

/// Shared byte counter for progress tracking (counts on-disk bytes)
pub type ByteCounter = Arc<AtomicU64>;

/// Buffered line reader over a plain or gzip-decoded input
pub type InputReader = Box<dyn BufRead + Send>;

/// Open a JSON-lines input for streaming.
///
/// `-` reads stdin. Returns (reader, byte_counter, total_bytes); the total is
/// the on-disk size and is unknown for stdin.
pub fn open_input(path: &Path) -> io::Result<(InputReader, ByteCounter, Option<u64>)> {
    let counter = Arc::new(AtomicU64::new(0));

    if path.as_os_str() == "-" {
        let reader = decode(CountingReader::new(io::stdin(), counter.clone()))?;
        return Ok((reader, counter, None));
    }

    let file = File::open(path)?;
    let total_bytes = file.metadata().ok().map(|m| m.len());
    let reader = decode(CountingReader::new(file, counter.clone()))?;
    Ok((reader, counter, total_bytes))
}

/// Wrap `raw` in a gzip decoder when the stream starts with the gzip magic.
fn decode<R: Read + Send + 'static>(raw: R) -> io::Result<InputReader> {
    let mut buffered = BufReader::with_capacity(INPUT_BUF_SIZE, raw);
    let is_gzip = buffered.fill_buf()?.starts_with(&GZIP_MAGIC);
    if is_gzip {
        log::debug!("gzip input detected");
        let gz = MultiGzDecoder::new(buffered);
        Ok(Box::new(BufReader::with_capacity(INPUT_BUF_SIZE, gz)))
    } else {
        Ok(Box::new(buffered))
    }
}

/// Reader wrapper that tracks bytes read
pub struct CountingReader<R> {
    inner: R,
    count: ByteCounter,
}

impl<R> CountingReader<R> {
    pub fn new(inner: R, count: ByteCounter) -> Self {
        Self { inner, count }
    }
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.count.fetch_add(n as u64, Ordering::Relaxed);
        Ok(n)
    }
}
