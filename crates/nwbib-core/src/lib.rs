//! NWBib Core - Common infrastructure for the NWBib dataset pipeline
//!
//! This crate provides the streaming building blocks: gzip-aware input
//! readers, the bounded-memory JSON-lines chunker, shard file handling,
//! logging and progress reporting.

pub mod chunker;
pub mod error;
pub mod logging;
pub mod progress;
pub mod sink;
pub mod stream;

// Re-exports for convenience
pub use chunker::{ChunkConfig, ChunkSummary, DEFAULT_CHUNK_SIZE, chunk_file, write_shards};
pub use error::ShardError;
pub use logging::{IndicatifLogger, init_logging};
pub use progress::{ProgressContext, SharedProgress, fmt_num, pct};
pub use sink::{
    ShardSink, cleanup_tmp_files, list_shards, parse_shard_offset, remove_shards, shard_file_name,
};
pub use stream::{ByteCounter, InputReader, open_input};
