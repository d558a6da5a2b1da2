//! Configuration loading from TOML files

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use nwbib_core::DEFAULT_CHUNK_SIZE;
use nwbib_subjects::config::{DEFAULT_EVAL_FILE, DEFAULT_TRAIN_FILE, DEFAULT_UNLABELED_FILE};
use serde::Deserialize;

/// Global configuration for nwbib
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub chunk: ChunkSection,
    pub prepare: PrepareSection,
    pub workers: WorkersConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChunkSection {
    pub chunk_size: usize,
    /// Shard directory, shared by `chunk` (output) and `prepare` (input)
    pub shard_dir: PathBuf,
}

impl Default for ChunkSection {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            shard_dir: PathBuf::from("chunks"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PrepareSection {
    pub eval_fraction: f64,
    pub vocabulary: Option<PathBuf>,
    pub train_file: PathBuf,
    pub eval_file: PathBuf,
    pub unlabeled_file: PathBuf,
}

impl Default for PrepareSection {
    fn default() -> Self {
        Self {
            eval_fraction: 0.1,
            vocabulary: None,
            train_file: PathBuf::from(DEFAULT_TRAIN_FILE),
            eval_file: PathBuf::from(DEFAULT_EVAL_FILE),
            unlabeled_file: PathBuf::from(DEFAULT_UNLABELED_FILE),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct WorkersConfig {
    pub default: usize,
}

impl Default for WorkersConfig {
    fn default() -> Self {
        let cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        Self {
            default: cpus.min(8),
        }
    }
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./nwbib.toml (current directory)
    /// 2. ~/.config/nwbib/config.toml
    ///
    /// If no config file found, returns default config.
    pub fn load() -> Result<Self> {
        let local_config = PathBuf::from("nwbib.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "nwbib") {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }
}
