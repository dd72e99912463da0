//! Configuration for ransom-sentry.
//!
//! Stored as JSON under the platform data directory. Missing sections and
//! fields take their defaults, so a file only needs the values it changes.

use crate::core::error::{Error, Result};
use crate::detection::store::SignatureStore;
use crate::utils::hash::MAX_CHUNK_SIZE;
use crate::utils::logging::parse_level;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const MAX_CHUNK_SIZE_KB: usize = MAX_CHUNK_SIZE / 1024;

const CONFIG_FILE: &str = "config.json";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scan: ScanConfig,
    pub signatures: SignatureConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Read a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigLoad(format!("{}: {}", path.display(), e)))?;

        serde_json::from_str(&contents)
            .map_err(|e| Error::ConfigLoad(format!("{}: {}", path.display(), e)))
    }

    /// Write the configuration as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::ConfigSave(format!("cannot create {}: {}", parent.display(), e))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| Error::ConfigSave(format!("{}: {}", path.display(), e)))
    }

    /// Load an explicit file, or fall back to [`Config::load_or_default`].
    ///
    /// An explicit path must exist and parse; the default location may be
    /// missing or broken.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => Ok(Self::load_or_default()),
        }
    }

    /// Load from the default location, using defaults when absent or unreadable.
    pub fn load_or_default() -> Self {
        let path = Self::default_config_path();
        if !path.exists() {
            return Self::default();
        }

        Self::load(&path).unwrap_or_else(|e| {
            log::warn!("Ignoring configuration, using defaults: {}", e);
            Self::default()
        })
    }

    pub fn default_config_path() -> PathBuf {
        Self::data_dir().join(CONFIG_FILE)
    }

    /// Per-user data directory for ransom-sentry.
    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("ransom-sentry")
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        let chunk = self.scan.chunk_size_kb;
        if !(1..=MAX_CHUNK_SIZE_KB).contains(&chunk) {
            return Err(invalid(
                "scan.chunk_size_kb",
                format!("{} is outside 1..={}", chunk, MAX_CHUNK_SIZE_KB),
            ));
        }

        if self.scan.skip_large_files_mb == 0 {
            return Err(invalid("scan.skip_large_files_mb", "must be greater than 0"));
        }

        if let Some(ext) = self
            .scan
            .exclude_extensions
            .iter()
            .find(|ext| ext.is_empty() || ext.starts_with('.'))
        {
            return Err(invalid(
                "scan.exclude_extensions",
                format!("'{}' must be a bare extension such as \"iso\"", ext),
            ));
        }

        if parse_level(&self.logging.log_level).is_none() {
            return Err(invalid(
                "logging.log_level",
                format!("unknown level '{}'", self.logging.log_level),
            ));
        }

        Ok(())
    }

    /// Build a signature store from the built-in list and configured feeds.
    ///
    /// Any feed that fails to load fails the whole build.
    pub fn build_store(&self) -> Result<SignatureStore> {
        let mut store = if self.signatures.use_builtin {
            SignatureStore::with_builtin()?
        } else {
            SignatureStore::new()
        };

        for feed in &self.signatures.feeds {
            store.load_feed_file(feed)?;
        }

        if store.is_empty() {
            log::warn!("No signatures loaded; every scan will report clean");
        }
        Ok(store)
    }
}

fn invalid(field: &str, message: impl Into<String>) -> Error {
    Error::ConfigInvalid {
        field: field.to_string(),
        message: message.into(),
    }
}

/// Batch scanning settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Read chunk size (KB)
    pub chunk_size_kb: usize,
    /// Skip files larger than this size (MB)
    pub skip_large_files_mb: u64,
    pub follow_symlinks: bool,
    /// Lowercase extensions, without the dot, that are never scanned
    pub exclude_extensions: Vec<String>,
    /// Worker count (capped at 8)
    pub scan_threads: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            chunk_size_kb: 8,
            skip_large_files_mb: 100,
            follow_symlinks: false,
            exclude_extensions: ["iso", "vmdk", "vhd"].map(String::from).to_vec(),
            scan_threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
        }
    }
}

impl ScanConfig {
    /// Chunk size in bytes.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size_kb * 1024
    }
}

/// Where signatures come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignatureConfig {
    /// Load the compiled-in ransomware list
    pub use_builtin: bool,
    /// Feed files (`.json` or flat text), loaded in order
    pub feeds: Vec<PathBuf>,
}

impl Default for SignatureConfig {
    fn default() -> Self {
        Self {
            use_builtin: true,
            feeds: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// off, error, warn, info, debug or trace
    pub log_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
