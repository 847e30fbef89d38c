use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{PdropError, PdropResult};

/// Top-level client configuration (loaded from pdrop.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PdropConfig {
    pub storage: StorageConfig,
    pub crypto: CryptoConfig,
    pub log: LogConfig,
    /// Warn if the config file is world-readable (default: true)
    #[serde(default = "default_true")]
    pub config_file_mode_check: bool,
}

fn default_true() -> bool {
    true
}

/// Which OpenDAL service backs the drop bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Any S3-compatible endpoint
    S3,
    /// Local directory (testing, air-gapped handoff)
    Fs,
    /// Process-local memory, nothing survives exit
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// S3 endpoint
    pub endpoint: String,
    /// S3 region (default: us-east-1)
    pub region: String,
    /// Bucket name
    pub bucket: String,
    /// Object key prefix under which drops are written
    pub prefix: String,
    /// Root directory for the `fs` backend
    pub root: PathBuf,
    /// Enforce HTTPS for S3 connections (warn/error on HTTP endpoints)
    pub enforce_tls: bool,
}

/// Argon2id parameters applied to the secret before key/id expansion
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    /// Argon2id memory cost in KiB (default: 16384 = 16 MiB)
    pub argon2_mem_cost_kib: u32,
    /// Argon2id time cost (iterations, default: 2)
    pub argon2_time_cost: u32,
    /// Argon2id parallelism (default: 1)
    pub argon2_parallelism: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (default: warn)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::S3,
            endpoint: "http://localhost:9000".into(),
            region: "us-east-1".into(),
            bucket: "pdrop".into(),
            prefix: "drops".into(),
            root: PathBuf::from("~/.local/share/pdrop/store"),
            enforce_tls: false,
        }
    }
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            argon2_mem_cost_kib: 16384,
            argon2_time_cost: 2,
            argon2_parallelism: 1,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
            format: "text".into(),
        }
    }
}

impl PdropConfig {
    /// Load configuration from a TOML file, falling back to defaults when
    /// the file does not exist.
    pub fn load(path: &Path) -> PdropResult<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| PdropError::Config(format!("parsing {}: {e}", path.display())))
    }

    /// Log a warning if mode checks are enabled and `path` is world-readable.
    pub fn warn_if_world_readable(&self, path: &Path) {
        if self.config_file_mode_check && is_world_readable(path) {
            tracing::warn!(
                path = %path.display(),
                "config file is world-readable; consider chmod 600"
            );
        }
    }
}

/// True if others can read `path` (unix only; false elsewhere or on error).
#[cfg(unix)]
pub fn is_world_readable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.permissions().mode() & 0o004 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
pub fn is_world_readable(_path: &Path) -> bool {
    false
}
