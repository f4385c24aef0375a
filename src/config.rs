//! TOML configuration.
//!
//! Every entry point receives an explicit [`Config`] value; nothing is read
//! from process-wide state after startup.
//!
//! ```toml
//! [db]
//! path = "./data/snapshot.sqlite"
//!
//! [ingest]
//! root = "/path/to/codebase"
//! exclude_globs = ["*/node_modules/*", "*.log"]
//! extra_exclude_globs = ["*/fixtures/*"]
//! follow_symlinks = false
//! case_fold_paths = true   # set false to keep on-disk case in keys
//!
//! [server]
//! bind = "127.0.0.1:7341"
//! ```

use std::path::{Path, PathBuf};

use code_snapshot_core::exclude::{ExcludeError, ExclusionMatcher, DEFAULT_EXCLUDES};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("no store location configured: set [db].path")]
    MissingStoreLocation,
    #[error("no ingestion root configured: set [ingest].root or pass --root")]
    MissingRoot,
    #[error("ingestion root does not exist or is not a directory: {}", .0.display())]
    RootNotADirectory(PathBuf),
    #[error(transparent)]
    Exclude(#[from] ExcludeError),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub ingest: IngestConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    db: Option<DbConfig>,
    #[serde(default)]
    ingest: IngestConfig,
    #[serde(default)]
    server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    #[serde(default)]
    pub root: Option<PathBuf>,
    #[serde(default = "default_exclude_globs")]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub extra_exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
    /// Lowercase stored and requested keys. On by default so `Src/Main.py`
    /// and `src/main.py` always name one entry.
    #[serde(default = "default_case_fold")]
    pub case_fold_paths: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            root: None,
            exclude_globs: default_exclude_globs(),
            extra_exclude_globs: Vec::new(),
            follow_symlinks: false,
            case_fold_paths: default_case_fold(),
        }
    }
}

fn default_case_fold() -> bool {
    true
}

fn default_exclude_globs() -> Vec<String> {
    DEFAULT_EXCLUDES.iter().map(|p| p.to_string()).collect()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7341".to_string()
}

impl Config {
    /// Config with defaults everywhere except the store location.
    pub fn minimal(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db: DbConfig {
                path: db_path.into(),
            },
            ingest: IngestConfig::default(),
            server: ServerConfig::default(),
        }
    }

    /// Compile the configured exclusion patterns.
    pub fn matcher(&self) -> Result<ExclusionMatcher, ConfigError> {
        let patterns = self
            .ingest
            .exclude_globs
            .iter()
            .chain(self.ingest.extra_exclude_globs.iter());
        Ok(ExclusionMatcher::new(patterns)?)
    }

    /// The ingestion root: `override_root` if given, else `[ingest].root`.
    pub fn ingest_root(&self, override_root: Option<&Path>) -> Result<PathBuf, ConfigError> {
        let root = override_root
            .map(Path::to_path_buf)
            .or_else(|| self.ingest.root.clone())
            .ok_or(ConfigError::MissingRoot)?;
        if !root.is_dir() {
            return Err(ConfigError::RootNotADirectory(root));
        }
        Ok(root)
    }
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let raw: RawConfig = toml::from_str(content)?;

    let db = match raw.db {
        Some(db) if !db.path.as_os_str().is_empty() => db,
        _ => return Err(ConfigError::MissingStoreLocation),
    };

    let config = Config {
        db,
        ingest: raw.ingest,
        server: raw.server,
    };

    // Fail at startup on a bad pattern rather than mid-walk.
    config.matcher()?;

    Ok(config)
}
