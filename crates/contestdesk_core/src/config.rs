//! Runtime configuration for store location and logging.
//!
//! # Responsibility
//! - Resolve database path, log level and log directory from explicit
//!   overrides, falling back to per-user platform directories.
//! - Normalize and validate values before they reach `db` or `logging`.
//!
//! # Invariants
//! - `log_level` is one of `trace|debug|info|warn|error`.
//! - `log_dir` is absolute.

use directories::ProjectDirs;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const DB_FILE_NAME: &str = "contestdesk.sqlite3";
const LOG_DIR_NAME: &str = "logs";

#[derive(Debug)]
pub enum ConfigError {
    /// Log level is not one of the supported names.
    InvalidLogLevel(String),
    /// Log directory is relative or blank.
    InvalidLogDir(PathBuf),
    /// No override was given and the platform has no per-user data directory.
    NoDefaultLocation,
    /// A required directory could not be created.
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLogLevel(value) => write!(
                f,
                "unsupported log level `{value}`; expected trace|debug|info|warn|error"
            ),
            Self::InvalidLogDir(path) => write!(
                f,
                "log directory must be an absolute path, got `{}`",
                path.display()
            ),
            Self::NoDefaultLocation => write!(
                f,
                "no per-user data directory available; pass an explicit database path and log directory"
            ),
            Self::CreateDir { path, source } => {
                write!(f, "failed to create directory `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CreateDir { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Caller-supplied values that take precedence over defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub db_path: Option<PathBuf>,
    pub log_level: Option<String>,
    pub log_dir: Option<PathBuf>,
}

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub log_level: &'static str,
    pub log_dir: PathBuf,
}

impl AppConfig {
    /// Resolves overrides against platform defaults.
    pub fn resolve(overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        let dirs = ProjectDirs::from("org", "contestdesk", "contestdesk");
        Self::resolve_with_defaults(
            overrides,
            dirs.as_ref().map(|dirs| dirs.data_dir()),
            crate::logging::default_log_level(),
        )
    }

    fn resolve_with_defaults(
        overrides: ConfigOverrides,
        data_dir: Option<&Path>,
        default_level: &'static str,
    ) -> Result<Self, ConfigError> {
        let db_path = match overrides.db_path {
            Some(path) => path,
            None => data_dir
                .ok_or(ConfigError::NoDefaultLocation)?
                .join(DB_FILE_NAME),
        };

        let log_level = match overrides.log_level {
            Some(level) => normalize_level(&level)?,
            None => default_level,
        };

        let log_dir = match overrides.log_dir {
            Some(path) => path,
            None => data_dir
                .ok_or(ConfigError::NoDefaultLocation)?
                .join(LOG_DIR_NAME),
        };
        if log_dir.as_os_str().is_empty() || !log_dir.is_absolute() {
            return Err(ConfigError::InvalidLogDir(log_dir));
        }

        Ok(Self {
            db_path,
            log_level,
            log_dir,
        })
    }

    /// Creates the database parent directory and the log directory.
    pub fn ensure_dirs(&self) -> Result<(), ConfigError> {
        let db_parent = self
            .db_path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty());
        for dir in db_parent.into_iter().chain([self.log_dir.as_path()]) {
            std::fs::create_dir_all(dir).map_err(|source| ConfigError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        Ok(())
    }
}

/// Maps user input onto a canonical log level name.
pub fn normalize_level(level: &str) -> Result<&'static str, ConfigError> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        other => Err(ConfigError::InvalidLogLevel(other.to_string())),
    }
}
