//! Runtime settings
//!
//! Read from `GEOLAYERS_*` environment variables; command-line flags take
//! precedence over anything set here.

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub const ENV_PROJECT: &str = "GEOLAYERS_PROJECT";
pub const ENV_EXPORT_FORMAT: &str = "GEOLAYERS_EXPORT_FORMAT";
pub const ENV_LOG: &str = "GEOLAYERS_LOG";

/// Export format used when none is given
pub const DEFAULT_EXPORT_FORMAT: &str = "GeoJSON";
/// Log filter used when none is given
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Project file operated on by the CLI
    pub project_path: Option<PathBuf>,
    /// Driver name for `export` when `--format` is omitted
    pub export_format: String,
    /// `EnvFilter` directive for logging
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            project_path: None,
            export_format: DEFAULT_EXPORT_FORMAT.to_string(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Settings {
    /// Settings from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Settings from any key lookup; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            project_path: get(ENV_PROJECT).map(PathBuf::from),
            export_format: get(ENV_EXPORT_FORMAT).unwrap_or(defaults.export_format),
            log_filter: get(ENV_LOG).unwrap_or(defaults.log_filter),
        }
    }
}
