//! Configuration loading and data folder resolution
//!
//! Bootstrap settings come from, in priority order:
//! 1. Command-line argument (highest priority, handled by each binary)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing or unreadable TOML file never prevents startup: a warning is
//! logged and defaults are used.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit TOML config file
pub const CONFIG_PATH_ENV: &str = "CINELOG_CONFIG";

/// Environment variable overriding the data folder
pub const DATA_FOLDER_ENV: &str = "CINELOG_DATA_FOLDER";

/// Default catalog file name inside the data folder
pub const DEFAULT_CATALOG_FILE: &str = "Movies.tsv";

/// Image extraction models, tried in order
pub const DEFAULT_GEMINI_MODELS: [&str; 2] = ["gemini-2.5-flash", "gemini-2.5-flash-lite"];

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Interface to bind (default 0.0.0.0)
    #[serde(default)]
    pub bind_address: Option<String>,

    /// HTTP port (default 5000)
    #[serde(default)]
    pub port: Option<u16>,

    /// Folder holding the catalog file and the session database
    #[serde(default)]
    pub data_folder: Option<PathBuf>,

    /// Catalog file, relative paths resolve inside the data folder
    #[serde(default)]
    pub catalog_file: Option<PathBuf>,

    /// Password for the login page
    #[serde(default)]
    pub site_password: Option<String>,

    /// TMDb v3 API key
    #[serde(default)]
    pub tmdb_api_key: Option<String>,

    /// Gemini API key (image title extraction)
    #[serde(default)]
    pub gemini_api_key: Option<String>,

    /// Gemini models in fallback order
    #[serde(default)]
    pub gemini_models: Option<Vec<String>>,

    /// Google Drive copy of the catalog
    #[serde(default)]
    pub drive: Option<DriveConfig>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Google Drive file holding the cloud copy of the catalog
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriveConfig {
    #[serde(default)]
    pub file_id: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Default TOML location: `<config_dir>/cinelog/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("cinelog").join("config.toml"))
}

/// OS-dependent default data folder
pub fn default_data_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("cinelog"))
        .unwrap_or_else(|| PathBuf::from("./cinelog_data"))
}

/// Read and parse a TOML config file
pub fn read_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
    toml::from_str(&content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
}

/// Load the bootstrap TOML with graceful degradation
///
/// `explicit` (from the command line) wins over `CINELOG_CONFIG`, which wins
/// over the platform default location.
pub fn load_toml_config(explicit: Option<&Path>) -> TomlConfig {
    let path = explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from))
        .or_else(default_config_path);

    let Some(path) = path else {
        warn!("Could not determine config directory, using defaults");
        return TomlConfig::default();
    };

    if !path.exists() {
        warn!(path = %path.display(), "Config file not found, using defaults");
        return TomlConfig::default();
    }

    match read_toml_config(&path) {
        Ok(config) => {
            info!(path = %path.display(), "Loaded config file");
            config
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Config file unusable, using defaults");
            TomlConfig::default()
        }
    }
}

/// Validate a secret value (non-empty, non-whitespace)
pub fn is_valid_secret(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Resolve a secret from environment then TOML
///
/// Warns when both sources carry a usable value, since the environment
/// silently shadows the file.
pub fn resolve_secret(label: &str, env_var: &str, toml_value: Option<&str>) -> Option<String> {
    let env_value = std::env::var(env_var).ok().filter(|v| is_valid_secret(v));
    let toml_value = toml_value.filter(|v| is_valid_secret(v));

    if env_value.is_some() && toml_value.is_some() {
        warn!(
            "{} found in both {} and TOML config. Using environment variable.",
            label, env_var
        );
    }

    if let Some(value) = env_value {
        info!("{} loaded from environment variable", label);
        return Some(value);
    }

    toml_value.map(|value| {
        info!("{} loaded from TOML config", label);
        value.to_string()
    })
}

/// Resolve the data folder: CLI → ENV → TOML → OS default
pub fn resolve_data_folder(cli_arg: Option<&Path>, toml_config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var(DATA_FOLDER_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }
    if let Some(path) = &toml_config.data_folder {
        return path.clone();
    }
    default_data_folder()
}

/// Resolve the catalog file path relative to the data folder
pub fn resolve_catalog_path(
    cli_arg: Option<&Path>,
    data_folder: &Path,
    toml_config: &TomlConfig,
) -> PathBuf {
    let path = cli_arg
        .map(Path::to_path_buf)
        .or_else(|| toml_config.catalog_file.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CATALOG_FILE));

    if path.is_absolute() {
        path
    } else {
        data_folder.join(path)
    }
}
