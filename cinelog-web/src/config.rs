//! Service configuration for cinelog-web
//!
//! Combines the command-line arguments with the bootstrap TOML and the
//! secret environment variables into one resolved `ServiceConfig`.

use cinelog_common::config::{
    resolve_catalog_path, resolve_data_folder, resolve_secret, TomlConfig, DEFAULT_GEMINI_MODELS,
};
use cinelog_common::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::info;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";

/// Session database file inside the data folder
pub const DATABASE_FILE: &str = "cinelog.db";

pub const SITE_PASSWORD_ENV: &str = "CINELOG_SITE_PASSWORD";
pub const TMDB_API_KEY_ENV: &str = "CINELOG_TMDB_API_KEY";
pub const GEMINI_API_KEY_ENV: &str = "CINELOG_GEMINI_API_KEY";
pub const DRIVE_TOKEN_ENV: &str = "CINELOG_DRIVE_TOKEN";

/// Command-line values that take priority over everything else
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub data_folder: Option<PathBuf>,
    pub catalog_file: Option<PathBuf>,
}

/// Cloud copy of the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveSettings {
    pub file_id: String,
    pub access_token: String,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind_address: String,
    pub port: u16,
    pub data_folder: PathBuf,
    pub catalog_path: PathBuf,
    pub database_path: PathBuf,
    pub site_password: String,
    pub tmdb_api_key: String,
    /// `None` disables image title extraction
    pub gemini_api_key: Option<String>,
    pub gemini_models: Vec<String>,
    /// `None` disables cloud sync
    pub drive: Option<DriveSettings>,
    pub log_level: String,
}

impl ServiceConfig {
    /// Resolve every setting; fails when a required secret is missing
    pub fn resolve(cli: &CliOverrides, toml_config: &TomlConfig) -> Result<Self> {
        let data_folder = resolve_data_folder(cli.data_folder.as_deref(), toml_config);
        let catalog_path =
            resolve_catalog_path(cli.catalog_file.as_deref(), &data_folder, toml_config);

        let site_password = resolve_secret(
            "Site password",
            SITE_PASSWORD_ENV,
            toml_config.site_password.as_deref(),
        )
        .ok_or_else(|| {
            Error::Config(format!(
                "Site password not configured. Set {} or site_password in the TOML config",
                SITE_PASSWORD_ENV
            ))
        })?;

        let tmdb_api_key = resolve_secret(
            "TMDb API key",
            TMDB_API_KEY_ENV,
            toml_config.tmdb_api_key.as_deref(),
        )
        .ok_or_else(|| {
            Error::Config(format!(
                "TMDb API key not configured. Set {} or tmdb_api_key in the TOML config",
                TMDB_API_KEY_ENV
            ))
        })?;

        let gemini_api_key = resolve_secret(
            "Gemini API key",
            GEMINI_API_KEY_ENV,
            toml_config.gemini_api_key.as_deref(),
        );
        if gemini_api_key.is_none() {
            info!("No Gemini API key configured, image title extraction disabled");
        }

        let gemini_models = toml_config
            .gemini_models
            .clone()
            .filter(|models| !models.is_empty())
            .unwrap_or_else(|| DEFAULT_GEMINI_MODELS.iter().map(|m| m.to_string()).collect());

        let drive = resolve_drive(toml_config);
        if drive.is_none() {
            info!("No Drive file configured, cloud sync disabled");
        }

        Ok(Self {
            bind_address: cli
                .bind_address
                .clone()
                .or_else(|| toml_config.bind_address.clone())
                .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            port: cli.port.or(toml_config.port).unwrap_or(DEFAULT_PORT),
            database_path: database_path(&data_folder),
            data_folder,
            catalog_path,
            site_password,
            tmdb_api_key,
            gemini_api_key,
            gemini_models,
            drive,
            log_level: toml_config.logging.level.clone(),
        })
    }

    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

fn database_path(data_folder: &Path) -> PathBuf {
    data_folder.join(DATABASE_FILE)
}

fn resolve_drive(toml_config: &TomlConfig) -> Option<DriveSettings> {
    let drive = toml_config.drive.as_ref()?;
    let file_id = drive.file_id.clone().filter(|id| !id.trim().is_empty())?;
    let access_token = resolve_secret(
        "Drive access token",
        DRIVE_TOKEN_ENV,
        drive.access_token.as_deref(),
    )?;

    Some(DriveSettings {
        file_id,
        access_token,
    })
}
