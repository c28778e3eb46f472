//! Application settings loaded from `config.toml`.
//!
//! Every value has a default so a missing file yields a working configuration.
//! Individual values can be overridden through `PARTDB_*` environment
//! variables, which `.env` files can set via `dotenvy`.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Root directory relative paths are resolved against
    pub project_dir: PathBuf,
    /// Directory for public uploads (`%MEDIA%`)
    pub media_directory: PathBuf,
    /// Directory for uploads that must not be served publicly (`%SECURE%`)
    pub secure_directory: PathBuf,
    /// Directory of the built-in footprint pictures (`%FOOTPRINTS%`)
    pub footprints_directory: Option<PathBuf>,
    /// Directory of the built-in 3D models (`%FOOTPRINTS_3D%`)
    pub models_directory: Option<PathBuf>,
    /// File extensions that can never be uploaded
    pub upload_blacklist: Vec<String>,
    /// Event log settings
    pub logging: LoggingSettings,
    /// Time travel settings
    pub time_travel: TimeTravelSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            project_dir: PathBuf::from("."),
            media_directory: PathBuf::from("public/media"),
            secure_directory: PathBuf::from("uploads"),
            footprints_directory: Some(PathBuf::from("public/img/footprints")),
            models_directory: Some(PathBuf::from("public/models")),
            upload_blacklist: [
                "php", "phtml", "php3", "ph3", "php4", "ph4", "php5", "ph5", "phtm", "sh",
                "asp", "cgi", "py", "pl", "exe", "aspx", "js", "mjs", "jsp", "css", "jar",
                "html", "htm", "shtm", "shtml", "htaccess", "htpasswd", "",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            logging: LoggingSettings::default(),
            time_travel: TimeTravelSettings::default(),
        }
    }
}

/// Which events end up in the event log and how much data they carry
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Entries less severe than this PSR-3 level are dropped (7 keeps everything)
    pub min_level: i16,
    /// Entry type names that are never logged
    pub blacklist: Vec<String>,
    /// When not empty, only these entry type names are logged
    pub whitelist: Vec<String>,
    /// Record the names of the changed fields on edits
    pub save_changed_fields: bool,
    /// Record old field values on edits and deletions (required for time travel)
    pub save_old_data: bool,
    /// Record new field values on edits
    pub save_new_data: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            min_level: 7,
            blacklist: Vec::new(),
            whitelist: Vec::new(),
            save_changed_fields: true,
            save_old_data: true,
            save_new_data: true,
        }
    }
}

/// Limits of the time travel reconstruction
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimeTravelSettings {
    /// Collections with more elements than this are not reverted
    pub max_collection_size: usize,
}

impl Default for TimeTravelSettings {
    fn default() -> Self {
        Self {
            max_collection_size: 10,
        }
    }
}

impl AppConfig {
    /// Resolves a configured path against the project directory.
    #[must_use]
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_dir.join(path)
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var("PARTDB_PROJECT_DIR") {
            self.project_dir = PathBuf::from(value);
        }
        if let Ok(value) = std::env::var("PARTDB_MEDIA_DIRECTORY") {
            self.media_directory = PathBuf::from(value);
        }
        if let Ok(value) = std::env::var("PARTDB_SECURE_DIRECTORY") {
            self.secure_directory = PathBuf::from(value);
        }
        if let Ok(value) = std::env::var("PARTDB_FOOTPRINTS_DIRECTORY") {
            self.footprints_directory = Some(PathBuf::from(value));
        }
        if let Ok(value) = std::env::var("PARTDB_MODELS_DIRECTORY") {
            self.models_directory = Some(PathBuf::from(value));
        }
        if let Some(level) = std::env::var("PARTDB_LOG_MIN_LEVEL")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.logging.min_level = level;
        }
    }
}

/// Parses a configuration from TOML text.
///
/// # Errors
/// Returns an error if the TOML syntax is invalid or a value has the wrong type.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads the configuration from a TOML file and applies environment overrides.
///
/// A missing file is not an error; the defaults are used instead.
///
/// # Errors
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path = path.as_ref();
    let mut config = if path.exists() {
        debug!("Loading configuration from {:?}", path);
        let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("Failed to read config file {}: {e}", path.display()),
        })?;
        parse_config(&contents)?
    } else {
        info!("No config file at {:?}, using defaults", path);
        AppConfig::default()
    };

    config.apply_env_overrides();
    Ok(config)
}
