/// Database configuration and connection management
pub mod database;

/// Permission structure (permissions, operations, dependencies) from the embedded permissions.toml
pub mod permissions;

/// Application settings loaded from config.toml and `PARTDB_*` environment variables
pub mod settings;

pub use settings::{AppConfig, LoggingSettings, TimeTravelSettings, load_config};
