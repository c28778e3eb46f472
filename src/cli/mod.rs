//! Command line layer - argument definitions and command handlers.
//!
//! Handlers call into [`crate::core`] and return the text to print, so they can
//! be tested without capturing stdout.

/// Attachment path and file maintenance
pub mod attachments;
/// Event log listing and element history
pub mod logs;
/// Part overview with stock and prices
pub mod parts;
/// Reverting and undeleting elements from the event log
pub mod time_travel;
/// Category and storage location trees
pub mod tree;
/// User permission overview and editing
pub mod users;

use crate::{
    config::AppConfig,
    core::log::{EventLogger, TargetType},
    errors::{Error, Result},
};
use clap::{Parser, Subcommand};
use sea_orm::DatabaseConnection;
use std::path::PathBuf;

/// Part-DB maintenance tool
#[derive(Parser, Debug)]
#[command(name = "partdb")]
#[command(version)]
#[command(about = "Maintenance tool for the Part-DB inventory database", long_about = None)]
pub struct Cli {
    /// Path of the configuration file
    #[arg(long, short = 'c', global = true, env = "PARTDB_CONFIG", default_value = "config.toml")]
    pub config: PathBuf,

    /// Print machine readable JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create all database tables
    Init,

    /// Inspect the event log
    Logs {
        #[command(subcommand)]
        action: logs::LogsCommands,
    },

    /// Show an element as it was at a past instant
    TimeTravel {
        /// Element kind (e.g. part, category, part_lot)
        target: String,
        /// Element ID
        id: i64,
        /// Instant in RFC 3339 format (e.g. 2024-05-01T12:00:00Z)
        timestamp: String,
    },

    /// Rebuild a deleted element from its deletion entry
    Undelete {
        /// Element kind (e.g. part, category, part_lot)
        target: String,
        /// Element ID
        id: i64,
    },

    /// Attachment file maintenance
    Attachments {
        #[command(subcommand)]
        action: attachments::AttachmentCommands,
    },

    /// Show a part with its stock and prices
    Part {
        /// Part ID
        id: i64,
    },

    /// User management
    Users {
        #[command(subcommand)]
        action: users::UserCommands,
    },

    /// Print a structural tree
    Tree {
        /// Which tree to print
        #[arg(value_enum)]
        kind: tree::TreeKind,
    },
}

/// Shared state for all command handlers
pub struct CliContext {
    /// Database connection for all database operations
    pub database: DatabaseConnection,
    /// Loaded application configuration
    pub config: AppConfig,
    /// Logger for changes made from the command line
    pub logger: EventLogger,
    /// Whether output should be JSON
    pub json: bool,
}

impl CliContext {
    #[must_use]
    pub fn new(database: DatabaseConnection, config: AppConfig, json: bool) -> Self {
        let logger = EventLogger::new(config.logging.clone());
        Self {
            database,
            config,
            logger,
            json,
        }
    }
}

/// Parses an element kind given on the command line.
///
/// # Errors
/// Returns `Error::Validation` for unknown kinds.
pub fn parse_target(key: &str) -> Result<TargetType> {
    TargetType::from_key(key)
        .filter(|t| *t != TargetType::None)
        .ok_or_else(|| Error::Validation {
            message: format!("Unknown element kind '{key}'"),
        })
}

/// Serializes a value for `--json` output.
pub(crate) fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Runs a parsed command and returns its output.
pub async fn run(command: Commands, ctx: &CliContext) -> Result<String> {
    match command {
        Commands::Init => {
            crate::config::database::create_tables(&ctx.database).await?;
            Ok("Database initialized".to_string())
        }
        Commands::Logs { action } => logs::run(action, ctx).await,
        Commands::TimeTravel {
            target,
            id,
            timestamp,
        } => time_travel::revert(ctx, &target, id, &timestamp).await,
        Commands::Undelete { target, id } => time_travel::undelete(ctx, &target, id).await,
        Commands::Attachments { action } => attachments::run(action, ctx).await,
        Commands::Part { id } => parts::show(ctx, id).await,
        Commands::Users { action } => users::run(action, ctx).await,
        Commands::Tree { kind } => tree::show(ctx, kind).await,
    }
}
