//! Unified error type for Part-DB.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Validation failed: {message}")]
    Validation { message: String },

    #[error("{entity} with ID {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Invalid amount: {amount}")]
    InvalidAmount { amount: f64 },

    #[error("Not enough stock: {available} available, {requested} requested")]
    InsufficientStock { available: f64, requested: f64 },

    #[error("Invalid attachment path: {path}")]
    InvalidPath { path: String },

    #[error("File extension '{extension}' is not allowed")]
    ForbiddenExtension { extension: String },

    #[error("Unknown permission operation: {permission}.{operation}")]
    UnknownPermission {
        permission: String,
        operation: String,
    },

    #[error("Permission denied: {permission}.{operation}")]
    PermissionDenied {
        permission: String,
        operation: String,
    },

    #[error("{entity} {id} did not exist at the requested timestamp")]
    NotExistingAtTimestamp { entity: &'static str, id: i64 },

    #[error("No undelete data found for {entity} {id}")]
    UndeleteDataMissing { entity: &'static str, id: i64 },

    #[error("Malformed log entry {id}: {message}")]
    MalformedLogEntry { id: i64, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
