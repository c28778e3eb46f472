//! Attachment commands - placeholder resolution and file maintenance.

use super::{CliContext, to_json};
use crate::{
    core::attachments::{AttachmentManager, AttachmentPathResolver, manager, submit},
    entities::Attachment,
    errors::{Error, Result},
};
use clap::Subcommand;
use sea_orm::EntityTrait;
use serde::Serialize;
use std::fmt::Write;
use tracing::{info, warn};

/// Attachment commands
#[derive(Subcommand, Debug)]
pub enum AttachmentCommands {
    /// Convert a placeholder path to a real path (or back with --reverse)
    Resolve {
        /// Path to convert
        path: String,
        /// Convert a real path to a placeholder path
        #[arg(long)]
        reverse: bool,
        /// Use the legacy %BASE%/data/media placeholder for media files
        #[arg(long, requires = "reverse")]
        old_version: bool,
    },

    /// List stored files no attachment refers to
    CleanUnused {
        /// Delete the files instead of listing them
        #[arg(long)]
        delete: bool,
    },

    /// Check that every stored attachment file exists
    Check,
}

#[derive(Debug, Serialize)]
struct FileStatus {
    id: i64,
    name: String,
    path: String,
    exists: bool,
    size: Option<String>,
}

/// Runs an attachment command.
pub async fn run(command: AttachmentCommands, ctx: &CliContext) -> Result<String> {
    let resolver = AttachmentPathResolver::from_config(&ctx.config);
    match command {
        AttachmentCommands::Resolve {
            path,
            reverse,
            old_version,
        } => {
            let converted = if reverse {
                resolver.real_path_to_placeholder(&path, old_version)
            } else {
                resolver.placeholder_to_real_path(&path)
            };
            converted.ok_or(Error::InvalidPath { path })
        }
        AttachmentCommands::CleanUnused { delete } => clean_unused(ctx, &resolver, delete).await,
        AttachmentCommands::Check => check(ctx, &AttachmentManager::new(resolver)).await,
    }
}

async fn clean_unused(ctx: &CliContext, resolver: &AttachmentPathResolver, delete: bool) -> Result<String> {
    let unused = submit::find_unused_files(&ctx.database, resolver).await?;
    if delete {
        for path in &unused {
            tokio::fs::remove_file(path).await?;
        }
        info!(count = unused.len(), "Deleted unused attachment files");
    }

    if ctx.json {
        return to_json(&unused);
    }
    let mut output = String::new();
    for path in &unused {
        let _ = writeln!(output, "{}", path.display());
    }
    let verb = if delete { "Deleted" } else { "Found" };
    let _ = write!(output, "{verb} {} unused files", unused.len());
    Ok(output)
}

async fn check(ctx: &CliContext, attachments: &AttachmentManager) -> Result<String> {
    let mut statuses = Vec::new();
    for attachment in Attachment::find().all(&ctx.database).await? {
        if manager::is_external(&attachment) {
            continue;
        }
        let exists = attachments.is_file_existing(&attachment).await;
        if !exists {
            warn!(id = attachment.id, path = %attachment.path, "Attachment file is missing");
        }
        statuses.push(FileStatus {
            id: attachment.id,
            size: attachments.human_file_size(&attachment).await,
            name: attachment.name,
            path: attachment.path,
            exists,
        });
    }

    if ctx.json {
        return to_json(&statuses);
    }
    let mut output = String::new();
    for status in &statuses {
        let state = if status.exists { "ok" } else { "MISSING" };
        let size = status.size.as_deref().unwrap_or("-");
        let _ = writeln!(output, "{:>6} {:<8} {:>8} {} ({})", status.id, state, size, status.name, status.path);
    }
    let missing = statuses.iter().filter(|s| !s.exists).count();
    let _ = write!(output, "{} files checked, {missing} missing", statuses.len());
    Ok(output)
}
