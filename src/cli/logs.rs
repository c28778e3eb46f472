//! Event log commands - listing, element history and pruning.

use super::{CliContext, parse_target, to_json};
use crate::{
    core::log::{
        LogEntryType, LogLevel, TargetType, formatter,
        repository::{self, LogFilter},
    },
    entities::log_entry,
    errors::{Error, Result},
};
use chrono::{Duration, Utc};
use clap::Subcommand;
use serde::Serialize;
use std::fmt::Write;
use tracing::info;

/// Event log commands
#[derive(Subcommand, Debug)]
pub enum LogsCommands {
    /// List log entries, newest first
    Show {
        /// Only entries of this type (e.g. element_edited)
        #[arg(long = "type")]
        entry_type: Option<String>,
        /// Only entries at least this severe (e.g. warning)
        #[arg(long)]
        level: Option<String>,
        /// Only entries caused by this user
        #[arg(long)]
        user: Option<String>,
        /// Only entries about this element kind
        #[arg(long)]
        target: Option<String>,
        /// Maximum number of entries
        #[arg(long, default_value_t = 50)]
        limit: u64,
        /// Number of entries to skip
        #[arg(long, default_value_t = 0)]
        offset: u64,
    },

    /// Show the history of one element
    History {
        /// Element kind (e.g. part, category)
        target: String,
        /// Element ID
        id: i64,
        /// Maximum number of entries
        #[arg(long)]
        limit: Option<u64>,
        /// Also print the changed field values
        #[arg(long)]
        details: bool,
    },

    /// Delete entries older than the given number of days
    Prune {
        /// Age in days
        #[arg(long)]
        days: i64,
    },
}

/// One entry in JSON output
#[derive(Debug, Serialize)]
struct EntryView {
    id: i64,
    timestamp: String,
    level: String,
    entry_type: String,
    target: String,
    target_id: i64,
    username: String,
    extra: String,
}

fn entry_view(entry: &log_entry::Model) -> Result<EntryView> {
    let event = formatter::decode_event(entry)?;
    let level = LogLevel::from_i16(entry.level).map_or("unknown", LogLevel::as_str);
    let target = TargetType::from_i16(entry.target_type).map_or("unknown", TargetType::key);
    Ok(EntryView {
        id: entry.id,
        timestamp: entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
        level: level.to_string(),
        entry_type: event.entry_type().name().to_string(),
        target: target.to_string(),
        target_id: entry.target_id,
        username: entry.username.clone(),
        extra: formatter::format_extra(&event),
    })
}

fn render(ctx: &CliContext, entries: &[log_entry::Model], details: bool) -> Result<String> {
    if ctx.json {
        let views = entries.iter().map(entry_view).collect::<Result<Vec<_>>>()?;
        return to_json(&views);
    }
    if entries.is_empty() {
        return Ok("No log entries found".to_string());
    }

    let mut output = String::new();
    for entry in entries {
        let _ = writeln!(output, "{}", formatter::format_entry_line(entry)?);
        if details {
            let event = formatter::decode_event(entry)?;
            for change in formatter::format_field_changes(&event) {
                let _ = writeln!(
                    output,
                    "    {}: {} → {}",
                    change.field,
                    change.old.as_deref().unwrap_or("-"),
                    change.new.as_deref().unwrap_or("-")
                );
                if let Some(diff) = change.diff {
                    let _ = writeln!(output, "      {}", diff.to_plain());
                }
            }
        }
    }
    Ok(output)
}

fn parse_entry_type(name: &str) -> Result<LogEntryType> {
    LogEntryType::from_name(name).ok_or_else(|| Error::Validation {
        message: format!("Unknown log entry type '{name}'"),
    })
}

fn parse_level(name: &str) -> Result<LogLevel> {
    LogLevel::from_name(name).ok_or_else(|| Error::Validation {
        message: format!("Unknown log level '{name}'"),
    })
}

/// Runs an event log command.
pub async fn run(command: LogsCommands, ctx: &CliContext) -> Result<String> {
    match command {
        LogsCommands::Show {
            entry_type,
            level,
            user,
            target,
            limit,
            offset,
        } => {
            let filter = LogFilter {
                entry_type: entry_type.as_deref().map(parse_entry_type).transpose()?,
                min_level: level.as_deref().map(parse_level).transpose()?,
                username: user,
                target_type: target.as_deref().map(parse_target).transpose()?,
                since: None,
                limit: Some(limit),
                offset,
            };
            let entries = repository::list_entries(&ctx.database, &filter).await?;
            render(ctx, &entries, false)
        }
        LogsCommands::History {
            target,
            id,
            limit,
            details,
        } => {
            let target = parse_target(&target)?;
            let entries = repository::element_history(&ctx.database, target, id, limit, 0).await?;
            render(ctx, &entries, details)
        }
        LogsCommands::Prune { days } => {
            if days < 0 {
                return Err(Error::Validation {
                    message: "Age must not be negative".to_string(),
                });
            }
            let removed = repository::delete_older_than(&ctx.database, Utc::now() - Duration::days(days)).await?;
            info!(removed, days, "Pruned event log");
            Ok(format!("Deleted {removed} log entries"))
        }
    }
}
