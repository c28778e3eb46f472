//! Time travel commands.

use super::{CliContext, parse_target, to_json};
use crate::{
    core::time_travel::{self, RevertedElement},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use std::fmt::Write;

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::Validation {
            message: format!("Invalid timestamp '{value}': {e}"),
        })
}

fn describe(element: &RevertedElement, depth: usize, output: &mut String) {
    let indent = "  ".repeat(depth);
    let _ = writeln!(output, "{indent}{} #{}", element.target, element.id);
    for (field, value) in &element.data {
        let _ = writeln!(output, "{indent}  {field}: {value}");
    }
    for (field, related) in &element.to_one {
        let _ = writeln!(output, "{indent}  [{field}]");
        describe(related, depth + 2, output);
    }
    for (field, members) in &element.to_many {
        let _ = writeln!(output, "{indent}  [{field}: {}]", members.len());
        for member in members {
            describe(member, depth + 2, output);
        }
    }
}

fn render(ctx: &CliContext, element: &RevertedElement) -> Result<String> {
    if ctx.json {
        return to_json(element);
    }
    let mut output = String::new();
    describe(element, 0, &mut output);
    Ok(output)
}

/// Shows an element as it was at `timestamp`.
pub async fn revert(ctx: &CliContext, target: &str, id: i64, timestamp: &str) -> Result<String> {
    let target = parse_target(target)?;
    let timestamp = parse_timestamp(timestamp)?;
    let element =
        time_travel::revert_to_timestamp(&ctx.database, &ctx.config.time_travel, target, id, timestamp).await?;
    render(ctx, &element)
}

/// Shows a deleted element rebuilt from its deletion entry.
pub async fn undelete(ctx: &CliContext, target: &str, id: i64) -> Result<String> {
    let target = parse_target(target)?;
    let element = time_travel::undelete(&ctx.database, target, id).await?;
    render(ctx, &element)
}
