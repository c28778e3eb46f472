//! User commands - permission overview, editing and presets.

use super::{CliContext, to_json};
use crate::{
    core::{
        log::{LogContext, TargetType},
        permissions::{PermissionData, PermissionManager, PermissionPreset, manager},
    },
    entities::user,
    errors::{Error, Result},
};
use clap::Subcommand;
use sea_orm::TransactionTrait;
use serde::Serialize;
use std::fmt::Write;
use tracing::info;

/// User commands
#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// Show the effective permissions of a user
    Permissions {
        /// User ID
        id: i64,
    },

    /// Set one permission operation of a user
    SetPermission {
        /// User ID
        id: i64,
        /// Operation as permission.operation (e.g. parts.edit)
        operation: String,
        /// allow, deny or inherit
        value: String,
    },

    /// Replace the permissions of a user with a preset
    Preset {
        /// User ID
        id: i64,
        /// Preset name (all_inherit, all_forbid, all_allow, read_only, editor, admin)
        preset: String,
    },

    /// Check whether a user may perform an operation
    Check {
        /// User ID
        id: i64,
        /// Operation as permission.operation (e.g. parts.edit)
        operation: String,
    },
}

#[derive(Debug, Serialize)]
struct OperationView {
    permission: String,
    operation: String,
    own: Option<bool>,
    effective: bool,
}

fn split_operation(value: &str) -> Result<(&str, &str)> {
    value.split_once('.').ok_or_else(|| Error::Validation {
        message: format!("Expected permission.operation, got '{value}'"),
    })
}

fn parse_value(value: &str) -> Result<Option<bool>> {
    match value {
        "allow" => Ok(Some(true)),
        "deny" | "forbid" => Ok(Some(false)),
        "inherit" => Ok(None),
        other => Err(Error::Validation {
            message: format!("Unknown permission value '{other}'"),
        }),
    }
}

const fn value_name(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "allow",
        Some(false) => "deny",
        None => "inherit",
    }
}

/// Runs a user command.
pub async fn run(command: UserCommands, ctx: &CliContext) -> Result<String> {
    let permissions = PermissionManager::builtin()?;
    match command {
        UserCommands::Permissions { id } => show_permissions(ctx, &permissions, id).await,
        UserCommands::SetPermission { id, operation, value } => {
            let (permission, operation) = split_operation(&operation)?;
            let value = parse_value(&value)?;
            update_permissions(ctx, id, |data| {
                permissions.set_permission(data, permission, operation, value)?;
                permissions.ensure_correct_set_operations(data);
                Ok(())
            })
            .await?;
            Ok(format!("Set {permission}.{operation} to {}", value_name(value)))
        }
        UserCommands::Preset { id, preset } => {
            let preset = PermissionPreset::from_name(&preset).ok_or_else(|| Error::Validation {
                message: format!("Unknown preset '{preset}'"),
            })?;
            update_permissions(ctx, id, |data| {
                permissions.apply_preset(data, preset);
                Ok(())
            })
            .await?;
            Ok(format!("Applied preset {}", preset.name()))
        }
        UserCommands::Check { id, operation } => {
            let (permission, operation) = split_operation(&operation)?;
            let user = manager::get_user(&ctx.database, id).await?;
            manager::require_permission(&ctx.database, &permissions, &user, permission, operation).await?;
            Ok(format!("{} may {permission}.{operation}", user.name))
        }
    }
}

async fn show_permissions(ctx: &CliContext, permissions: &PermissionManager, id: i64) -> Result<String> {
    let user = manager::get_user(&ctx.database, id).await?;
    let chain = manager::permission_chain(&ctx.database, &user).await?;
    let own = chain.first().cloned().unwrap_or_default();

    let mut views = Vec::new();
    for permission in &permissions.structure().permissions {
        for operation in &permission.operations {
            views.push(OperationView {
                permission: permission.name.clone(),
                operation: operation.name.clone(),
                own: permissions.dont_inherit(&own, &permission.name, &operation.name)?,
                effective: permissions.is_allowed(&chain, &permission.name, &operation.name)?,
            });
        }
    }

    if ctx.json {
        return to_json(&views);
    }
    let mut output = String::new();
    let _ = writeln!(output, "Permissions of {}", user.name);
    for view in &views {
        let effective = if view.effective { "allowed" } else { "denied" };
        let _ = writeln!(
            output,
            "  {:<36} {:<8} {}",
            format!("{}.{}", view.permission, view.operation),
            value_name(view.own),
            effective
        );
    }
    Ok(output)
}

/// Loads the user's permission data, applies `change` and stores the result
/// together with an edit log entry.
async fn update_permissions<F>(ctx: &CliContext, id: i64, change: F) -> Result<user::Model>
where
    F: FnOnce(&mut PermissionData) -> Result<()>,
{
    let txn = ctx.database.begin().await?;
    let old = manager::get_user(&txn, id).await?;
    let mut data = PermissionData::from_json(&old.permissions)?;
    change(&mut data)?;

    let updated = manager::save_user_permissions(&txn, old.clone(), &data).await?;
    ctx.logger
        .log_edited(&txn, &LogContext::cli(), TargetType::User, id, &old, &updated, None)
        .await?;
    txn.commit().await?;

    info!(user = %updated.name, "Permissions updated");
    Ok(updated)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::cli::tests::test_context;
    use crate::core::log::{LogEntryType, repository};
    use crate::test_utils::{create_test_group, create_test_user};

    #[tokio::test]
    async fn test_set_permission_and_check() -> Result<()> {
        let ctx = test_context().await?;
        let group = create_test_group(&ctx.database, "Lab", None).await?;
        let alice = create_test_user(&ctx.database, "alice", Some(group.id)).await?;

        let check = UserCommands::Check {
            id: alice.id,
            operation: "parts.edit".into(),
        };
        assert!(matches!(run(check, &ctx).await, Err(Error::PermissionDenied { .. })));

        let set = UserCommands::SetPermission {
            id: alice.id,
            operation: "parts.edit".into(),
            value: "allow".into(),
        };
        assert_eq!(run(set, &ctx).await?, "Set parts.edit to allow");

        // edit implies read
        let check = UserCommands::Check {
            id: alice.id,
            operation: "parts.read".into(),
        };
        assert_eq!(run(check, &ctx).await?, "alice may parts.read");

        let history = repository::element_history(&ctx.database, TargetType::User, alice.id, None, 0).await?;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].entry_type, LogEntryType::ElementEdited as i16);
        Ok(())
    }

    #[tokio::test]
    async fn test_preset_and_overview() -> Result<()> {
        let mut ctx = test_context().await?;
        let bob = create_test_user(&ctx.database, "bob", None).await?;

        let preset = UserCommands::Preset {
            id: bob.id,
            preset: "read_only".into(),
        };
        assert_eq!(run(preset, &ctx).await?, "Applied preset read_only");

        ctx.json = true;
        let output = run(UserCommands::Permissions { id: bob.id }, &ctx).await?;
        let views: Vec<serde_json::Value> = serde_json::from_str(&output).unwrap();
        let find = |perm: &str, op: &str| {
            views
                .iter()
                .find(|v| v["permission"] == perm && v["operation"] == op)
                .cloned()
                .unwrap()
        };
        assert_eq!(find("parts", "read")["effective"], true);
        assert_eq!(find("parts", "edit")["effective"], false);
        assert_eq!(find("parts", "edit")["own"], false);

        let bad = UserCommands::SetPermission {
            id: bob.id,
            operation: "parts".into(),
            value: "allow".into(),
        };
        assert!(matches!(run(bad, &ctx).await, Err(Error::Validation { .. })));
        Ok(())
    }
}
