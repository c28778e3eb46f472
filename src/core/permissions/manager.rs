//! Permission business logic - resolving, setting and validating permissions.
//!
//! A user's effective permission is looked up along the chain user → group →
//! parent groups; the first value that is not "inherit" wins. Operations that
//! still inherit at the end of the chain are denied.

use super::data::PermissionData;
use crate::{
    config::permissions::PermissionStructure,
    entities::{Group, User, group, user},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, Set};
use std::collections::HashSet;
use tracing::{debug, instrument};

/// Predefined permission sets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionPreset {
    AllInherit,
    AllForbid,
    AllAllow,
    ReadOnly,
    Editor,
    Admin,
}

impl PermissionPreset {
    pub const ALL: [Self; 6] = [
        Self::AllInherit,
        Self::AllForbid,
        Self::AllAllow,
        Self::ReadOnly,
        Self::Editor,
        Self::Admin,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::AllInherit => "all_inherit",
            Self::AllForbid => "all_forbid",
            Self::AllAllow => "all_allow",
            Self::ReadOnly => "read_only",
            Self::Editor => "editor",
            Self::Admin => "admin",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

/// Permissions of the data group an editor may not use
const EDITOR_EXCLUDED_OPERATIONS: &[&str] = &["revert_element", "import"];

/// Resolves and modifies permission data according to a permission structure
#[derive(Debug, Clone)]
pub struct PermissionManager {
    structure: PermissionStructure,
}

impl PermissionManager {
    #[must_use]
    pub const fn new(structure: PermissionStructure) -> Self {
        Self { structure }
    }

    /// Manager for the structure compiled into the binary.
    ///
    /// # Errors
    /// Returns an error if the embedded structure is malformed.
    pub fn builtin() -> Result<Self> {
        Ok(Self::new(PermissionStructure::builtin()?))
    }

    #[must_use]
    pub const fn structure(&self) -> &PermissionStructure {
        &self.structure
    }

    #[must_use]
    pub fn is_valid_operation(&self, permission: &str, operation: &str) -> bool {
        self.structure.is_valid_operation(permission, operation)
    }

    fn check_operation(&self, permission: &str, operation: &str) -> Result<()> {
        if self.is_valid_operation(permission, operation) {
            Ok(())
        } else {
            Err(Error::UnknownPermission {
                permission: permission.to_string(),
                operation: operation.to_string(),
            })
        }
    }

    /// Value set directly on one holder, without inheritance.
    ///
    /// # Errors
    /// Returns `Error::UnknownPermission` for operations not in the structure.
    pub fn dont_inherit(&self, data: &PermissionData, permission: &str, operation: &str) -> Result<Option<bool>> {
        self.check_operation(permission, operation)?;
        Ok(data.get_permission_value(permission, operation))
    }

    /// First non-inherit value along the chain (user first, root group last).
    ///
    /// # Errors
    /// Returns `Error::UnknownPermission` for operations not in the structure.
    pub fn inherit(&self, chain: &[PermissionData], permission: &str, operation: &str) -> Result<Option<bool>> {
        self.check_operation(permission, operation)?;
        Ok(chain
            .iter()
            .find_map(|data| data.get_permission_value(permission, operation)))
    }

    /// Whether the chain grants an operation. Operations inheriting all the
    /// way up are denied.
    ///
    /// # Errors
    /// Returns `Error::UnknownPermission` for operations not in the structure.
    pub fn is_allowed(&self, chain: &[PermissionData], permission: &str, operation: &str) -> Result<bool> {
        Ok(self.inherit(chain, permission, operation)? == Some(true))
    }

    /// Sets one operation. Call [`Self::ensure_correct_set_operations`]
    /// afterwards to grant dependent operations.
    ///
    /// # Errors
    /// Returns `Error::UnknownPermission` for operations not in the structure.
    pub fn set_permission(
        &self,
        data: &mut PermissionData,
        permission: &str,
        operation: &str,
        value: Option<bool>,
    ) -> Result<()> {
        self.check_operation(permission, operation)?;
        data.set_permission_value(permission, operation, value);
        Ok(())
    }

    /// Sets every operation of one permission.
    ///
    /// # Errors
    /// Returns `Error::UnknownPermission` if the permission does not exist.
    pub fn set_all_operations_of_permission(
        &self,
        data: &mut PermissionData,
        permission: &str,
        value: Option<bool>,
    ) -> Result<()> {
        let definition = self
            .structure
            .permission(permission)
            .ok_or_else(|| Error::UnknownPermission {
                permission: permission.to_string(),
                operation: "*".to_string(),
            })?;
        for operation in &definition.operations {
            data.set_permission_value(permission, &operation.name, value);
        }
        Ok(())
    }

    /// Sets every operation of every permission.
    pub fn set_all_permissions(&self, data: &mut PermissionData, value: Option<bool>) {
        for permission in &self.structure.permissions {
            for operation in &permission.operations {
                data.set_permission_value(&permission.name, &operation.name, value);
            }
        }
    }

    /// Grants the `also_set` operations of every allowed operation, repeating
    /// until nothing changes. Returns whether anything was changed.
    pub fn ensure_correct_set_operations(&self, data: &mut PermissionData) -> bool {
        let mut changed_any = false;
        loop {
            let mut changed = false;
            for permission in &self.structure.permissions {
                for operation in &permission.operations {
                    if operation.also_set.is_empty()
                        || data.get_permission_value(&permission.name, &operation.name) != Some(true)
                    {
                        continue;
                    }
                    for also in &operation.also_set {
                        let (perm, op) = also
                            .split_once('.')
                            .unwrap_or((permission.name.as_str(), also.as_str()));
                        if data.get_permission_value(perm, op) != Some(true) {
                            data.set_permission_value(perm, op, Some(true));
                            changed = true;
                        }
                    }
                }
            }
            if !changed {
                break;
            }
            changed_any = true;
        }
        changed_any
    }

    /// Replaces the data with a preset.
    pub fn apply_preset(&self, data: &mut PermissionData, preset: PermissionPreset) {
        match preset {
            PermissionPreset::AllInherit => self.set_all_permissions(data, None),
            PermissionPreset::AllForbid => self.set_all_permissions(data, Some(false)),
            PermissionPreset::AllAllow | PermissionPreset::Admin => {
                self.set_all_permissions(data, Some(true));
            }
            PermissionPreset::ReadOnly => self.read_only(data),
            PermissionPreset::Editor => {
                self.read_only(data);
                for permission in self.structure.permissions.iter().filter(|p| p.group == "data") {
                    for operation in &permission.operations {
                        if !EDITOR_EXCLUDED_OPERATIONS.contains(&operation.name.as_str()) {
                            data.set_permission_value(&permission.name, &operation.name, Some(true));
                        }
                    }
                }
                for op in ["edit_infos", "show_permissions", "show_logs"] {
                    data.set_permission_value("self", op, Some(true));
                }
            }
        }
        self.ensure_correct_set_operations(data);
    }

    fn read_only(&self, data: &mut PermissionData) {
        self.set_all_permissions(data, Some(false));
        for permission in self.structure.permissions.iter().filter(|p| p.group == "data") {
            for operation in &permission.operations {
                if matches!(operation.name.as_str(), "read" | "list_attachments" | "show_history") {
                    data.set_permission_value(&permission.name, &operation.name, Some(true));
                }
            }
        }
        data.set_permission_value("self", "show_permissions", Some(true));
    }
}

/// Loads the permission chain of a user: the user's own data followed by its
/// group and the group's ancestors.
#[instrument(skip(db, user), fields(user = %user.name))]
pub async fn permission_chain<C: ConnectionTrait>(db: &C, user: &user::Model) -> Result<Vec<PermissionData>> {
    let mut chain = vec![PermissionData::from_json(&user.permissions)?];

    let mut visited = HashSet::new();
    let mut next = user.group_id;
    while let Some(group_id) = next {
        if !visited.insert(group_id) {
            debug!(group_id, "Group cycle detected");
            break;
        }
        let group = Group::find_by_id(group_id)
            .one(db)
            .await?
            .ok_or(Error::NotFound {
                entity: "Group",
                id: group_id,
            })?;
        chain.push(PermissionData::from_json(&group.permissions)?);
        next = group.parent_id;
    }

    Ok(chain)
}

/// Checks whether a user may perform an operation.
pub async fn is_user_allowed<C: ConnectionTrait>(
    db: &C,
    manager: &PermissionManager,
    user: &user::Model,
    permission: &str,
    operation: &str,
) -> Result<bool> {
    let chain = permission_chain(db, user).await?;
    manager.is_allowed(&chain, permission, operation)
}

/// Fails with `Error::PermissionDenied` unless the user may perform the operation.
pub async fn require_permission<C: ConnectionTrait>(
    db: &C,
    manager: &PermissionManager,
    user: &user::Model,
    permission: &str,
    operation: &str,
) -> Result<()> {
    if is_user_allowed(db, manager, user, permission, operation).await? {
        Ok(())
    } else {
        Err(Error::PermissionDenied {
            permission: permission.to_string(),
            operation: operation.to_string(),
        })
    }
}

/// Finds a user by ID.
pub async fn get_user<C: ConnectionTrait>(db: &C, id: i64) -> Result<user::Model> {
    User::find_by_id(id)
        .one(db)
        .await?
        .ok_or(Error::NotFound { entity: "User", id })
}

/// Stores new permission data on a user.
pub async fn save_user_permissions<C: ConnectionTrait>(
    db: &C,
    user: user::Model,
    data: &PermissionData,
) -> Result<user::Model> {
    let mut active: user::ActiveModel = user.into();
    active.permissions = Set(data.to_json());
    active.last_modified = Set(Some(Utc::now()));
    Ok(active.update(db).await?)
}

/// Stores new permission data on a group.
pub async fn save_group_permissions<C: ConnectionTrait>(
    db: &C,
    group: group::Model,
    data: &PermissionData,
) -> Result<group::Model> {
    let mut active: group::ActiveModel = group.into();
    active.permissions = Set(data.to_json());
    active.last_modified = Set(Some(Utc::now()));
    Ok(active.update(db).await?)
}
