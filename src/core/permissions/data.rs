//! Permission values of one user or group.
//!
//! Stored as JSON in the `permissions` column:
//! `{"data": {"parts": {"read": true, "edit": false}}, "schema_version": 2}`.
//! An operation missing from the map inherits its value.

use crate::errors::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Schema version written by this version
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

/// Permission values keyed by permission and operation name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionData {
    #[serde(default)]
    data: BTreeMap<String, BTreeMap<String, bool>>,
    #[serde(default)]
    schema_version: u32,
}

impl PermissionData {
    /// Empty data (everything inherits) at the current schema version
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: BTreeMap::new(),
            schema_version: CURRENT_SCHEMA_VERSION,
        }
    }

    /// Decodes the JSON column value; null decodes to empty data.
    ///
    /// # Errors
    /// Returns an error if the JSON does not have the expected shape.
    pub fn from_json(value: &Value) -> Result<Self> {
        if value.is_null() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_value(value.clone())?)
    }

    /// Encodes into the JSON column value.
    #[must_use]
    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "data": self.data,
            "schema_version": self.schema_version,
        })
    }

    /// Value of an operation: `Some(true)` allow, `Some(false)` disallow, None inherit
    #[must_use]
    pub fn get_permission_value(&self, permission: &str, operation: &str) -> Option<bool> {
        self.data.get(permission)?.get(operation).copied()
    }

    /// Sets the value of an operation. None removes it so it inherits again.
    pub fn set_permission_value(&mut self, permission: &str, operation: &str, value: Option<bool>) {
        match value {
            Some(value) => {
                self.data
                    .entry(permission.to_string())
                    .or_default()
                    .insert(operation.to_string(), value);
            }
            None => {
                if let Some(operations) = self.data.get_mut(permission) {
                    operations.remove(operation);
                    if operations.is_empty() {
                        self.data.remove(permission);
                    }
                }
            }
        }
    }

    #[must_use]
    pub fn is_permission_set(&self, permission: &str, operation: &str) -> bool {
        self.get_permission_value(permission, operation).is_some()
    }

    /// Whether any operation of the permission has a non-inherit value
    #[must_use]
    pub fn is_any_operation_of_permission_set(&self, permission: &str) -> bool {
        self.data.get(permission).is_some_and(|ops| !ops.is_empty())
    }

    /// All non-inherit operation values of a permission
    #[must_use]
    pub fn get_all_defined_operations_of_permission(&self, permission: &str) -> BTreeMap<String, bool> {
        self.data.get(permission).cloned().unwrap_or_default()
    }

    /// Replaces all operation values of a permission.
    pub fn set_all_operations_of_permission(&mut self, permission: &str, operations: BTreeMap<String, bool>) {
        if operations.is_empty() {
            self.data.remove(permission);
        } else {
            self.data.insert(permission.to_string(), operations);
        }
    }

    /// Resets a permission to inherit.
    pub fn remove_permission(&mut self, permission: &str) {
        self.data.remove(permission);
    }

    /// Names of all permissions with at least one value
    pub fn permissions(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    #[must_use]
    pub const fn schema_version(&self) -> u32 {
        self.schema_version
    }

    pub const fn set_schema_version(&mut self, version: u32) {
        self.schema_version = version;
    }
}
