//! Permission structure loading.
//!
//! The structure lists every permission, its operations, the legacy bit offset
//! of each operation and the operations that must be granted together with it.
//! It is compiled into the binary from `permissions.toml`.

use crate::errors::{Error, Result};
use serde::Deserialize;

const BUILTIN_PERMISSIONS: &str = include_str!("permissions.toml");

/// The complete permission structure
#[derive(Debug, Clone, Deserialize)]
pub struct PermissionStructure {
    /// All known permissions in display order
    pub permissions: Vec<PermissionDefinition>,
}

/// One permission (e.g., `parts`) and its operations
#[derive(Debug, Clone, Deserialize)]
pub struct PermissionDefinition {
    /// Identifier used in permission data
    pub name: String,
    /// Human-readable label
    pub label: String,
    /// Group used to arrange permissions in overviews
    pub group: String,
    /// Operations of this permission
    pub operations: Vec<OperationDefinition>,
}

/// One operation (e.g., `edit`) of a permission
#[derive(Debug, Clone, Deserialize)]
pub struct OperationDefinition {
    /// Identifier used in permission data
    pub name: String,
    /// Offset of the two bits storing this operation in the legacy integer encoding
    pub bit: u8,
    /// Operations granted together with this one (`op` or `permission.op`)
    #[serde(default)]
    pub also_set: Vec<String>,
}

impl PermissionStructure {
    /// Parses the structure compiled into the binary.
    ///
    /// # Errors
    /// Returns an error if the embedded document is malformed.
    pub fn builtin() -> Result<Self> {
        Self::parse(BUILTIN_PERMISSIONS)
    }

    /// Parses a structure from TOML text and checks the bit offsets.
    ///
    /// # Errors
    /// Returns an error on invalid TOML, odd or too large bit offsets, or two
    /// operations of one permission sharing a bit offset.
    pub fn parse(contents: &str) -> Result<Self> {
        let structure: Self = toml::from_str(contents).map_err(|e| Error::Config {
            message: format!("Failed to parse permission structure: {e}"),
        })?;

        for permission in &structure.permissions {
            let mut used = 0u64;
            for operation in &permission.operations {
                if operation.bit % 2 != 0 || operation.bit > 62 {
                    return Err(Error::Config {
                        message: format!(
                            "Invalid bit offset {} for {}.{}",
                            operation.bit, permission.name, operation.name
                        ),
                    });
                }
                let mask = 0b11u64 << operation.bit;
                if used & mask != 0 {
                    return Err(Error::Config {
                        message: format!(
                            "Bit offset {} used twice in permission {}",
                            operation.bit, permission.name
                        ),
                    });
                }
                used |= mask;
            }
        }

        Ok(structure)
    }

    /// Looks up a permission by name.
    #[must_use]
    pub fn permission(&self, name: &str) -> Option<&PermissionDefinition> {
        self.permissions.iter().find(|p| p.name == name)
    }

    /// Looks up an operation of a permission.
    #[must_use]
    pub fn operation(&self, permission: &str, operation: &str) -> Option<&OperationDefinition> {
        self.permission(permission)?
            .operations
            .iter()
            .find(|o| o.name == operation)
    }

    /// Checks whether the permission and operation exist.
    #[must_use]
    pub fn is_valid_operation(&self, permission: &str, operation: &str) -> bool {
        self.operation(permission, operation).is_some()
    }
}
