//! Legacy integer encoding of permissions.
//!
//! Before permissions were stored as JSON every permission was an integer
//! column holding two bits per operation at the operation's bit offset:
//! `0b00` inherit, `0b01` allow, `0b10` disallow. The unused `0b11` reads as
//! inherit.

use super::data::{CURRENT_SCHEMA_VERSION, PermissionData};
use crate::config::permissions::PermissionStructure;
use std::collections::BTreeMap;
use tracing::warn;

const INHERIT: u64 = 0b00;
const ALLOW: u64 = 0b01;
const DISALLOW: u64 = 0b10;

/// Two bit code of a permission value
#[must_use]
pub const fn encode_value(value: Option<bool>) -> u64 {
    match value {
        None => INHERIT,
        Some(true) => ALLOW,
        Some(false) => DISALLOW,
    }
}

/// Permission value of a two bit code
#[must_use]
pub const fn decode_value(bits: u64) -> Option<bool> {
    match bits & 0b11 {
        ALLOW => Some(true),
        DISALLOW => Some(false),
        _ => None,
    }
}

/// Reads the operation stored at `bit` of a legacy column value.
#[must_use]
pub const fn read_operation(column: u64, bit: u8) -> Option<bool> {
    decode_value(column >> bit)
}

/// Writes an operation value at `bit` of a legacy column value.
#[must_use]
pub const fn write_operation(column: u64, bit: u8, value: Option<bool>) -> u64 {
    let mask = 0b11u64 << bit;
    (column & !mask) | (encode_value(value) << bit)
}

/// Converts legacy columns (`permission name -> integer`) into permission data.
/// Columns of unknown permissions are skipped.
#[must_use]
pub fn from_legacy_columns(
    structure: &PermissionStructure,
    columns: &BTreeMap<String, u64>,
) -> PermissionData {
    let mut data = PermissionData::new();
    for (name, column) in columns {
        let Some(permission) = structure.permission(name) else {
            warn!(permission = %name, "Skipping unknown legacy permission column");
            continue;
        };
        for operation in &permission.operations {
            let value = read_operation(*column, operation.bit);
            data.set_permission_value(name, &operation.name, value);
        }
    }
    data.set_schema_version(CURRENT_SCHEMA_VERSION);
    data
}

/// Encodes permission data into legacy columns, one per known permission.
#[must_use]
pub fn to_legacy_columns(structure: &PermissionStructure, data: &PermissionData) -> BTreeMap<String, u64> {
    structure
        .permissions
        .iter()
        .map(|permission| {
            let column = permission.operations.iter().fold(0, |column, operation| {
                let value = data.get_permission_value(&permission.name, &operation.name);
                write_operation(column, operation.bit, value)
            });
            (permission.name.clone(), column)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_two_bit_values() {
        assert_eq!(decode_value(0b00), None);
        assert_eq!(decode_value(0b01), Some(true));
        assert_eq!(decode_value(0b10), Some(false));
        assert_eq!(decode_value(0b11), None);
    }

    #[test]
    fn test_read_write_operation() {
        let column = write_operation(0, 2, Some(true));
        assert_eq!(column, 0b0100);
        let column = write_operation(column, 4, Some(false));
        assert_eq!(column, 0b10_0100);
        assert_eq!(read_operation(column, 0), None);
        assert_eq!(read_operation(column, 2), Some(true));
        assert_eq!(read_operation(column, 4), Some(false));

        let column = write_operation(column, 2, None);
        assert_eq!(read_operation(column, 2), None);
        assert_eq!(read_operation(column, 4), Some(false));
    }

    #[test]
    fn test_legacy_column_conversion() {
        let structure = PermissionStructure::builtin().unwrap();
        // parts: read (bit 0) allow, edit (bit 2) disallow
        let columns = BTreeMap::from([
            ("parts".to_string(), 0b1001),
            ("unknown".to_string(), 0b01),
        ]);
        let data = from_legacy_columns(&structure, &columns);
        assert_eq!(data.get_permission_value("parts", "read"), Some(true));
        assert_eq!(data.get_permission_value("parts", "edit"), Some(false));
        assert_eq!(data.get_permission_value("parts", "create"), None);
        assert!(!data.is_any_operation_of_permission_set("unknown"));

        let encoded = to_legacy_columns(&structure, &data);
        assert_eq!(encoded["parts"], 0b1001);
        assert_eq!(encoded["categories"], 0);
    }
}
