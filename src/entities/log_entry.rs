//! Log entry entity - one row of the audit log.
//!
//! `entry_type`, `level` and `target_type` store the integer codes of
//! [`LogEntryType`](crate::core::log::LogEntryType),
//! [`LogLevel`](crate::core::log::LogLevel) and
//! [`TargetType`](crate::core::log::TargetType). Type specific data lives in
//! `extra` using the short keys decoded by
//! [`LogEvent`](crate::core::log::LogEvent).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Log entry database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "log_entries")]
pub struct Model {
    /// Unique identifier for the entry
    #[sea_orm(primary_key)]
    pub id: i64,
    /// When the event happened
    pub timestamp: DateTimeUtc,
    /// Severity (PSR-3 level, 0 = emergency ... 7 = debug)
    pub level: i16,
    /// Kind of the element this entry refers to (0 = none)
    pub target_type: i16,
    /// ID of the element this entry refers to (0 = none)
    pub target_id: i64,
    /// Kind of event
    pub entry_type: i16,
    /// User who caused the event, None for anonymous or deleted users
    pub user_id: Option<i64>,
    /// Name of the user at the time of the event
    pub username: String,
    /// Type specific data
    pub extra: Json,
}

/// Log entries reference their targets polymorphically and have no relations
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
