//! Storage location entity - shelves, drawers and boxes part lots live in.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Storage location database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "storage_locations")]
pub struct Model {
    /// Unique identifier for the storage location
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name, unique among siblings
    pub name: String,
    /// Free-form comment
    pub comment: String,
    /// Enclosing storage location
    pub parent_id: Option<i64>,
    /// Whether lots can be placed here directly
    pub not_selectable: bool,
    /// No new lots can be added when the location is full
    pub is_full: bool,
    /// Only lots of a single part may be stored here
    pub only_single_part: bool,
    /// Only existing lots may be refilled, no new ones created
    pub limit_to_existing_parts: bool,
    /// When the storage location was created
    pub created_at: Option<DateTimeUtc>,
    /// When the storage location was last modified
    pub last_modified: Option<DateTimeUtc>,
}

/// Defines relationships between StorageLocation and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Enclosing storage location
    #[sea_orm(belongs_to = "Entity", from = "Column::ParentId", to = "Column::Id")]
    Parent,
    /// One storage location holds many part lots
    #[sea_orm(has_many = "super::part_lot::Entity")]
    PartLots,
}

impl Related<super::part_lot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PartLots.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
