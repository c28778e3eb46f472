//! Footprint entity - package outlines (SOT-23, DIP-8, ...) parts can use.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Footprint database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "footprints")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub comment: String,
    pub parent_id: Option<i64>,
    pub not_selectable: bool,
    /// Attachment holding the 3D model of this footprint
    pub footprint_3d_id: Option<i64>,
    pub created_at: Option<DateTimeUtc>,
    pub last_modified: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(belongs_to = "Entity", from = "Column::ParentId", to = "Column::Id")]
    Parent,
    #[sea_orm(has_many = "super::part::Entity")]
    Parts,
}

impl Related<super::part::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Parts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
