//! Group entity - permission groups users belong to.
//!
//! Groups form a tree; permissions a group leaves on "inherit" are looked up
//! in its parent group.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Group database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "groups")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub comment: String,
    pub parent_id: Option<i64>,
    pub not_selectable: bool,
    /// Members must set up two-factor authentication
    pub enforce_2fa: bool,
    /// JSON encoded [`PermissionData`](crate::core::permissions::PermissionData)
    pub permissions: Json,
    pub created_at: Option<DateTimeUtc>,
    pub last_modified: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(belongs_to = "Entity", from = "Column::ParentId", to = "Column::Id")]
    Parent,
    #[sea_orm(has_many = "super::user::Entity")]
    Users,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
