//! User entity - accounts with their own permission overrides.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Login name
    #[sea_orm(unique)]
    pub name: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Contact e-mail address
    pub email: String,
    /// Department within the organisation
    pub department: String,
    /// Group the user inherits permissions from
    pub group_id: Option<i64>,
    /// Disabled users can not log in
    pub disabled: bool,
    /// JSON encoded [`PermissionData`](crate::core::permissions::PermissionData)
    pub permissions: Json,
    /// Password hash, never written to the event log
    pub password: Option<String>,
    /// When the user was created
    pub created_at: Option<DateTimeUtc>,
    /// When the user was last modified
    pub last_modified: Option<DateTimeUtc>,
}

/// Defines relationships between User and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each user may belong to one group
    #[sea_orm(
        belongs_to = "super::group::Entity",
        from = "Column::GroupId",
        to = "super::group::Column::Id"
    )]
    Group,
}

impl Related<super::group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Group.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
