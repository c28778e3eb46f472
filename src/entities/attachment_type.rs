//! Attachment type entity - classifies attachments ("Datasheet", "Picture", ...)
//! and restricts which file types may be uploaded for them.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Attachment type database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "attachment_types")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub comment: String,
    pub parent_id: Option<i64>,
    pub not_selectable: bool,
    /// Accept filter like `image/*, .pdf`; empty allows every file type
    pub filetype_filter: String,
    pub created_at: Option<DateTimeUtc>,
    pub last_modified: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(belongs_to = "Entity", from = "Column::ParentId", to = "Column::Id")]
    Parent,
    #[sea_orm(has_many = "super::attachment::Entity")]
    Attachments,
}

impl Related<super::attachment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attachments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
