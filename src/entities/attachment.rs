//! Attachment entity - a file or external link attached to another element.
//!
//! The owning element is referenced polymorphically through `element_type`
//! (a [`TargetType`](crate::core::log::TargetType) id) and `element_id`.
//! `path` either holds a placeholder path like `%MEDIA%/part/foo.pdf` or an
//! external URL.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Attachment database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "attachments")]
pub struct Model {
    /// Unique identifier for the attachment
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name
    pub name: String,
    /// Type of the owning element
    pub element_type: i16,
    /// ID of the owning element
    pub element_id: i64,
    /// Attachment type classifying this attachment
    pub attachment_type_id: i64,
    /// Placeholder path or external URL
    pub path: String,
    /// Filename the file had when it was uploaded
    pub original_filename: Option<String>,
    /// Show this attachment in part tables
    pub show_in_table: bool,
    /// When the attachment was created
    pub created_at: Option<DateTimeUtc>,
    /// When the attachment was last modified
    pub last_modified: Option<DateTimeUtc>,
}

/// Defines relationships between Attachment and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each attachment has one attachment type
    #[sea_orm(
        belongs_to = "super::attachment_type::Entity",
        from = "Column::AttachmentTypeId",
        to = "super::attachment_type::Column::Id"
    )]
    AttachmentType,
}

impl Related<super::attachment_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AttachmentType.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
