//! Category entity - the tree every part is sorted into.
//!
//! Categories are structural elements: each one may have a parent category and
//! any number of children. Besides the common structural columns a category
//! carries hints used when creating new parts inside it.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Category database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    /// Unique identifier for the category
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name, unique among siblings
    pub name: String,
    /// Free-form comment
    pub comment: String,
    /// Parent category, None for root level categories
    pub parent_id: Option<i64>,
    /// Whether parts can be assigned to this category directly
    pub not_selectable: bool,
    /// Hint shown when naming a new part in this category
    pub partname_hint: String,
    /// Regular expression new part names must match (empty = no restriction)
    pub partname_regex: String,
    /// Hide footprint selection for parts in this category
    pub disable_footprints: bool,
    /// Hide manufacturer selection for parts in this category
    pub disable_manufacturers: bool,
    /// Description prefilled for new parts
    pub default_description: String,
    /// Comment prefilled for new parts
    pub default_comment: String,
    /// When the category was created
    pub created_at: Option<DateTimeUtc>,
    /// When the category was last modified
    pub last_modified: Option<DateTimeUtc>,
}

/// Defines relationships between Category and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each category may belong to a parent category
    #[sea_orm(belongs_to = "Entity", from = "Column::ParentId", to = "Column::Id")]
    Parent,
    /// One category has many parts
    #[sea_orm(has_many = "super::part::Entity")]
    Parts,
}

impl Related<super::part::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Parts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
