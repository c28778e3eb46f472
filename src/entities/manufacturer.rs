//! Manufacturer entity - companies producing parts.
//!
//! Manufacturers are structural elements (a brand can be grouped under its
//! parent company) and carry company contact information.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Manufacturer database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "manufacturers")]
pub struct Model {
    /// Unique identifier for the manufacturer
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Company name
    pub name: String,
    /// Free-form comment
    pub comment: String,
    /// Parent company, if any
    pub parent_id: Option<i64>,
    /// Whether parts can reference this node directly
    pub not_selectable: bool,
    /// Postal address
    pub address: String,
    /// Phone number
    pub phone_number: String,
    /// Contact e-mail address
    pub email_address: String,
    /// Company website
    pub website: String,
    /// URL template for product pages, `%PARTNUMBER%` is replaced by the MPN
    pub auto_product_url: String,
    /// When the manufacturer was created
    pub created_at: Option<DateTimeUtc>,
    /// When the manufacturer was last modified
    pub last_modified: Option<DateTimeUtc>,
}

/// Defines relationships between Manufacturer and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Parent company
    #[sea_orm(belongs_to = "Entity", from = "Column::ParentId", to = "Column::Id")]
    Parent,
    /// One manufacturer produces many parts
    #[sea_orm(has_many = "super::part::Entity")]
    Parts,
}

impl Related<super::part::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Parts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
