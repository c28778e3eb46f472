//! Part entity - the central inventory item.
//!
//! A part belongs to exactly one category and optionally references a footprint
//! and a manufacturer. Stock is not stored on the part itself but in its part
//! lots; purchase information lives in orderdetails.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Part database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "parts")]
pub struct Model {
    /// Unique identifier for the part
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Name of the part (e.g., "BC547", "10k 0603")
    pub name: String,
    /// Short description shown in part tables
    pub description: String,
    /// Longer free-form comment
    pub comment: String,
    /// Category the part is sorted into
    pub category_id: i64,
    /// Package of the part
    pub footprint_id: Option<i64>,
    /// Producer of the part
    pub manufacturer_id: Option<i64>,
    /// Manufacturer part number (MPN)
    pub manufacturer_product_number: String,
    /// Link to the product page at the manufacturer
    pub manufacturer_product_url: String,
    /// Lifecycle status (`active`, `nrfnd`, `eol`, `discontinued`)
    pub manufacturing_status: Option<String>,
    /// Internal part number, unique when set
    #[sea_orm(unique)]
    pub ipn: Option<String>,
    /// Comma separated tags
    pub tags: String,
    /// Minimum stock; falling below it marks the part as "not enough instock"
    pub min_amount: f64,
    /// Marked as favorite
    pub favorite: bool,
    /// Flagged for review
    pub needs_review: bool,
    /// Mass in grams
    pub mass: Option<f64>,
    /// Attachment used as preview picture
    pub master_picture_attachment_id: Option<i64>,
    /// When the part was created
    pub created_at: Option<DateTimeUtc>,
    /// When the part was last modified
    pub last_modified: Option<DateTimeUtc>,
}

/// Defines relationships between Part and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each part belongs to one category
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
    /// Each part may use one footprint
    #[sea_orm(
        belongs_to = "super::footprint::Entity",
        from = "Column::FootprintId",
        to = "super::footprint::Column::Id"
    )]
    Footprint,
    /// Each part may be produced by one manufacturer
    #[sea_orm(
        belongs_to = "super::manufacturer::Entity",
        from = "Column::ManufacturerId",
        to = "super::manufacturer::Column::Id"
    )]
    Manufacturer,
    /// One part has many lots
    #[sea_orm(has_many = "super::part_lot::Entity")]
    PartLots,
    /// One part has many orderdetails
    #[sea_orm(has_many = "super::orderdetail::Entity")]
    Orderdetails,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::footprint::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Footprint.def()
    }
}

impl Related<super::manufacturer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Manufacturer.def()
    }
}

impl Related<super::part_lot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PartLots.def()
    }
}

impl Related<super::orderdetail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orderdetails.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
