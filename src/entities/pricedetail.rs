//! Pricedetail entity - one price step of an orderdetail.
//!
//! `price` is paid for `price_related_quantity` parts once at least
//! `min_discount_quantity` parts are ordered.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Pricedetail database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pricedetails")]
pub struct Model {
    /// Unique identifier for the price step
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Orderdetail this price belongs to
    pub orderdetail_id: i64,
    /// Price for `price_related_quantity` parts
    pub price: f64,
    /// Number of parts the price refers to
    pub price_related_quantity: f64,
    /// Minimum order amount for this price step
    pub min_discount_quantity: f64,
    /// ISO 4217 currency code, None for the base currency
    pub currency: Option<String>,
    /// When the price was created
    pub created_at: Option<DateTimeUtc>,
    /// When the price was last modified
    pub last_modified: Option<DateTimeUtc>,
}

/// Defines relationships between Pricedetail and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each price step belongs to one orderdetail
    #[sea_orm(
        belongs_to = "super::orderdetail::Entity",
        from = "Column::OrderdetailId",
        to = "super::orderdetail::Column::Id",
        on_delete = "Cascade"
    )]
    Orderdetail,
}

impl Related<super::orderdetail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orderdetail.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
