//! Supplier entity - distributors parts are ordered from.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Supplier database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "suppliers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub comment: String,
    pub parent_id: Option<i64>,
    pub not_selectable: bool,
    pub address: String,
    pub phone_number: String,
    pub email_address: String,
    pub website: String,
    /// URL template for order pages, `%PARTNUMBER%` is replaced by the supplier part number
    pub auto_product_url: String,
    /// Shipping costs charged per order
    pub shipping_costs: Option<f64>,
    /// ISO 4217 code of the currency prices are given in by default
    pub default_currency: Option<String>,
    pub created_at: Option<DateTimeUtc>,
    pub last_modified: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(belongs_to = "Entity", from = "Column::ParentId", to = "Column::Id")]
    Parent,
    #[sea_orm(has_many = "super::orderdetail::Entity")]
    Orderdetails,
}

impl Related<super::orderdetail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orderdetails.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
