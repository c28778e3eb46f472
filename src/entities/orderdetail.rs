//! Orderdetail entity - where a part can be bought and under which number.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Orderdetail database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orderdetails")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub part_id: i64,
    pub supplier_id: Option<i64>,
    /// Order number at the supplier
    pub supplier_part_nr: String,
    pub supplier_product_url: String,
    /// The supplier no longer sells this part
    pub obsolete: bool,
    pub created_at: Option<DateTimeUtc>,
    pub last_modified: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::part::Entity",
        from = "Column::PartId",
        to = "super::part::Column::Id",
        on_delete = "Cascade"
    )]
    Part,
    #[sea_orm(
        belongs_to = "super::supplier::Entity",
        from = "Column::SupplierId",
        to = "super::supplier::Column::Id"
    )]
    Supplier,
    #[sea_orm(has_many = "super::pricedetail::Entity")]
    Pricedetails,
}

impl Related<super::part::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Part.def()
    }
}

impl Related<super::supplier::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supplier.def()
    }
}

impl Related<super::pricedetail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Pricedetails.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
