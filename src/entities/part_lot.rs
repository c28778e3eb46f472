//! Part lot entity - an amount of a part stored at one storage location.
//!
//! A part can be stored in several places; every place is one lot. Lots can
//! expire and can be marked as "instock unknown" when the exact amount is not
//! tracked.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Part lot database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "part_lots")]
pub struct Model {
    /// Unique identifier for the lot
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Part stored in this lot
    pub part_id: i64,
    /// Where the lot is stored
    pub storage_location_id: Option<i64>,
    /// Short description (e.g., "Reel 1")
    pub description: String,
    /// Free-form comment
    pub comment: String,
    /// Amount of parts in this lot
    pub amount: f64,
    /// The amount is not tracked for this lot
    pub instock_unknown: bool,
    /// The lot should be refilled
    pub needs_refill: bool,
    /// Parts in this lot can not be used after this date
    pub expiration_date: Option<DateTimeUtc>,
    /// When the lot was created
    pub created_at: Option<DateTimeUtc>,
    /// When the lot was last modified
    pub last_modified: Option<DateTimeUtc>,
}

/// Defines relationships between PartLot and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each lot belongs to one part
    #[sea_orm(
        belongs_to = "super::part::Entity",
        from = "Column::PartId",
        to = "super::part::Column::Id",
        on_delete = "Cascade"
    )]
    Part,
    /// Each lot may be placed in one storage location
    #[sea_orm(
        belongs_to = "super::storage_location::Entity",
        from = "Column::StorageLocationId",
        to = "super::storage_location::Column::Id"
    )]
    StorageLocation,
}

impl Related<super::part::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Part.def()
    }
}

impl Related<super::storage_location::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StorageLocation.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
