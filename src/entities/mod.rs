//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod attachment;
pub mod attachment_type;
pub mod category;
pub mod footprint;
pub mod group;
pub mod log_entry;
pub mod manufacturer;
pub mod orderdetail;
pub mod part;
pub mod part_lot;
pub mod pricedetail;
pub mod storage_location;
pub mod supplier;
pub mod user;

// Re-export specific types to avoid conflicts
pub use attachment::{Column as AttachmentColumn, Entity as Attachment, Model as AttachmentModel};
pub use attachment_type::{
    Column as AttachmentTypeColumn, Entity as AttachmentType, Model as AttachmentTypeModel,
};
pub use category::{Column as CategoryColumn, Entity as Category, Model as CategoryModel};
pub use footprint::{Column as FootprintColumn, Entity as Footprint, Model as FootprintModel};
pub use group::{Column as GroupColumn, Entity as Group, Model as GroupModel};
pub use log_entry::{Column as LogEntryColumn, Entity as LogEntry, Model as LogEntryModel};
pub use manufacturer::{
    Column as ManufacturerColumn, Entity as Manufacturer, Model as ManufacturerModel,
};
pub use orderdetail::{
    Column as OrderdetailColumn, Entity as Orderdetail, Model as OrderdetailModel,
};
pub use part::{Column as PartColumn, Entity as Part, Model as PartModel};
pub use part_lot::{Column as PartLotColumn, Entity as PartLot, Model as PartLotModel};
pub use pricedetail::{
    Column as PricedetailColumn, Entity as Pricedetail, Model as PricedetailModel,
};
pub use storage_location::{
    Column as StorageLocationColumn, Entity as StorageLocation, Model as StorageLocationModel,
};
pub use supplier::{Column as SupplierColumn, Entity as Supplier, Model as SupplierModel};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
