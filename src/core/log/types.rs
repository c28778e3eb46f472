//! Integer codes stored in the log table and the association metadata of every
//! element kind a log entry can point at.

use serde::{Deserialize, Serialize};
use std::fmt;

/// PSR-3 severity of a log entry. Lower values are more severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(i16)]
pub enum LogLevel {
    Emergency = 0,
    Alert = 1,
    Critical = 2,
    Error = 3,
    Warning = 4,
    Notice = 5,
    Info = 6,
    Debug = 7,
}

impl LogLevel {
    pub const ALL: [Self; 8] = [
        Self::Emergency,
        Self::Alert,
        Self::Critical,
        Self::Error,
        Self::Warning,
        Self::Notice,
        Self::Info,
        Self::Debug,
    ];

    #[must_use]
    pub fn from_i16(value: i16) -> Option<Self> {
        Self::ALL.into_iter().find(|l| *l as i16 == value)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Emergency => "emergency",
            Self::Alert => "alert",
            Self::Critical => "critical",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Notice => "notice",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.as_str() == name)
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of event a log entry records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i16)]
pub enum LogEntryType {
    UserLogin = 1,
    UserLogout = 2,
    UserNotAllowed = 3,
    Exception = 4,
    ElementDeleted = 5,
    ElementCreated = 6,
    ElementEdited = 7,
    ConfigChanged = 8,
    LegacyInstockChanged = 9,
    DatabaseUpdated = 10,
    CollectionElementDeleted = 11,
    SecurityEvent = 12,
    PartStockChanged = 13,
}

impl LogEntryType {
    pub const ALL: [Self; 13] = [
        Self::UserLogin,
        Self::UserLogout,
        Self::UserNotAllowed,
        Self::Exception,
        Self::ElementDeleted,
        Self::ElementCreated,
        Self::ElementEdited,
        Self::ConfigChanged,
        Self::LegacyInstockChanged,
        Self::DatabaseUpdated,
        Self::CollectionElementDeleted,
        Self::SecurityEvent,
        Self::PartStockChanged,
    ];

    #[must_use]
    pub fn from_i16(value: i16) -> Option<Self> {
        Self::ALL.into_iter().find(|t| *t as i16 == value)
    }

    /// Name used in configuration (blacklist/whitelist) and on the command line
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::UserLogin => "user_login",
            Self::UserLogout => "user_logout",
            Self::UserNotAllowed => "user_not_allowed",
            Self::Exception => "exception",
            Self::ElementDeleted => "element_deleted",
            Self::ElementCreated => "element_created",
            Self::ElementEdited => "element_edited",
            Self::ConfigChanged => "config_changed",
            Self::LegacyInstockChanged => "instock_changed",
            Self::DatabaseUpdated => "database_updated",
            Self::CollectionElementDeleted => "collection_element_deleted",
            Self::SecurityEvent => "security_event",
            Self::PartStockChanged => "part_stock_changed",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }
}

impl fmt::Display for LogEntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Kind of element a log entry (or an attachment) refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(i16)]
pub enum TargetType {
    None = 0,
    User = 1,
    Attachment = 2,
    AttachmentType = 3,
    Category = 4,
    Footprint = 5,
    Group = 6,
    Manufacturer = 7,
    Part = 8,
    StorageLocation = 9,
    Supplier = 10,
    PartLot = 11,
    Orderdetail = 12,
    Pricedetail = 13,
}

/// How an association is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssociationKind {
    /// The element holds the foreign key in `column`
    ToOne { column: &'static str },
    /// The associated elements hold the foreign key in `mapped_by`
    ToMany { mapped_by: &'static str },
}

/// A named association between two element kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Association {
    pub field: &'static str,
    pub target: TargetType,
    pub kind: AssociationKind,
}

const fn to_one(field: &'static str, column: &'static str, target: TargetType) -> Association {
    Association {
        field,
        target,
        kind: AssociationKind::ToOne { column },
    }
}

const fn to_many(field: &'static str, mapped_by: &'static str, target: TargetType) -> Association {
    Association {
        field,
        target,
        kind: AssociationKind::ToMany { mapped_by },
    }
}

macro_rules! structural_associations {
    ($name:ident, $target:expr) => {
        const $name: &[Association] = &[
            to_one("parent", "parent_id", $target),
            to_many("children", "parent_id", $target),
            to_many("attachments", "element_id", TargetType::Attachment),
        ];
    };
}

structural_associations!(CATEGORY_ASSOCIATIONS, TargetType::Category);
structural_associations!(MANUFACTURER_ASSOCIATIONS, TargetType::Manufacturer);
structural_associations!(SUPPLIER_ASSOCIATIONS, TargetType::Supplier);
structural_associations!(STORAGE_LOCATION_ASSOCIATIONS, TargetType::StorageLocation);
structural_associations!(ATTACHMENT_TYPE_ASSOCIATIONS, TargetType::AttachmentType);

const FOOTPRINT_ASSOCIATIONS: &[Association] = &[
    to_one("parent", "parent_id", TargetType::Footprint),
    to_many("children", "parent_id", TargetType::Footprint),
    to_many("attachments", "element_id", TargetType::Attachment),
    to_one("footprint_3d", "footprint_3d_id", TargetType::Attachment),
];

const GROUP_ASSOCIATIONS: &[Association] = &[
    to_one("parent", "parent_id", TargetType::Group),
    to_many("children", "parent_id", TargetType::Group),
];

const USER_ASSOCIATIONS: &[Association] = &[to_one("group", "group_id", TargetType::Group)];

const PART_ASSOCIATIONS: &[Association] = &[
    to_one("category", "category_id", TargetType::Category),
    to_one("footprint", "footprint_id", TargetType::Footprint),
    to_one("manufacturer", "manufacturer_id", TargetType::Manufacturer),
    to_one(
        "master_picture_attachment",
        "master_picture_attachment_id",
        TargetType::Attachment,
    ),
    to_many("part_lots", "part_id", TargetType::PartLot),
    to_many("orderdetails", "part_id", TargetType::Orderdetail),
    to_many("attachments", "element_id", TargetType::Attachment),
];

const PART_LOT_ASSOCIATIONS: &[Association] = &[
    to_one("part", "part_id", TargetType::Part),
    to_one(
        "storage_location",
        "storage_location_id",
        TargetType::StorageLocation,
    ),
];

const ORDERDETAIL_ASSOCIATIONS: &[Association] = &[
    to_one("part", "part_id", TargetType::Part),
    to_one("supplier", "supplier_id", TargetType::Supplier),
    to_many("pricedetails", "orderdetail_id", TargetType::Pricedetail),
];

const PRICEDETAIL_ASSOCIATIONS: &[Association] =
    &[to_one("orderdetail", "orderdetail_id", TargetType::Orderdetail)];

const ATTACHMENT_ASSOCIATIONS: &[Association] = &[to_one(
    "attachment_type",
    "attachment_type_id",
    TargetType::AttachmentType,
)];

impl TargetType {
    pub const ALL: [Self; 14] = [
        Self::None,
        Self::User,
        Self::Attachment,
        Self::AttachmentType,
        Self::Category,
        Self::Footprint,
        Self::Group,
        Self::Manufacturer,
        Self::Part,
        Self::StorageLocation,
        Self::Supplier,
        Self::PartLot,
        Self::Orderdetail,
        Self::Pricedetail,
    ];

    #[must_use]
    pub fn from_i16(value: i16) -> Option<Self> {
        Self::ALL.into_iter().find(|t| *t as i16 == value)
    }

    /// Human-readable entity name
    #[must_use]
    pub const fn entity_name(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::User => "User",
            Self::Attachment => "Attachment",
            Self::AttachmentType => "Attachment type",
            Self::Category => "Category",
            Self::Footprint => "Footprint",
            Self::Group => "Group",
            Self::Manufacturer => "Manufacturer",
            Self::Part => "Part",
            Self::StorageLocation => "Storage location",
            Self::Supplier => "Supplier",
            Self::PartLot => "Part lot",
            Self::Orderdetail => "Orderdetail",
            Self::Pricedetail => "Pricedetail",
        }
    }

    /// Short name used on the command line and in attachment folders
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::User => "user",
            Self::Attachment => "attachment",
            Self::AttachmentType => "attachment_type",
            Self::Category => "category",
            Self::Footprint => "footprint",
            Self::Group => "group",
            Self::Manufacturer => "manufacturer",
            Self::Part => "part",
            Self::StorageLocation => "storelocation",
            Self::Supplier => "supplier",
            Self::PartLot => "part_lot",
            Self::Orderdetail => "orderdetail",
            Self::Pricedetail => "pricedetail",
        }
    }

    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.key() == key)
    }

    /// Whether elements of this kind form a parent/child tree
    #[must_use]
    pub const fn is_structural(self) -> bool {
        matches!(
            self,
            Self::AttachmentType
                | Self::Category
                | Self::Footprint
                | Self::Group
                | Self::Manufacturer
                | Self::StorageLocation
                | Self::Supplier
        )
    }

    /// Whether elements of this kind can own attachments
    #[must_use]
    pub const fn has_attachments(self) -> bool {
        matches!(
            self,
            Self::AttachmentType
                | Self::Category
                | Self::Footprint
                | Self::Manufacturer
                | Self::Part
                | Self::StorageLocation
                | Self::Supplier
        )
    }

    /// Associations of this element kind
    #[must_use]
    pub const fn associations(self) -> &'static [Association] {
        match self {
            Self::None => &[],
            Self::User => USER_ASSOCIATIONS,
            Self::Attachment => ATTACHMENT_ASSOCIATIONS,
            Self::AttachmentType => ATTACHMENT_TYPE_ASSOCIATIONS,
            Self::Category => CATEGORY_ASSOCIATIONS,
            Self::Footprint => FOOTPRINT_ASSOCIATIONS,
            Self::Group => GROUP_ASSOCIATIONS,
            Self::Manufacturer => MANUFACTURER_ASSOCIATIONS,
            Self::Part => PART_ASSOCIATIONS,
            Self::StorageLocation => STORAGE_LOCATION_ASSOCIATIONS,
            Self::Supplier => SUPPLIER_ASSOCIATIONS,
            Self::PartLot => PART_LOT_ASSOCIATIONS,
            Self::Orderdetail => ORDERDETAIL_ASSOCIATIONS,
            Self::Pricedetail => PRICEDETAIL_ASSOCIATIONS,
        }
    }

    /// Finds the association stored in the given foreign-key column.
    #[must_use]
    pub fn association_for_column(self, column: &str) -> Option<&'static Association> {
        self.associations()
            .iter()
            .find(|a| matches!(a.kind, AssociationKind::ToOne { column: c } if c == column))
    }

    /// Finds an association by its field name.
    #[must_use]
    pub fn association(self, field: &str) -> Option<&'static Association> {
        self.associations().iter().find(|a| a.field == field)
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.entity_name())
    }
}
