//! Event log: typed events, the logger writing them, queries and rendering.

pub mod diff;
pub mod event;
pub mod formatter;
pub mod logger;
pub mod repository;
pub mod types;

pub use event::{FieldData, LogEvent, StockAction};
pub use logger::{EventLogger, LogContext};
pub use types::{Association, AssociationKind, LogEntryType, LogLevel, TargetType};
