//! Core business logic - framework-agnostic inventory operations.
//!
//! Everything in here works on a `sea-orm` connection and returns
//! [`crate::errors::Result`]; the command line front end only formats results.

/// Attachment paths, file type filters and uploads
pub mod attachments;
/// Event log: typed events, logger, queries and rendering
pub mod log;
/// Parts, part lots and stock changes
pub mod part;
/// Permission values, inheritance and presets
pub mod permissions;
/// Prices of orderdetails
pub mod pricing;
/// Trees of categories, storage locations and other structural elements
pub mod structural;
/// Reconstruction of past element states from the event log
pub mod time_travel;
