//! Permission system - per user/group operation values with group inheritance.

pub mod data;
pub mod legacy;
pub mod manager;

pub use data::PermissionData;
pub use manager::{PermissionManager, PermissionPreset};
