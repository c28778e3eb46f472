//! Shared test utilities for Part-DB.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{
        log::{EventLogger, LogContext, LogEntryType, LogLevel, TargetType},
        part::{self, NewPart},
        structural,
    },
    entities::{attachment, attachment_type, category, group, log_entry, orderdetail, part as part_entity, pricedetail, storage_location, user},
    errors::Result,
};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use serde_json::{Value, json};

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Writes a raw log entry, bypassing the logger settings.
///
/// # Defaults
/// * `level`: info
/// * `username`: `"test_user"`
pub async fn insert_log_entry(
    db: &DatabaseConnection,
    timestamp: DateTime<Utc>,
    entry_type: LogEntryType,
    target: TargetType,
    target_id: i64,
    extra: Value,
) -> Result<log_entry::Model> {
    log_entry::ActiveModel {
        timestamp: Set(timestamp),
        level: Set(LogLevel::Info as i16),
        target_type: Set(target as i16),
        target_id: Set(target_id),
        entry_type: Set(entry_type as i16),
        user_id: Set(None),
        username: Set("test_user".to_string()),
        extra: Set(extra),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Creates a root category through the logged create path.
pub async fn create_test_category(db: &DatabaseConnection, name: &str) -> Result<category::Model> {
    structural::create_category(db, &EventLogger::default(), &LogContext::cli(), name, None).await
}

/// Creates a root storage location through the logged create path.
pub async fn create_test_storage_location(
    db: &DatabaseConnection,
    name: &str,
) -> Result<storage_location::Model> {
    structural::create_storage_location(db, &EventLogger::default(), &LogContext::cli(), name, None)
        .await
}

/// Creates a part with sensible defaults.
///
/// # Defaults
/// * `description`: empty
/// * `min_amount`: 0.0
/// * no footprint, manufacturer or IPN
pub async fn create_test_part(
    db: &DatabaseConnection,
    name: &str,
    category_id: i64,
) -> Result<part_entity::Model> {
    let data = NewPart {
        name: name.to_string(),
        category_id,
        ..NewPart::default()
    };
    part::create_part(db, &EventLogger::default(), &LogContext::cli(), data).await
}

/// Creates an attachment type with the given file type filter.
pub async fn create_test_attachment_type(
    db: &DatabaseConnection,
    name: &str,
    filetype_filter: &str,
) -> Result<attachment_type::Model> {
    attachment_type::ActiveModel {
        name: Set(name.to_string()),
        comment: Set(String::new()),
        parent_id: Set(None),
        not_selectable: Set(false),
        filetype_filter: Set(filetype_filter.to_string()),
        created_at: Set(Some(Utc::now())),
        last_modified: Set(Some(Utc::now())),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Creates an attachment linking to an external URL.
pub async fn create_test_link(
    db: &DatabaseConnection,
    (owner, owner_id): (TargetType, i64),
    attachment_type_id: i64,
    url: &str,
) -> Result<attachment::Model> {
    attachment::ActiveModel {
        name: Set("Datasheet".to_string()),
        element_type: Set(owner as i16),
        element_id: Set(owner_id),
        attachment_type_id: Set(attachment_type_id),
        path: Set(url.to_string()),
        original_filename: Set(None),
        show_in_table: Set(false),
        created_at: Set(Some(Utc::now())),
        last_modified: Set(Some(Utc::now())),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Creates a group without any permission values.
pub async fn create_test_group(
    db: &DatabaseConnection,
    name: &str,
    parent_id: Option<i64>,
) -> Result<group::Model> {
    group::ActiveModel {
        name: Set(name.to_string()),
        comment: Set(String::new()),
        parent_id: Set(parent_id),
        not_selectable: Set(false),
        enforce_2fa: Set(false),
        permissions: Set(json!({})),
        created_at: Set(Some(Utc::now())),
        last_modified: Set(Some(Utc::now())),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Creates an enabled user without any permission values.
pub async fn create_test_user(
    db: &DatabaseConnection,
    name: &str,
    group_id: Option<i64>,
) -> Result<user::Model> {
    user::ActiveModel {
        name: Set(name.to_string()),
        first_name: Set(String::new()),
        last_name: Set(String::new()),
        email: Set(format!("{name}@example.com")),
        department: Set(String::new()),
        group_id: Set(group_id),
        disabled: Set(false),
        permissions: Set(json!({})),
        password: Set(None),
        created_at: Set(Some(Utc::now())),
        last_modified: Set(Some(Utc::now())),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Creates an orderdetail without supplier.
pub async fn create_test_orderdetail(db: &DatabaseConnection, part_id: i64) -> Result<orderdetail::Model> {
    orderdetail::ActiveModel {
        part_id: Set(part_id),
        supplier_id: Set(None),
        supplier_part_nr: Set(String::new()),
        supplier_product_url: Set(String::new()),
        obsolete: Set(false),
        created_at: Set(Some(Utc::now())),
        last_modified: Set(Some(Utc::now())),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Creates a price step for one part in the base currency.
pub async fn create_test_pricedetail(
    db: &DatabaseConnection,
    orderdetail_id: i64,
    min_discount_quantity: f64,
    price: f64,
) -> Result<pricedetail::Model> {
    pricedetail::ActiveModel {
        orderdetail_id: Set(orderdetail_id),
        price: Set(price),
        price_related_quantity: Set(1.0),
        min_discount_quantity: Set(min_discount_quantity),
        currency: Set(None),
        created_at: Set(Some(Utc::now())),
        last_modified: Set(Some(Utc::now())),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}
