//! Database configuration module for Part-DB.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated with `Schema::create_table_from_entity` from the entity
//! definitions, so the schema always matches the Rust structs without manual SQL.

use crate::entities::{
    Attachment, AttachmentType, Category, Footprint, Group, LogEntry, Manufacturer, Orderdetail,
    Part, PartLot, Pricedetail, StorageLocation, Supplier, User,
};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use tracing::{debug, info};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/partdb.sqlite?mode=rwc";

/// Gets the database URL from environment variable or returns default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by `DATABASE_URL`.
///
/// Falls back to a local `SQLite` file if no environment variable is set.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    debug!("Connecting to database at {}", database_url);
    Database::connect(&database_url).await.map_err(Into::into)
}

async fn create_table<C, E>(db: &C, schema: &Schema, entity: E) -> Result<()>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Creates all tables from the entity definitions if they do not exist yet.
///
/// Referenced tables are created before the tables referring to them.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, AttachmentType).await?;
    create_table(db, &schema, Category).await?;
    create_table(db, &schema, Footprint).await?;
    create_table(db, &schema, Manufacturer).await?;
    create_table(db, &schema, Supplier).await?;
    create_table(db, &schema, StorageLocation).await?;
    create_table(db, &schema, Group).await?;
    create_table(db, &schema, User).await?;
    create_table(db, &schema, Part).await?;
    create_table(db, &schema, PartLot).await?;
    create_table(db, &schema, Orderdetail).await?;
    create_table(db, &schema, Pricedetail).await?;
    create_table(db, &schema, Attachment).await?;
    create_table(db, &schema, LogEntry).await?;

    info!("Database tables ensured");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{CategoryModel, LogEntryModel, PartModel, UserModel};
    use sea_orm::QuerySelect;

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _: Vec<CategoryModel> = Category::find().limit(1).all(&db).await?;
        let _: Vec<PartModel> = Part::find().limit(1).all(&db).await?;
        let _: Vec<UserModel> = User::find().limit(1).all(&db).await?;
        let _: Vec<LogEntryModel> = LogEntry::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }
}
