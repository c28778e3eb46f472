//! Queries over the event log.
//!
//! Entries are always returned newest first. Ties on the timestamp are broken
//! by ID so entries written in the same instant keep their insertion order.

use super::{
    event::LogEvent,
    formatter,
    types::{LogEntryType, LogLevel, TargetType},
};
use crate::{
    entities::{LogEntry, log_entry},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{PaginatorTrait, QueryOrder, QuerySelect, Select, prelude::*};

fn for_element(target: TargetType, id: i64) -> Select<LogEntry> {
    LogEntry::find()
        .filter(log_entry::Column::TargetType.eq(target as i16))
        .filter(log_entry::Column::TargetId.eq(id))
}

fn newest_first(select: Select<LogEntry>) -> Select<LogEntry> {
    select
        .order_by_desc(log_entry::Column::Timestamp)
        .order_by_desc(log_entry::Column::Id)
}

/// SQLite only accepts `OFFSET` after a `LIMIT`, so skipping entries without a
/// limit uses the largest limit it can bind.
fn paginate(select: Select<LogEntry>, limit: Option<u64>, offset: u64) -> Select<LogEntry> {
    match (limit, offset) {
        (None, 0) => select,
        (Some(limit), 0) => select.limit(limit),
        (limit, offset) => select
            .limit(limit.unwrap_or(i64::MAX.unsigned_abs()))
            .offset(offset),
    }
}

/// Returns the history of one element, newest first.
pub async fn element_history<C: ConnectionTrait>(
    db: &C,
    target: TargetType,
    id: i64,
    limit: Option<u64>,
    offset: u64,
) -> Result<Vec<log_entry::Model>> {
    paginate(newest_first(for_element(target, id)), limit, offset)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Returns the entries needed to revert an element to `timestamp`: edits and
/// collection deletions at or after the timestamp, newest first.
pub async fn time_travel_data<C: ConnectionTrait>(
    db: &C,
    target: TargetType,
    id: i64,
    timestamp: DateTime<Utc>,
) -> Result<Vec<log_entry::Model>> {
    newest_first(
        for_element(target, id)
            .filter(log_entry::Column::EntryType.is_in([
                LogEntryType::ElementEdited as i16,
                LogEntryType::CollectionElementDeleted as i16,
            ]))
            .filter(log_entry::Column::Timestamp.gte(timestamp)),
    )
    .all(db)
    .await
    .map_err(Into::into)
}

/// Returns the stock changes at or after `timestamp` that touched a lot,
/// either on the lot itself or as the target of a move, newest first.
pub async fn stock_changes_since<C: ConnectionTrait>(
    db: &C,
    lot_id: i64,
    timestamp: DateTime<Utc>,
) -> Result<Vec<log_entry::Model>> {
    let entries = newest_first(
        LogEntry::find()
            .filter(log_entry::Column::TargetType.eq(TargetType::PartLot as i16))
            .filter(log_entry::Column::EntryType.eq(LogEntryType::PartStockChanged as i16))
            .filter(log_entry::Column::Timestamp.gte(timestamp)),
    )
    .all(db)
    .await?;

    let mut touching = Vec::new();
    for entry in entries {
        let moved_here = matches!(
            formatter::decode_event(&entry)?,
            LogEvent::PartStockChanged { move_target: Some(target), .. } if target == lot_id
        );
        if entry.target_id == lot_id || moved_here {
            touching.push(entry);
        }
    }
    Ok(touching)
}

/// Checks whether an element already existed at `timestamp`, i.e. it has no
/// creation entry after it.
pub async fn element_existed_at<C: ConnectionTrait>(
    db: &C,
    target: TargetType,
    id: i64,
    timestamp: DateTime<Utc>,
) -> Result<bool> {
    let later_creations = for_element(target, id)
        .filter(log_entry::Column::EntryType.eq(LogEntryType::ElementCreated as i16))
        .filter(log_entry::Column::Timestamp.gt(timestamp))
        .count(db)
        .await?;
    Ok(later_creations == 0)
}

/// Returns the most recent deletion entry of an element.
///
/// # Errors
/// Returns `Error::UndeleteDataMissing` if the element was never logged as deleted.
pub async fn undelete_data<C: ConnectionTrait>(
    db: &C,
    target: TargetType,
    id: i64,
) -> Result<log_entry::Model> {
    newest_first(
        for_element(target, id)
            .filter(log_entry::Column::EntryType.eq(LogEntryType::ElementDeleted as i16)),
    )
    .one(db)
    .await?
    .ok_or(Error::UndeleteDataMissing {
        entity: target.entity_name(),
        id,
    })
}

/// Returns the creation entry of an element, if it was logged.
pub async fn creation_entry<C: ConnectionTrait>(
    db: &C,
    target: TargetType,
    id: i64,
) -> Result<Option<log_entry::Model>> {
    for_element(target, id)
        .filter(log_entry::Column::EntryType.eq(LogEntryType::ElementCreated as i16))
        .order_by_asc(log_entry::Column::Timestamp)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Name of the user who created an element.
pub async fn creating_username<C: ConnectionTrait>(
    db: &C,
    target: TargetType,
    id: i64,
) -> Result<Option<String>> {
    Ok(creation_entry(db, target, id).await?.map(|e| e.username))
}

/// Name of the user who edited an element last.
pub async fn last_editing_username<C: ConnectionTrait>(
    db: &C,
    target: TargetType,
    id: i64,
) -> Result<Option<String>> {
    let entry = newest_first(
        for_element(target, id)
            .filter(log_entry::Column::EntryType.eq(LogEntryType::ElementEdited as i16)),
    )
    .one(db)
    .await?;
    Ok(entry.map(|e| e.username))
}

/// Filter for [`list_entries`]
#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    /// Only entries of this type
    pub entry_type: Option<LogEntryType>,
    /// Only entries at least this severe
    pub min_level: Option<LogLevel>,
    /// Only entries caused by this user name
    pub username: Option<String>,
    /// Only entries about this kind of element
    pub target_type: Option<TargetType>,
    /// Only entries at or after this instant
    pub since: Option<DateTime<Utc>>,
    /// Maximum number of entries
    pub limit: Option<u64>,
    /// Number of entries to skip
    pub offset: u64,
}

/// Lists log entries matching the filter, newest first.
pub async fn list_entries<C: ConnectionTrait>(
    db: &C,
    filter: &LogFilter,
) -> Result<Vec<log_entry::Model>> {
    let mut select = LogEntry::find();
    if let Some(entry_type) = filter.entry_type {
        select = select.filter(log_entry::Column::EntryType.eq(entry_type as i16));
    }
    if let Some(level) = filter.min_level {
        select = select.filter(log_entry::Column::Level.lte(level as i16));
    }
    if let Some(username) = &filter.username {
        select = select.filter(log_entry::Column::Username.eq(username.as_str()));
    }
    if let Some(target) = filter.target_type {
        select = select.filter(log_entry::Column::TargetType.eq(target as i16));
    }
    if let Some(since) = filter.since {
        select = select.filter(log_entry::Column::Timestamp.gte(since));
    }

    paginate(newest_first(select), filter.limit, filter.offset)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Deletes all entries older than `before`, returning how many were removed.
pub async fn delete_older_than<C: ConnectionTrait>(db: &C, before: DateTime<Utc>) -> Result<u64> {
    let result = LogEntry::delete_many()
        .filter(log_entry::Column::Timestamp.lt(before))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}
