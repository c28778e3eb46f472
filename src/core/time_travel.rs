//! Time travel - reconstructs the state of an element at a past instant from
//! the event log.
//!
//! The live element is loaded and the old data of every edit entry at or after
//! the instant is applied newest first. Lots also undo the stock changes made
//! since then, including stock moved into them. Collection members deleted
//! since then are restored from their deletion entries, members created since
//! then are dropped. Associated elements are reverted the same way, each at
//! most once.
//! Nothing is written back to the database.

use crate::{
    config::TimeTravelSettings,
    core::log::{
        AssociationKind, FieldData, LogEntryType, LogEvent, TargetType, formatter,
        logger::snapshot, repository,
    },
    entities::{
        Attachment, AttachmentType, Category, Footprint, Group, Manufacturer, Orderdetail, Part,
        PartLot, Pricedetail, StorageLocation, Supplier, User, log_entry, orderdetail, part_lot,
        pricedetail,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::prelude::*;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::{
    collections::{BTreeMap, HashSet},
    future::Future,
    pin::Pin,
};
use tracing::{debug, instrument, warn};

/// Associations that are never followed
const SKIPPED_ASSOCIATIONS: &[&str] = &["parent", "children", "attachments"];

/// An element as it was at some past instant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevertedElement {
    pub target: TargetType,
    pub id: i64,
    /// Column values in the layout of the entity model
    pub data: FieldData,
    /// Reverted elements referenced by to-one associations
    pub to_one: BTreeMap<String, RevertedElement>,
    /// Reverted members of to-many collections
    pub to_many: BTreeMap<String, Vec<RevertedElement>>,
}

impl RevertedElement {
    fn new(target: TargetType, id: i64, data: FieldData) -> Self {
        Self {
            target,
            id,
            data,
            to_one: BTreeMap::new(),
            to_many: BTreeMap::new(),
        }
    }

    /// Modification date of the reverted state
    #[must_use]
    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.data
            .get("last_modified")
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Deserializes the reverted data into an entity model.
    ///
    /// # Errors
    /// Returns an error if the data does not match the model, e.g. when the
    /// logged data is from an older schema.
    pub fn into_model<M: DeserializeOwned>(self) -> Result<M> {
        Ok(serde_json::from_value(Value::Object(self.data))?)
    }
}

/// Converts logged field data back into column layout: to-one associations
/// become their foreign-key column, to-many associations are dropped.
#[must_use]
pub fn from_log_data(target: TargetType, data: &FieldData) -> FieldData {
    data.iter()
        .filter_map(|(field, value)| match target.association(field) {
            Some(association) => match association.kind {
                AssociationKind::ToOne { column } => {
                    let id = value.get("@id").cloned().unwrap_or(Value::Null);
                    Some((column.to_string(), id))
                }
                AssociationKind::ToMany { .. } => None,
            },
            None => Some((field.clone(), value.clone())),
        })
        .collect()
}

/// Applies the old data of an edit entry to `data`. Only fields the element
/// still has are replaced; `last_modified` becomes the entry's timestamp.
///
/// # Errors
/// Returns `Error::MalformedLogEntry` if the entry is not a decodable edit entry.
pub fn apply_entry(target: TargetType, data: &mut FieldData, entry: &log_entry::Model) -> Result<()> {
    let LogEvent::ElementEdited { old_data, .. } = formatter::decode_event(entry)? else {
        return Err(Error::MalformedLogEntry {
            id: entry.id,
            message: "not an edit entry".to_string(),
        });
    };
    let Some(old_data) = old_data else {
        warn!(entry = entry.id, "Edit entry has no old data, skipping");
        return Ok(());
    };

    for (field, value) in from_log_data(target, &old_data) {
        if let Some(slot) = data.get_mut(&field) {
            *slot = value;
        }
    }
    data.insert("last_modified".to_string(), serde_json::to_value(entry.timestamp)?);
    Ok(())
}

/// Undoes one stock change on the data of lot `lot_id`. The lot's own entries
/// carry its old amount; a move into the lot is subtracted again.
///
/// # Errors
/// Returns `Error::MalformedLogEntry` if the entry is not a decodable stock change.
pub fn apply_stock_change(lot_id: i64, data: &mut FieldData, entry: &log_entry::Model) -> Result<()> {
    let LogEvent::PartStockChanged {
        old_stock,
        new_stock,
        move_target,
        ..
    } = formatter::decode_event(entry)?
    else {
        return Err(Error::MalformedLogEntry {
            id: entry.id,
            message: "not a stock change entry".to_string(),
        });
    };

    let amount = if entry.target_id == lot_id {
        old_stock
    } else if move_target == Some(lot_id) {
        let current = data.get("amount").and_then(Value::as_f64).unwrap_or_default();
        current - (old_stock - new_stock)
    } else {
        return Ok(());
    };
    data.insert("amount".to_string(), Value::from(amount));
    data.insert("last_modified".to_string(), serde_json::to_value(entry.timestamp)?);
    Ok(())
}

async fn deleted_element_data<C: ConnectionTrait>(db: &C, target: TargetType, id: i64) -> Result<FieldData> {
    let entry = repository::undelete_data(db, target, id).await?;
    let LogEvent::ElementDeleted {
        old_data: Some(old_data),
        ..
    } = formatter::decode_event(&entry)?
    else {
        return Err(Error::UndeleteDataMissing {
            entity: target.entity_name(),
            id,
        });
    };

    let mut data = from_log_data(target, &old_data);
    data.insert("id".to_string(), Value::from(id));
    data.insert("created_at".to_string(), Value::Null);
    data.insert("last_modified".to_string(), serde_json::to_value(entry.timestamp)?);
    Ok(data)
}

/// Rebuilds a deleted element from its most recent deletion entry. The
/// element keeps its ID; its creation date is unknown.
///
/// # Errors
/// Returns `Error::UndeleteDataMissing` if no deletion entry with old data exists.
pub async fn undelete<C: ConnectionTrait>(db: &C, target: TargetType, id: i64) -> Result<RevertedElement> {
    let data = deleted_element_data(db, target, id).await?;
    Ok(RevertedElement::new(target, id, data))
}

macro_rules! load_snapshot {
    ($db:expr, $entity:ident, $id:expr) => {
        match $entity::find_by_id($id).one($db).await? {
            Some(model) => Some(snapshot(&model)?),
            None => None,
        }
    };
}

async fn load_element<C: ConnectionTrait>(db: &C, target: TargetType, id: i64) -> Result<Option<FieldData>> {
    let data = match target {
        TargetType::None => None,
        TargetType::User => load_snapshot!(db, User, id),
        TargetType::Attachment => load_snapshot!(db, Attachment, id),
        TargetType::AttachmentType => load_snapshot!(db, AttachmentType, id),
        TargetType::Category => load_snapshot!(db, Category, id),
        TargetType::Footprint => load_snapshot!(db, Footprint, id),
        TargetType::Group => load_snapshot!(db, Group, id),
        TargetType::Manufacturer => load_snapshot!(db, Manufacturer, id),
        TargetType::Part => load_snapshot!(db, Part, id),
        TargetType::StorageLocation => load_snapshot!(db, StorageLocation, id),
        TargetType::Supplier => load_snapshot!(db, Supplier, id),
        TargetType::PartLot => load_snapshot!(db, PartLot, id),
        TargetType::Orderdetail => load_snapshot!(db, Orderdetail, id),
        TargetType::Pricedetail => load_snapshot!(db, Pricedetail, id),
    };
    Ok(data)
}

macro_rules! load_members {
    ($db:expr, $entity:ident, $column:expr, $owner:expr) => {
        $entity::find()
            .filter($column.eq($owner))
            .all($db)
            .await?
            .into_iter()
            .map(|model| -> Result<(i64, FieldData)> { Ok((model.id, snapshot(&model)?)) })
            .collect::<Result<Vec<_>>>()?
    };
}

/// Live members of a to-many collection
async fn collection_members<C: ConnectionTrait>(
    db: &C,
    member: TargetType,
    owner_id: i64,
) -> Result<Vec<(i64, FieldData)>> {
    let mut members = match member {
        TargetType::PartLot => load_members!(db, PartLot, part_lot::Column::PartId, owner_id),
        TargetType::Orderdetail => load_members!(db, Orderdetail, orderdetail::Column::PartId, owner_id),
        TargetType::Pricedetail => {
            load_members!(db, Pricedetail, pricedetail::Column::OrderdetailId, owner_id)
        }
        other => {
            debug!(member = %other, "Collection is not followed");
            Vec::new()
        }
    };
    members.sort_by_key(|(id, _)| *id);
    Ok(members)
}

type RevertFuture<'s> = Pin<Box<dyn Future<Output = Result<RevertedElement>> + 's>>;

struct Reverter<'a, C> {
    db: &'a C,
    timestamp: DateTime<Utc>,
    max_collection_size: usize,
    visited: HashSet<(TargetType, i64)>,
}

impl<C: ConnectionTrait> Reverter<'_, C> {
    fn revert<'s>(&'s mut self, target: TargetType, id: i64, data: FieldData) -> RevertFuture<'s> {
        Box::pin(async move {
            self.visited.insert((target, id));
            let mut element = RevertedElement::new(target, id, data);
            let mut restored: BTreeMap<String, Vec<(i64, FieldData)>> = BTreeMap::new();

            let mut entries = repository::time_travel_data(self.db, target, id, self.timestamp).await?;
            if target == TargetType::PartLot {
                entries.extend(repository::stock_changes_since(self.db, id, self.timestamp).await?);
                entries.sort_by(|a, b| (b.timestamp, b.id).cmp(&(a.timestamp, a.id)));
            }

            for entry in entries {
                if entry.entry_type == LogEntryType::ElementEdited as i16 {
                    apply_entry(target, &mut element.data, &entry)?;
                    continue;
                }
                if entry.entry_type == LogEntryType::PartStockChanged as i16 {
                    apply_stock_change(id, &mut element.data, &entry)?;
                    continue;
                }
                if let LogEvent::CollectionElementDeleted {
                    collection,
                    deleted_type,
                    deleted_id,
                    ..
                } = formatter::decode_event(&entry)?
                {
                    match deleted_element_data(self.db, deleted_type, deleted_id).await {
                        Ok(data) => restored.entry(collection).or_default().push((deleted_id, data)),
                        Err(Error::UndeleteDataMissing { .. }) => {
                            warn!(%deleted_type, deleted_id, "Deleted collection element cannot be restored");
                        }
                        Err(e) => return Err(e),
                    }
                }
            }

            for association in target.associations() {
                if SKIPPED_ASSOCIATIONS.contains(&association.field) {
                    continue;
                }
                match association.kind {
                    AssociationKind::ToOne { column } => {
                        self.revert_to_one(&mut element, association.field, association.target, column)
                            .await?;
                    }
                    AssociationKind::ToMany { .. } => {
                        let deleted = restored.remove(association.field).unwrap_or_default();
                        self.revert_to_many(&mut element, association.field, association.target, deleted)
                            .await?;
                    }
                }
            }
            Ok(element)
        })
    }

    async fn revert_to_one(
        &mut self,
        element: &mut RevertedElement,
        field: &str,
        target: TargetType,
        column: &str,
    ) -> Result<()> {
        if element.last_modified().is_some_and(|modified| modified <= self.timestamp) {
            return Ok(());
        }
        let Some(id) = element.data.get(column).and_then(Value::as_i64) else {
            return Ok(());
        };
        if self.visited.contains(&(target, id)) {
            return Ok(());
        }

        let data = match load_element(self.db, target, id).await? {
            Some(data) => data,
            None => match deleted_element_data(self.db, target, id).await {
                Ok(data) => data,
                Err(Error::UndeleteDataMissing { .. }) => return Ok(()),
                Err(e) => return Err(e),
            },
        };
        if !repository::element_existed_at(self.db, target, id, self.timestamp).await? {
            element.data.insert(column.to_string(), Value::Null);
            return Ok(());
        }

        let reverted = self.revert(target, id, data).await?;
        element.to_one.insert(field.to_string(), reverted);
        Ok(())
    }

    async fn revert_to_many(
        &mut self,
        element: &mut RevertedElement,
        field: &str,
        target: TargetType,
        restored: Vec<(i64, FieldData)>,
    ) -> Result<()> {
        let mut members = collection_members(self.db, target, element.id).await?;
        for (id, data) in restored {
            if !members.iter().any(|(member_id, _)| *member_id == id) {
                members.push((id, data));
            }
        }
        if members.len() > self.max_collection_size {
            debug!(field, size = members.len(), "Collection too large to revert");
            return Ok(());
        }

        let mut reverted = Vec::with_capacity(members.len());
        for (id, data) in members {
            if self.visited.contains(&(target, id)) {
                continue;
            }
            if !repository::element_existed_at(self.db, target, id, self.timestamp).await? {
                continue;
            }
            reverted.push(self.revert(target, id, data).await?);
        }
        element.to_many.insert(field.to_string(), reverted);
        Ok(())
    }
}

/// Reconstructs an element and its associations as they were at `timestamp`.
///
/// # Errors
/// Returns `Error::NotExistingAtTimestamp` if the element was created after
/// `timestamp` and `Error::NotFound` if it does not exist anymore.
#[instrument(skip(db, settings))]
pub async fn revert_to_timestamp<C: ConnectionTrait>(
    db: &C,
    settings: &TimeTravelSettings,
    target: TargetType,
    id: i64,
    timestamp: DateTime<Utc>,
) -> Result<RevertedElement> {
    let entity = target.entity_name();
    if !repository::element_existed_at(db, target, id, timestamp).await? {
        return Err(Error::NotExistingAtTimestamp { entity, id });
    }
    let data = load_element(db, target, id)
        .await?
        .ok_or(Error::NotFound { entity, id })?;

    let mut reverter = Reverter {
        db,
        timestamp,
        max_collection_size: settings.max_collection_size,
        visited: HashSet::new(),
    };
    reverter.revert(target, id, data).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::config::LoggingSettings;
    use crate::core::log::{EventLogger, LogContext};
    use crate::core::part::{self, NewLot, NewPart, PartUpdate};
    use crate::core::structural;
    use crate::entities::{part as part_entity, part_lot as lot_entity};
    use crate::test_utils::{create_test_category, setup_test_db};
    use chrono::Duration;
    use serde_json::json;

    async fn logged_part(db: &DatabaseConnection, name: &str) -> Result<part_entity::Model> {
        let category = create_test_category(db, "Resistors").await?;
        let data = NewPart {
            name: name.to_string(),
            category_id: category.id,
            ..NewPart::default()
        };
        part::create_part(db, &EventLogger::default(), &LogContext::cli(), data).await
    }

    #[test]
    fn test_from_log_data() {
        let logged = json!({
            "name": "10k",
            "category": {"@id": 4},
            "footprint": null,
            "part_lots": [{"@id": 1}]
        });
        let data = from_log_data(TargetType::Part, logged.as_object().unwrap());
        assert_eq!(data["name"], "10k");
        assert_eq!(data["category_id"], 4);
        assert_eq!(data["footprint_id"], Value::Null);
        assert!(!data.contains_key("part_lots"));
    }

    #[tokio::test]
    async fn test_apply_entry() -> Result<()> {
        let db = setup_test_db().await?;
        let mut old_data = FieldData::new();
        old_data.insert("name".into(), json!("Old"));
        old_data.insert("category".into(), json!({"@id": 7}));
        old_data.insert("removed_column".into(), json!(1));
        let event = LogEvent::ElementEdited {
            changed_fields: vec!["name".into(), "category".into()],
            old_data: Some(old_data),
            new_data: None,
            comment: None,
        };
        let entry = EventLogger::default()
            .log(&db, &LogContext::cli(), Some((TargetType::Part, 1)), event)
            .await?
            .unwrap();

        let mut data = json!({"name": "New", "category_id": 3, "last_modified": null})
            .as_object()
            .cloned()
            .unwrap();
        apply_entry(TargetType::Part, &mut data, &entry)?;
        assert_eq!(data["name"], "Old");
        assert_eq!(data["category_id"], 7);
        assert!(!data.contains_key("removed_column"));
        assert_eq!(data["last_modified"], serde_json::to_value(entry.timestamp)?);
        Ok(())
    }

    #[tokio::test]
    async fn test_revert_edits() -> Result<()> {
        let db = setup_test_db().await?;
        let logger = EventLogger::default();
        let part = logged_part(&db, "BC547").await?;
        let before_edit = Utc::now();

        let update = PartUpdate {
            name: Some("BC547B".into()),
            description: Some("NPN".into()),
            ..PartUpdate::default()
        };
        part::update_part(&db, &logger, &LogContext::cli(), part.id, update).await?;

        let reverted =
            revert_to_timestamp(&db, &TimeTravelSettings::default(), TargetType::Part, part.id, before_edit)
                .await?;
        assert!(reverted.last_modified().unwrap() >= before_edit);
        let model: part_entity::Model = reverted.into_model()?;
        assert_eq!(model.name, "BC547");
        assert_eq!(model.description, "");
        assert_eq!(model.id, part.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_revert_restores_deleted_lots() -> Result<()> {
        let db = setup_test_db().await?;
        let logger = EventLogger::default();
        let context = LogContext::cli();
        let part = logged_part(&db, "100nF").await?;
        let kept = part::add_lot(&db, &logger, &context, part.id, NewLot { amount: 5.0, ..NewLot::default() }).await?;
        let lot = NewLot {
            description: "Reel".into(),
            amount: 4000.0,
            ..NewLot::default()
        };
        let removed = part::add_lot(&db, &logger, &context, part.id, lot).await?;
        let before_changes = Utc::now();

        part::delete_lot(&db, &logger, &context, removed.id).await?;
        part::add_lot(&db, &logger, &context, part.id, NewLot { amount: 1.0, ..NewLot::default() }).await?;

        let reverted = revert_to_timestamp(
            &db,
            &TimeTravelSettings::default(),
            TargetType::Part,
            part.id,
            before_changes,
        )
        .await?;
        let lots = &reverted.to_many["part_lots"];
        let ids: Vec<i64> = lots.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![kept.id, removed.id]);

        let restored: lot_entity::Model = lots[1].clone().into_model()?;
        assert_eq!(restored.description, "Reel");
        assert_eq!(restored.amount, 4000.0);
        assert_eq!(restored.part_id, part.id);
        assert!(restored.created_at.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_revert_undoes_stock_changes() -> Result<()> {
        let db = setup_test_db().await?;
        let logger = EventLogger::default();
        let context = LogContext::cli();
        let part = logged_part(&db, "10k").await?;
        let first = part::add_lot(&db, &logger, &context, part.id, NewLot { amount: 10.0, ..NewLot::default() }).await?;
        let second = part::add_lot(&db, &logger, &context, part.id, NewLot { amount: 2.0, ..NewLot::default() }).await?;
        let before = Utc::now();

        part::withdraw(&db, &logger, &context, first.id, 3.0, "").await?;
        part::move_stock(&db, &logger, &context, (first.id, second.id), 4.0, "").await?;
        part::add_stock(&db, &logger, &context, second.id, 1.0, "").await?;

        let settings = TimeTravelSettings::default();
        let reverted_first: lot_entity::Model =
            revert_to_timestamp(&db, &settings, TargetType::PartLot, first.id, before)
                .await?
                .into_model()?;
        assert_eq!(reverted_first.amount, 10.0);
        let reverted_second = revert_to_timestamp(&db, &settings, TargetType::PartLot, second.id, before).await?;
        assert!(reverted_second.last_modified().unwrap() >= before);
        let reverted_second: lot_entity::Model = reverted_second.into_model()?;
        assert_eq!(reverted_second.amount, 2.0);

        let reverted_part = revert_to_timestamp(&db, &settings, TargetType::Part, part.id, before).await?;
        let amounts: Vec<f64> = reverted_part.to_many["part_lots"]
            .iter()
            .map(|lot| lot.data["amount"].as_f64().unwrap())
            .collect();
        assert_eq!(amounts, vec![10.0, 2.0]);
        Ok(())
    }

    #[tokio::test]
    async fn test_follows_category_of_edited_part() -> Result<()> {
        let db = setup_test_db().await?;
        let logger = EventLogger::default();
        let context = LogContext::cli();
        let settings = TimeTravelSettings::default();
        let part = logged_part(&db, "BC547").await?;
        let before = Utc::now();

        structural::rename_category(&db, &logger, &context, part.category_id, "Transistors").await?;
        let untouched = revert_to_timestamp(&db, &settings, TargetType::Part, part.id, before).await?;
        assert!(untouched.to_one.is_empty());

        let update = PartUpdate {
            description: Some("NPN".into()),
            ..PartUpdate::default()
        };
        part::update_part(&db, &logger, &context, part.id, update).await?;
        let reverted = revert_to_timestamp(&db, &settings, TargetType::Part, part.id, before).await?;
        let category = &reverted.to_one["category"];
        assert_eq!(category.id, part.category_id);
        assert_eq!(category.data["name"], "Resistors");
        Ok(())
    }

    #[tokio::test]
    async fn test_reference_to_later_element_is_cleared() -> Result<()> {
        let db = setup_test_db().await?;
        let context = LogContext::cli();
        let part = logged_part(&db, "LM7805").await?;
        let before = Utc::now();

        let later = structural::create_category(&db, &EventLogger::default(), &context, "Regulators", None).await?;
        let without_old_data = EventLogger::new(LoggingSettings {
            save_old_data: false,
            ..LoggingSettings::default()
        });
        let update = PartUpdate {
            category_id: Some(later.id),
            ..PartUpdate::default()
        };
        part::update_part(&db, &without_old_data, &context, part.id, update).await?;

        let reverted =
            revert_to_timestamp(&db, &TimeTravelSettings::default(), TargetType::Part, part.id, before).await?;
        assert_eq!(reverted.data["category_id"], Value::Null);
        assert!(!reverted.to_one.contains_key("category"));
        Ok(())
    }

    #[tokio::test]
    async fn test_part_and_lot_are_reverted_once() -> Result<()> {
        let db = setup_test_db().await?;
        let logger = EventLogger::default();
        let context = LogContext::cli();
        let settings = TimeTravelSettings::default();
        let part = logged_part(&db, "LM317").await?;
        let lot = part::add_lot(&db, &logger, &context, part.id, NewLot { amount: 100.0, ..NewLot::default() }).await?;
        let before = Utc::now();
        part::withdraw(&db, &logger, &context, lot.id, 60.0, "").await?;

        let reverted_lot = revert_to_timestamp(&db, &settings, TargetType::PartLot, lot.id, before).await?;
        assert_eq!(reverted_lot.data["amount"], 100.0);
        let owner = &reverted_lot.to_one["part"];
        assert_eq!(owner.id, part.id);
        assert!(owner.to_many["part_lots"].is_empty());

        let update = PartUpdate {
            name: Some("LM317T".into()),
            ..PartUpdate::default()
        };
        part::update_part(&db, &logger, &context, part.id, update).await?;
        let reverted_part = revert_to_timestamp(&db, &settings, TargetType::Part, part.id, before).await?;
        let lots = &reverted_part.to_many["part_lots"];
        assert_eq!(lots.len(), 1);
        assert_eq!(lots[0].data["amount"], 100.0);
        assert!(!lots[0].to_one.contains_key("part"));
        Ok(())
    }

    #[tokio::test]
    async fn test_collection_size_limit() -> Result<()> {
        let db = setup_test_db().await?;
        let logger = EventLogger::default();
        let part = logged_part(&db, "LED").await?;
        for _ in 0..3 {
            part::add_lot(&db, &logger, &LogContext::cli(), part.id, NewLot::default()).await?;
        }
        let settings = TimeTravelSettings {
            max_collection_size: 2,
        };
        let reverted = revert_to_timestamp(&db, &settings, TargetType::Part, part.id, Utc::now()).await?;
        assert!(!reverted.to_many.contains_key("part_lots"));
        assert!(reverted.to_many.contains_key("orderdetails"));
        Ok(())
    }

    #[tokio::test]
    async fn test_not_existing_at_timestamp() -> Result<()> {
        let db = setup_test_db().await?;
        let before = Utc::now() - Duration::seconds(10);
        let part = logged_part(&db, "NE555").await?;

        let result =
            revert_to_timestamp(&db, &TimeTravelSettings::default(), TargetType::Part, part.id, before).await;
        assert!(matches!(result, Err(Error::NotExistingAtTimestamp { entity: "Part", .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_undelete() -> Result<()> {
        let db = setup_test_db().await?;
        let part = logged_part(&db, "ATmega328").await?;

        let missing = undelete(&db, TargetType::Part, part.id).await;
        assert!(matches!(missing, Err(Error::UndeleteDataMissing { .. })));

        part::delete_part(&db, &EventLogger::default(), &LogContext::cli(), part.id).await?;
        let restored: part_entity::Model = undelete(&db, TargetType::Part, part.id).await?.into_model()?;
        assert_eq!(restored.id, part.id);
        assert_eq!(restored.name, "ATmega328");
        assert_eq!(restored.category_id, part.category_id);
        assert!(restored.created_at.is_none());
        Ok(())
    }
}
