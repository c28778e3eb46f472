//! Event logger - writes log entries for changes to the database.
//!
//! The logger decides from its [`LoggingSettings`] whether an event is recorded
//! at all and how much field data goes with it. Element snapshots are taken
//! from the serde representation of the entity models; foreign-key columns are
//! stored in association form (`"category": {"@id": 3}`) so time travel can
//! restore them without knowing the column layout of older versions.

use super::event::{FieldData, LogEvent};
use super::types::{LogEntryType, TargetType};
use crate::{
    config::LoggingSettings,
    entities::{log_entry, user},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set};
use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::{debug, instrument};

/// Fields that never appear in logged snapshots
const EXCLUDED_FIELDS: &[&str] = &["id", "created_at", "last_modified", "password"];

/// Who caused the logged events
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogContext {
    /// ID of the acting user, None for anonymous access and system tasks
    pub user_id: Option<i64>,
    /// Name of the acting user
    pub username: String,
}

impl LogContext {
    /// Context for events not caused by a logged-in user
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            user_id: None,
            username: "anonymous".to_string(),
        }
    }

    /// Context for the command line maintenance tool
    #[must_use]
    pub fn cli() -> Self {
        Self {
            user_id: None,
            username: "cli".to_string(),
        }
    }

    /// Context for events caused by a user
    #[must_use]
    pub fn for_user(user: &user::Model) -> Self {
        Self {
            user_id: Some(user.id),
            username: user.name.clone(),
        }
    }
}

/// Converts a model into the JSON object used as snapshot.
///
/// # Errors
/// Returns an error if the model does not serialize into a JSON object.
pub fn snapshot<M: Serialize>(model: &M) -> Result<FieldData> {
    match serde_json::to_value(model)? {
        Value::Object(map) => Ok(map),
        other => Err(Error::Validation {
            message: format!("expected an object snapshot, got {other}"),
        }),
    }
}

/// Converts a raw snapshot into log form: excluded fields are dropped and
/// foreign-key columns become `{"@id": n}` (or null) under the association name.
#[must_use]
pub fn to_log_data(target: TargetType, data: &FieldData) -> FieldData {
    data.iter()
        .filter(|(field, _)| !EXCLUDED_FIELDS.contains(&field.as_str()))
        .map(|(field, value)| match target.association_for_column(field) {
            Some(association) => {
                let reference = value
                    .as_i64()
                    .map_or(Value::Null, |id| json!({ "@id": id }));
                (association.field.to_string(), reference)
            }
            None => (field.clone(), value.clone()),
        })
        .collect()
}

/// One changed field in log form
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    pub field: String,
    pub old: Value,
    pub new: Value,
}

/// Computes the fields that differ between two snapshots of the same element.
#[must_use]
pub fn compute_changeset(target: TargetType, old: &FieldData, new: &FieldData) -> Vec<FieldChange> {
    let old = to_log_data(target, old);
    let new = to_log_data(target, new);

    let mut changes: Vec<FieldChange> = new
        .iter()
        .filter_map(|(field, new_value)| {
            let old_value = old.get(field).unwrap_or(&Value::Null);
            (old_value != new_value).then(|| FieldChange {
                field: field.clone(),
                old: old_value.clone(),
                new: new_value.clone(),
            })
        })
        .collect();

    // Fields that vanished from the new snapshot count as changed to null
    changes.extend(
        old.iter()
            .filter(|(field, value)| !new.contains_key(*field) && !value.is_null())
            .map(|(field, value)| FieldChange {
                field: field.clone(),
                old: value.clone(),
                new: Value::Null,
            }),
    );

    changes
}

/// Writes events to the log table
#[derive(Debug, Clone, Default)]
pub struct EventLogger {
    settings: LoggingSettings,
}

impl EventLogger {
    #[must_use]
    pub const fn new(settings: LoggingSettings) -> Self {
        Self { settings }
    }

    #[must_use]
    pub const fn settings(&self) -> &LoggingSettings {
        &self.settings
    }

    /// Checks the level threshold and the type black/whitelists.
    #[must_use]
    pub fn should_be_added(&self, event: &LogEvent) -> bool {
        let entry_type: LogEntryType = event.entry_type();
        let name = entry_type.name();

        if event.level() as i16 > self.settings.min_level {
            return false;
        }
        if self.settings.blacklist.iter().any(|n| n == name) {
            return false;
        }
        self.settings.whitelist.is_empty() || self.settings.whitelist.iter().any(|n| n == name)
    }

    /// Records an event if the settings allow it, returning the stored entry.
    pub async fn log<C: ConnectionTrait>(
        &self,
        db: &C,
        context: &LogContext,
        target: Option<(TargetType, i64)>,
        event: LogEvent,
    ) -> Result<Option<log_entry::Model>> {
        self.log_at(db, context, target, event, Utc::now()).await
    }

    /// Records an event with an explicit timestamp.
    #[instrument(skip(self, db, event), fields(entry_type = %event.entry_type()))]
    pub async fn log_at<C: ConnectionTrait>(
        &self,
        db: &C,
        context: &LogContext,
        target: Option<(TargetType, i64)>,
        event: LogEvent,
        timestamp: DateTime<Utc>,
    ) -> Result<Option<log_entry::Model>> {
        if !self.should_be_added(&event) {
            debug!("Event filtered by logging settings");
            return Ok(None);
        }

        let (target_type, target_id) = target.unwrap_or((TargetType::None, 0));
        let entry = log_entry::ActiveModel {
            timestamp: Set(timestamp),
            level: Set(event.level() as i16),
            target_type: Set(target_type as i16),
            target_id: Set(target_id),
            entry_type: Set(event.entry_type() as i16),
            user_id: Set(context.user_id),
            username: Set(context.username.clone()),
            extra: Set(event.to_extra()),
            ..Default::default()
        };

        let entry = entry.insert(db).await?;
        debug!(id = entry.id, "Log entry written");
        Ok(Some(entry))
    }

    /// Records the creation of an element.
    pub async fn log_created<C: ConnectionTrait>(
        &self,
        db: &C,
        context: &LogContext,
        target: TargetType,
        id: i64,
        instock: Option<f64>,
    ) -> Result<Option<log_entry::Model>> {
        let event = LogEvent::ElementCreated {
            instock,
            comment: None,
        };
        self.log(db, context, Some((target, id)), event).await
    }

    /// Records an edit of an element. Nothing is written if no logged field changed.
    #[allow(clippy::too_many_arguments)]
    pub async fn log_edited<C, M>(
        &self,
        db: &C,
        context: &LogContext,
        target: TargetType,
        id: i64,
        old: &M,
        new: &M,
        comment: Option<String>,
    ) -> Result<Option<log_entry::Model>>
    where
        C: ConnectionTrait,
        M: Serialize,
    {
        let changes = compute_changeset(target, &snapshot(old)?, &snapshot(new)?);
        if changes.is_empty() {
            return Ok(None);
        }

        let changed_fields = if self.settings.save_changed_fields {
            changes.iter().map(|c| c.field.clone()).collect()
        } else {
            Vec::new()
        };
        let old_data = self.settings.save_old_data.then(|| {
            changes
                .iter()
                .map(|c| (c.field.clone(), c.old.clone()))
                .collect::<Map<_, _>>()
        });
        let new_data = self.settings.save_new_data.then(|| {
            changes
                .iter()
                .map(|c| (c.field.clone(), c.new.clone()))
                .collect::<Map<_, _>>()
        });

        let event = LogEvent::ElementEdited {
            changed_fields,
            old_data,
            new_data,
            comment,
        };
        self.log(db, context, Some((target, id)), event).await
    }

    /// Records the deletion of an element together with its complete last state.
    pub async fn log_deleted<C, M>(
        &self,
        db: &C,
        context: &LogContext,
        target: TargetType,
        id: i64,
        old_name: &str,
        old: &M,
    ) -> Result<Option<log_entry::Model>>
    where
        C: ConnectionTrait,
        M: Serialize,
    {
        let old_data = if self.settings.save_old_data {
            Some(to_log_data(target, &snapshot(old)?))
        } else {
            None
        };
        let event = LogEvent::ElementDeleted {
            old_name: old_name.to_string(),
            old_data,
            comment: None,
        };
        self.log(db, context, Some((target, id)), event).await
    }

    /// Records that an element was removed from a collection of its owner.
    pub async fn log_collection_element_deleted<C: ConnectionTrait>(
        &self,
        db: &C,
        context: &LogContext,
        owner: (TargetType, i64),
        collection: &str,
        deleted: (TargetType, i64),
        old_name: &str,
    ) -> Result<Option<log_entry::Model>> {
        let event = LogEvent::CollectionElementDeleted {
            collection: collection.to_string(),
            deleted_type: deleted.0,
            deleted_id: deleted.1,
            old_name: old_name.to_string(),
        };
        self.log(db, context, Some(owner), event).await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::setup_test_db;

    fn part_snapshot(name: &str, category_id: i64) -> FieldData {
        let value = json!({
            "id": 1,
            "name": name,
            "category_id": category_id,
            "footprint_id": null,
            "last_modified": "2024-01-01T00:00:00Z",
        });
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_to_log_data_converts_foreign_keys() {
        let data = to_log_data(TargetType::Part, &part_snapshot("BC547", 3));
        assert_eq!(data["category"], json!({"@id": 3}));
        assert_eq!(data["footprint"], Value::Null);
        assert_eq!(data["name"], json!("BC547"));
        assert!(!data.contains_key("id"));
        assert!(!data.contains_key("last_modified"));
        assert!(!data.contains_key("category_id"));
    }

    #[test]
    fn test_changeset_only_contains_differences() {
        let old = part_snapshot("BC547", 3);
        let mut new = part_snapshot("BC547B", 4);
        new.insert("last_modified".into(), json!("2024-02-01T00:00:00Z"));

        let changes = compute_changeset(TargetType::Part, &old, &new);
        let fields: Vec<&str> = changes.iter().map(|c| c.field.as_str()).collect();
        assert_eq!(changes.len(), 2);
        assert!(fields.contains(&"name"));
        assert!(fields.contains(&"category"));

        assert!(compute_changeset(TargetType::Part, &old, &old).is_empty());
    }

    #[test]
    fn test_filtering() {
        let settings = LoggingSettings {
            min_level: 5,
            blacklist: vec!["user_login".into()],
            ..LoggingSettings::default()
        };
        let logger = EventLogger::new(settings);

        assert!(!logger.should_be_added(&LogEvent::UserLogin { ip: String::new() }));
        // Info (6) is less severe than the threshold
        assert!(!logger.should_be_added(&LogEvent::ConfigChanged));
        assert!(logger.should_be_added(&LogEvent::UserNotAllowed { path: "/".into() }));

        let whitelisted = EventLogger::new(LoggingSettings {
            whitelist: vec!["element_edited".into()],
            ..LoggingSettings::default()
        });
        assert!(!whitelisted.should_be_added(&LogEvent::ConfigChanged));
    }

    #[tokio::test]
    async fn test_log_edited_respects_settings() -> Result<()> {
        let db = setup_test_db().await?;
        let logger = EventLogger::new(LoggingSettings {
            save_new_data: false,
            ..LoggingSettings::default()
        });
        let context = LogContext::cli();

        let old = part_snapshot("BC547", 3);
        let new = part_snapshot("BC548", 3);
        let entry = logger
            .log_edited(&db, &context, TargetType::Part, 1, &old, &new, None)
            .await?
            .unwrap();

        assert_eq!(entry.username, "cli");
        assert_eq!(entry.entry_type, LogEntryType::ElementEdited as i16);
        let event = LogEvent::from_extra(LogEntryType::ElementEdited, &entry.extra).unwrap();
        assert_eq!(event.old_data().unwrap()["name"], json!("BC547"));
        assert!(event.new_data().is_none());

        let unchanged = logger
            .log_edited(&db, &context, TargetType::Part, 1, &old, &old, None)
            .await?;
        assert!(unchanged.is_none());

        Ok(())
    }
}
