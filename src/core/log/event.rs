//! Typed view of the `extra` column of a log entry.
//!
//! Each entry type stores its own data under short keys to keep the log table
//! compact. [`LogEvent`] converts between that representation and Rust values.

use super::types::{LogEntryType, LogLevel, TargetType};
use serde_json::{Map, Value, json};

/// Field snapshot as stored in the log (`field name -> value`)
pub type FieldData = Map<String, Value>;

/// What happened to the stock of a part lot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockAction {
    Add,
    Withdraw,
    Move,
}

impl StockAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Withdraw => "withdraw",
            Self::Move => "move",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "add" => Some(Self::Add),
            "withdraw" => Some(Self::Withdraw),
            "move" => Some(Self::Move),
            _ => None,
        }
    }
}

/// Decoded event data of a log entry
#[derive(Debug, Clone, PartialEq)]
pub enum LogEvent {
    UserLogin {
        ip: String,
    },
    UserLogout {
        ip: String,
    },
    UserNotAllowed {
        path: String,
    },
    Exception {
        exception_class: String,
        file: String,
        line: i64,
        message: String,
    },
    ElementCreated {
        instock: Option<f64>,
        comment: Option<String>,
    },
    ElementEdited {
        changed_fields: Vec<String>,
        old_data: Option<FieldData>,
        new_data: Option<FieldData>,
        comment: Option<String>,
    },
    ElementDeleted {
        old_name: String,
        old_data: Option<FieldData>,
        comment: Option<String>,
    },
    CollectionElementDeleted {
        collection: String,
        deleted_type: TargetType,
        deleted_id: i64,
        old_name: String,
    },
    ConfigChanged,
    LegacyInstockChanged {
        old_instock: i64,
        new_instock: i64,
        price: f64,
        comment: Option<String>,
    },
    DatabaseUpdated {
        old_version: String,
        new_version: String,
        success: bool,
    },
    SecurityEvent {
        event: String,
        ip: String,
    },
    PartStockChanged {
        action: StockAction,
        comment: String,
        old_stock: f64,
        new_stock: f64,
        old_total: f64,
        move_target: Option<i64>,
    },
}

fn opt_string(extra: &Map<String, Value>, key: &str) -> Option<String> {
    extra
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn string(extra: &Map<String, Value>, key: &str) -> String {
    extra
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn float(extra: &Map<String, Value>, key: &str) -> f64 {
    extra.get(key).and_then(Value::as_f64).unwrap_or_default()
}

fn object(extra: &Map<String, Value>, key: &str) -> Option<FieldData> {
    extra.get(key).and_then(Value::as_object).cloned()
}

fn put_comment(extra: &mut Map<String, Value>, comment: Option<&String>) {
    if let Some(comment) = comment {
        extra.insert("m".into(), Value::String(comment.clone()));
    }
}

impl LogEvent {
    /// Entry type this event is stored as
    #[must_use]
    pub const fn entry_type(&self) -> LogEntryType {
        match self {
            Self::UserLogin { .. } => LogEntryType::UserLogin,
            Self::UserLogout { .. } => LogEntryType::UserLogout,
            Self::UserNotAllowed { .. } => LogEntryType::UserNotAllowed,
            Self::Exception { .. } => LogEntryType::Exception,
            Self::ElementCreated { .. } => LogEntryType::ElementCreated,
            Self::ElementEdited { .. } => LogEntryType::ElementEdited,
            Self::ElementDeleted { .. } => LogEntryType::ElementDeleted,
            Self::CollectionElementDeleted { .. } => LogEntryType::CollectionElementDeleted,
            Self::ConfigChanged => LogEntryType::ConfigChanged,
            Self::LegacyInstockChanged { .. } => LogEntryType::LegacyInstockChanged,
            Self::DatabaseUpdated { .. } => LogEntryType::DatabaseUpdated,
            Self::SecurityEvent { .. } => LogEntryType::SecurityEvent,
            Self::PartStockChanged { .. } => LogEntryType::PartStockChanged,
        }
    }

    /// Severity the event is logged with
    #[must_use]
    pub const fn level(&self) -> LogLevel {
        match self {
            Self::UserNotAllowed { .. } => LogLevel::Warning,
            Self::Exception { .. } => LogLevel::Critical,
            Self::DatabaseUpdated { success: false, .. } => LogLevel::Error,
            Self::SecurityEvent { .. } => LogLevel::Notice,
            _ => LogLevel::Info,
        }
    }

    /// Old field values usable for time travel, if recorded
    #[must_use]
    pub const fn old_data(&self) -> Option<&FieldData> {
        match self {
            Self::ElementEdited { old_data, .. } | Self::ElementDeleted { old_data, .. } => {
                old_data.as_ref()
            }
            _ => None,
        }
    }

    /// New field values, if recorded
    #[must_use]
    pub const fn new_data(&self) -> Option<&FieldData> {
        match self {
            Self::ElementEdited { new_data, .. } => new_data.as_ref(),
            _ => None,
        }
    }

    /// Encodes the event into the JSON stored in the `extra` column.
    #[must_use]
    pub fn to_extra(&self) -> Value {
        let mut extra = Map::new();
        match self {
            Self::UserLogin { ip } | Self::UserLogout { ip } => {
                extra.insert("i".into(), json!(ip));
            }
            Self::UserNotAllowed { path } => {
                extra.insert("a".into(), json!(path));
            }
            Self::Exception {
                exception_class,
                file,
                line,
                message,
            } => {
                extra.insert("t".into(), json!(exception_class));
                extra.insert("f".into(), json!(file));
                extra.insert("l".into(), json!(line));
                extra.insert("s".into(), json!(message));
            }
            Self::ElementCreated { instock, comment } => {
                if let Some(instock) = instock {
                    extra.insert("i".into(), json!(instock));
                }
                put_comment(&mut extra, comment.as_ref());
            }
            Self::ElementEdited {
                changed_fields,
                old_data,
                new_data,
                comment,
            } => {
                if !changed_fields.is_empty() {
                    extra.insert("f".into(), json!(changed_fields));
                }
                if let Some(old_data) = old_data {
                    extra.insert("o".into(), Value::Object(old_data.clone()));
                }
                if let Some(new_data) = new_data {
                    extra.insert("n".into(), Value::Object(new_data.clone()));
                }
                put_comment(&mut extra, comment.as_ref());
            }
            Self::ElementDeleted {
                old_name,
                old_data,
                comment,
            } => {
                extra.insert("n".into(), json!(old_name));
                if let Some(old_data) = old_data {
                    extra.insert("o".into(), Value::Object(old_data.clone()));
                }
                put_comment(&mut extra, comment.as_ref());
            }
            Self::CollectionElementDeleted {
                collection,
                deleted_type,
                deleted_id,
                old_name,
            } => {
                extra.insert("n".into(), json!(collection));
                extra.insert("c".into(), json!(*deleted_type as i16));
                extra.insert("i".into(), json!(deleted_id));
                extra.insert("s".into(), json!(old_name));
            }
            Self::ConfigChanged => {}
            Self::LegacyInstockChanged {
                old_instock,
                new_instock,
                price,
                comment,
            } => {
                extra.insert("o".into(), json!(old_instock));
                extra.insert("n".into(), json!(new_instock));
                extra.insert("p".into(), json!(price));
                put_comment(&mut extra, comment.as_ref());
            }
            Self::DatabaseUpdated {
                old_version,
                new_version,
                success,
            } => {
                extra.insert("o".into(), json!(old_version));
                extra.insert("n".into(), json!(new_version));
                extra.insert("s".into(), json!(success));
            }
            Self::SecurityEvent { event, ip } => {
                extra.insert("e".into(), json!(event));
                extra.insert("i".into(), json!(ip));
            }
            Self::PartStockChanged {
                action,
                comment,
                old_stock,
                new_stock,
                old_total,
                move_target,
            } => {
                extra.insert("a".into(), json!(action.as_str()));
                extra.insert("c".into(), json!(comment));
                extra.insert("o".into(), json!(old_stock));
                extra.insert("n".into(), json!(new_stock));
                extra.insert("t".into(), json!(old_total));
                if let Some(target) = move_target {
                    extra.insert("m".into(), json!(target));
                }
            }
        }
        Value::Object(extra)
    }

    /// Decodes the `extra` column of an entry of the given type.
    ///
    /// Missing keys decode to empty values; only a non-object `extra` or an
    /// unknown collection element kind is rejected.
    pub fn from_extra(entry_type: LogEntryType, extra: &Value) -> Result<Self, String> {
        let empty = Map::new();
        let extra = match extra {
            Value::Object(map) => map,
            Value::Null => &empty,
            other => return Err(format!("extra data must be an object, got {other}")),
        };

        let event = match entry_type {
            LogEntryType::UserLogin => Self::UserLogin {
                ip: string(extra, "i"),
            },
            LogEntryType::UserLogout => Self::UserLogout {
                ip: string(extra, "i"),
            },
            LogEntryType::UserNotAllowed => Self::UserNotAllowed {
                path: string(extra, "a"),
            },
            LogEntryType::Exception => Self::Exception {
                exception_class: string(extra, "t"),
                file: string(extra, "f"),
                line: extra.get("l").and_then(Value::as_i64).unwrap_or_default(),
                message: string(extra, "s"),
            },
            LogEntryType::ElementCreated => Self::ElementCreated {
                instock: extra.get("i").and_then(Value::as_f64),
                comment: opt_string(extra, "m"),
            },
            LogEntryType::ElementEdited => Self::ElementEdited {
                changed_fields: extra
                    .get("f")
                    .and_then(Value::as_array)
                    .map(|fields| {
                        fields
                            .iter()
                            .filter_map(Value::as_str)
                            .map(String::from)
                            .collect()
                    })
                    .unwrap_or_default(),
                old_data: object(extra, "o"),
                new_data: object(extra, "n"),
                comment: opt_string(extra, "m"),
            },
            LogEntryType::ElementDeleted => Self::ElementDeleted {
                old_name: string(extra, "n"),
                old_data: object(extra, "o"),
                comment: opt_string(extra, "m"),
            },
            LogEntryType::CollectionElementDeleted => {
                let code = extra
                    .get("c")
                    .and_then(Value::as_i64)
                    .and_then(|c| i16::try_from(c).ok())
                    .unwrap_or_default();
                let deleted_type = TargetType::from_i16(code)
                    .filter(|t| *t != TargetType::None)
                    .ok_or_else(|| format!("unknown collection element kind {code}"))?;
                Self::CollectionElementDeleted {
                    collection: string(extra, "n"),
                    deleted_type,
                    deleted_id: extra.get("i").and_then(Value::as_i64).unwrap_or_default(),
                    old_name: string(extra, "s"),
                }
            }
            LogEntryType::ConfigChanged => Self::ConfigChanged,
            LogEntryType::LegacyInstockChanged => Self::LegacyInstockChanged {
                old_instock: extra.get("o").and_then(Value::as_i64).unwrap_or_default(),
                new_instock: extra.get("n").and_then(Value::as_i64).unwrap_or_default(),
                price: float(extra, "p"),
                comment: opt_string(extra, "m"),
            },
            LogEntryType::DatabaseUpdated => Self::DatabaseUpdated {
                old_version: string(extra, "o"),
                new_version: string(extra, "n"),
                success: extra.get("s").and_then(Value::as_bool).unwrap_or_default(),
            },
            LogEntryType::SecurityEvent => Self::SecurityEvent {
                event: string(extra, "e"),
                ip: string(extra, "i"),
            },
            LogEntryType::PartStockChanged => Self::PartStockChanged {
                action: extra
                    .get("a")
                    .and_then(Value::as_str)
                    .and_then(StockAction::from_name)
                    .ok_or_else(|| "missing stock action".to_string())?,
                comment: string(extra, "c"),
                old_stock: float(extra, "o"),
                new_stock: float(extra, "n"),
                old_total: float(extra, "t"),
                move_target: extra.get("m").and_then(Value::as_i64),
            },
        };

        Ok(event)
    }
}
