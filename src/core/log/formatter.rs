//! Human-readable rendering of log entries.

use super::diff::{FormattedDiff, format_diff};
use super::event::{LogEvent, StockAction};
use super::types::{LogEntryType, LogLevel, TargetType};
use crate::{
    entities::log_entry,
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::net::IpAddr;

/// Zeroes the host part of an IP address: the last octet of IPv4 addresses and
/// the last 80 bits of IPv6 addresses. Unparsable input is returned unchanged.
#[must_use]
pub fn anonymize_ip(ip: &str) -> String {
    match ip.parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => {
            let [a, b, c, _] = v4.octets();
            IpAddr::from([a, b, c, 0]).to_string()
        }
        Ok(IpAddr::V6(v6)) => {
            let mut segments = v6.segments();
            for segment in &mut segments[3..] {
                *segment = 0;
            }
            IpAddr::from(segments).to_string()
        }
        Err(_) => ip.to_string(),
    }
}

/// Renders one logged field value.
#[must_use]
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => DateTime::parse_from_rfc3339(s).map_or_else(
            |_| s.clone(),
            |dt| {
                dt.with_timezone(&Utc)
                    .format("%Y-%m-%d %H:%M:%S UTC")
                    .to_string()
            },
        ),
        Value::Array(items) => items.iter().map(format_value).collect::<Vec<_>>().join(", "),
        Value::Object(map) => match map.get("@id").and_then(Value::as_i64) {
            Some(id) => format!("#{id}"),
            None => {
                let fields: Vec<String> = map
                    .iter()
                    .map(|(k, v)| format!("{k}: {}", format_value(v)))
                    .collect();
                format!("{{{}}}", fields.join(", "))
            }
        },
    }
}

fn with_comment(mut text: String, comment: Option<&String>) -> String {
    if let Some(comment) = comment {
        if !text.is_empty() {
            text.push_str("; ");
        }
        text.push_str("Comment: ");
        text.push_str(comment);
    }
    text
}

/// Decodes the event stored in a log entry.
///
/// # Errors
/// Returns `Error::MalformedLogEntry` for unknown entry types or undecodable extra data.
pub fn decode_event(entry: &log_entry::Model) -> Result<LogEvent> {
    let entry_type =
        LogEntryType::from_i16(entry.entry_type).ok_or_else(|| Error::MalformedLogEntry {
            id: entry.id,
            message: format!("unknown entry type {}", entry.entry_type),
        })?;
    LogEvent::from_extra(entry_type, &entry.extra)
        .map_err(|message| Error::MalformedLogEntry { id: entry.id, message })
}

/// Summarises the extra data of an event in one line.
#[must_use]
pub fn format_extra(event: &LogEvent) -> String {
    match event {
        LogEvent::UserLogin { ip } | LogEvent::UserLogout { ip } => {
            format!("IP: {}", anonymize_ip(ip))
        }
        LogEvent::UserNotAllowed { path } => format!("Access denied: {path}"),
        LogEvent::Exception {
            exception_class,
            file,
            line,
            message,
        } => format!("{exception_class}: {message} ({file}:{line})"),
        LogEvent::ElementCreated { instock, comment } => with_comment(
            instock.map_or_else(String::new, |i| format!("Initial stock: {i}")),
            comment.as_ref(),
        ),
        LogEvent::ElementEdited {
            changed_fields,
            comment,
            ..
        } => with_comment(
            if changed_fields.is_empty() {
                String::new()
            } else {
                format!("Changed fields: {}", changed_fields.join(", "))
            },
            comment.as_ref(),
        ),
        LogEvent::ElementDeleted {
            old_name, comment, ..
        } => with_comment(format!("Old name: {old_name}"), comment.as_ref()),
        LogEvent::CollectionElementDeleted {
            collection,
            deleted_type,
            deleted_id,
            old_name,
        } => format!("Collection: {collection}; Deleted: {deleted_type} #{deleted_id} ({old_name})"),
        LogEvent::ConfigChanged => String::new(),
        LogEvent::LegacyInstockChanged {
            old_instock,
            new_instock,
            price,
            comment,
        } => with_comment(
            format!("{old_instock} → {new_instock} (price {price:.2})"),
            comment.as_ref(),
        ),
        LogEvent::DatabaseUpdated {
            old_version,
            new_version,
            success,
        } => format!(
            "{old_version} → {new_version} ({})",
            if *success { "success" } else { "failed" }
        ),
        LogEvent::SecurityEvent { event, ip } => format!("{event}, IP: {}", anonymize_ip(ip)),
        LogEvent::PartStockChanged {
            action,
            comment,
            old_stock,
            new_stock,
            old_total,
            move_target,
        } => {
            let verb = match action {
                StockAction::Add => "Added",
                StockAction::Withdraw => "Withdrawn",
                StockAction::Move => "Moved",
            };
            let mut text = format!(
                "{verb}: {old_stock} → {new_stock} (total before: {old_total})"
            );
            if let Some(target) = move_target {
                text.push_str(&format!(" to lot #{target}"));
            }
            with_comment(text, (!comment.is_empty()).then_some(comment))
        }
    }
}

/// One field of an edit, rendered for display
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChangeView {
    pub field: String,
    pub old: Option<String>,
    pub new: Option<String>,
    pub diff: Option<FormattedDiff>,
}

/// Renders the changed fields of an edit event with old value, new value and diff.
#[must_use]
pub fn format_field_changes(event: &LogEvent) -> Vec<FieldChangeView> {
    let LogEvent::ElementEdited {
        changed_fields,
        old_data,
        new_data,
        ..
    } = event
    else {
        return Vec::new();
    };

    let mut fields: Vec<String> = changed_fields.clone();
    for data in [old_data, new_data].into_iter().flatten() {
        for key in data.keys() {
            if !fields.contains(key) {
                fields.push(key.clone());
            }
        }
    }

    fields
        .into_iter()
        .map(|field| {
            let old = old_data.as_ref().and_then(|d| d.get(&field));
            let new = new_data.as_ref().and_then(|d| d.get(&field));
            let diff = old.zip(new).and_then(|(o, n)| format_diff(o, n));
            FieldChangeView {
                old: old.map(format_value),
                new: new.map(format_value),
                diff,
                field,
            }
        })
        .collect()
}

/// Renders a log entry as a single table line.
///
/// # Errors
/// Returns `Error::MalformedLogEntry` if the entry can not be decoded.
pub fn format_entry_line(entry: &log_entry::Model) -> Result<String> {
    let event = decode_event(entry)?;
    let level = LogLevel::from_i16(entry.level).map_or("?", LogLevel::as_str);
    let target = TargetType::from_i16(entry.target_type)
        .filter(|t| *t != TargetType::None)
        .map_or_else(String::new, |t| format!("{t} #{}", entry.target_id));

    Ok(format!(
        "{:>6} {} {:<9} {:<26} {:<12} {:<20} {}",
        entry.id,
        entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
        level,
        event.entry_type().name(),
        entry.username,
        target,
        format_extra(&event)
    ))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use super::super::event::FieldData;
    use serde_json::json;

    #[test]
    fn test_anonymize_ip() {
        assert_eq!(anonymize_ip("192.168.10.42"), "192.168.10.0");
        assert_eq!(anonymize_ip("2001:db8:85a3:8d3:1319:8a2e:370:7344"), "2001:db8:85a3::");
        assert_eq!(anonymize_ip("not an ip"), "not an ip");
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(&json!(null)), "null");
        assert_eq!(format_value(&json!(true)), "true");
        assert_eq!(format_value(&json!({"@id": 4})), "#4");
        assert_eq!(format_value(&json!("2024-03-01T12:30:00Z")), "2024-03-01 12:30:00 UTC");
        assert_eq!(format_value(&json!(["a", 1])), "a, 1");
        assert_eq!(format_value(&json!("plain")), "plain");
    }

    #[test]
    fn test_format_extra() {
        let edited = LogEvent::ElementEdited {
            changed_fields: vec!["name".into(), "description".into()],
            old_data: None,
            new_data: None,
            comment: Some("Fixed typo".into()),
        };
        assert_eq!(
            format_extra(&edited),
            "Changed fields: name, description; Comment: Fixed typo"
        );

        let login = LogEvent::UserLogin {
            ip: "10.1.2.3".into(),
        };
        assert_eq!(format_extra(&login), "IP: 10.1.2.0");

        let stock = LogEvent::PartStockChanged {
            action: StockAction::Withdraw,
            comment: String::new(),
            old_stock: 10.0,
            new_stock: 7.0,
            old_total: 12.0,
            move_target: None,
        };
        assert_eq!(format_extra(&stock), "Withdrawn: 10 → 7 (total before: 12)");
    }

    #[test]
    fn test_format_field_changes() {
        let mut old = FieldData::new();
        old.insert("name".into(), json!("BC547"));
        old.insert("min_amount".into(), json!(5.0));
        let mut new = FieldData::new();
        new.insert("name".into(), json!("BC547B"));
        new.insert("min_amount".into(), json!(10.0));

        let event = LogEvent::ElementEdited {
            changed_fields: vec!["name".into(), "min_amount".into()],
            old_data: Some(old),
            new_data: Some(new),
            comment: None,
        };
        let views = format_field_changes(&event);
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].field, "name");
        assert_eq!(views[0].old.as_deref(), Some("BC547"));
        assert_eq!(
            views[1].diff,
            Some(FormattedDiff::Numeric { difference: 5.0 })
        );

        assert!(format_field_changes(&LogEvent::ConfigChanged).is_empty());
    }
}
