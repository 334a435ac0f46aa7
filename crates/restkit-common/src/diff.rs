//! Field-level change tracking between a stored record and incoming data.
//!
//! Records are JSON objects. Only keys present in both the record and the
//! input are compared; input keys the record does not have are ignored.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

/// Old and new value of one changed field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldChange {
    /// Stored value.
    pub from: Value,
    /// Incoming value.
    pub to: Value,
}

/// Changed fields keyed by name.
pub type Changes = BTreeMap<String, FieldChange>;

/// Split view of a change set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diff {
    /// Stored values of the changed fields.
    pub from: Map<String, Value>,
    /// Incoming values of the changed fields.
    pub to: Map<String, Value>,
    /// Per-field pairs.
    pub changes: Changes,
}

/// Fields whose incoming value differs from the stored one.
#[must_use]
pub fn diff(record: &Map<String, Value>, input: &Map<String, Value>) -> Changes {
    input
        .iter()
        .filter_map(|(name, incoming)| {
            let stored = record.get(name)?;
            (stored != incoming).then(|| {
                (
                    name.clone(),
                    FieldChange {
                        from: stored.clone(),
                        to: incoming.clone(),
                    },
                )
            })
        })
        .collect()
}

/// Same as [`diff`], also split into `from` and `to` maps.
#[must_use]
pub fn get_diff(record: &Map<String, Value>, input: &Map<String, Value>) -> Diff {
    let changes = diff(record, input);
    let mut result = Diff::default();
    for (name, change) in &changes {
        result.from.insert(name.clone(), change.from.clone());
        result.to.insert(name.clone(), change.to.clone());
    }
    result.changes = changes;
    result
}

/// JSON rendering of the change set for audit logs; empty when nothing
/// changed.
#[must_use]
pub fn make_change_message(record: &Map<String, Value>, input: &Map<String, Value>) -> String {
    let changes = diff(record, input);
    if changes.is_empty() {
        return String::new();
    }
    serde_json::to_string(&changes).unwrap_or_default()
}

/// Write `to` into `record` so an in-memory copy matches what was persisted.
pub fn apply_changes(record: &mut Map<String, Value>, to: &Map<String, Value>) {
    for (name, value) in to {
        record.insert(name.clone(), value.clone());
    }
}

/// Subset of `data` restricted to `allowed` field names.
#[must_use]
pub fn valid_fields(allowed: &[&str], data: &Map<String, Value>) -> Map<String, Value> {
    allowed
        .iter()
        .filter_map(|name| data.get(*name).map(|value| ((*name).to_string(), value.clone())))
        .collect()
}

/// `{db_field: value}` when `data[data_field]` is present and truthy, else
/// an empty map.
#[must_use]
pub fn update_data(data_field: &str, db_field: &str, data: &Map<String, Value>) -> Map<String, Value> {
    let mut update = Map::new();
    if let Some(value) = data.get(data_field).filter(|value| is_truthy(value)) {
        update.insert(db_field.to_string(), value.clone());
    }
    update
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|number| number.abs() > 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use restkit_test_support::json_object;
    use serde_json::json;

    #[test]
    fn diff_reports_only_known_changed_fields() {
        let record = json_object(json!({"name": "a", "age": 3, "city": "x"}));
        let input = json_object(json!({"name": "b", "age": 3, "unknown": 1}));
        let changes = diff(&record, &input);
        assert_eq!(changes.len(), 1);
        assert_eq!(
            changes.get("name"),
            Some(&FieldChange {
                from: json!("a"),
                to: json!("b"),
            })
        );
    }

    #[test]
    fn get_diff_splits_sides() {
        let record = json_object(json!({"name": "a", "age": 3}));
        let input = json_object(json!({"name": "b", "age": 4}));
        let result = get_diff(&record, &input);
        assert_eq!(Value::Object(result.from), json!({"name": "a", "age": 3}));
        assert_eq!(Value::Object(result.to), json!({"name": "b", "age": 4}));
        assert_eq!(result.changes.len(), 2);
    }

    #[test]
    fn change_message_is_json_or_empty() {
        let record = json_object(json!({"name": "a"}));
        assert_eq!(make_change_message(&record, &record), "");
        let message = make_change_message(&record, &json_object(json!({"name": "b"})));
        assert_eq!(message, r#"{"name":{"from":"a","to":"b"}}"#);
    }

    #[test]
    fn apply_changes_overwrites_fields() {
        let mut record = json_object(json!({"name": "a", "age": 3}));
        apply_changes(&mut record, &json_object(json!({"name": "b"})));
        assert_eq!(Value::Object(record), json!({"name": "b", "age": 3}));
    }

    #[test]
    fn valid_fields_and_update_data_filter_input() {
        let data = json_object(json!({"name": "a", "secret": "s", "empty": "", "zero": 0}));
        assert_eq!(
            Value::Object(valid_fields(&["name", "missing"], &data)),
            json!({"name": "a"})
        );
        assert_eq!(
            Value::Object(update_data("name", "display_name", &data)),
            json!({"display_name": "a"})
        );
        assert!(update_data("empty", "x", &data).is_empty());
        assert!(update_data("zero", "x", &data).is_empty());
        assert!(update_data("missing", "x", &data).is_empty());
    }
}
