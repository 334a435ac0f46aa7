//! Small builders shared by configuration and API tests.

use std::collections::HashMap;

use serde_json::{Map, Value};

/// Environment lookup backed by a fixed set of pairs.
///
/// Configuration loaders accept a lookup closure so tests never mutate the
/// process environment.
#[must_use]
pub fn env_lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
        .collect();
    move |key| map.get(key).cloned()
}

/// Build a JSON object from a `json!` literal, returning an empty map for
/// non-object values.
#[must_use]
pub fn json_object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_only_sees_declared_pairs() {
        let lookup = env_lookup(&[("RESTKIT_ENV", "live")]);
        assert_eq!(lookup("RESTKIT_ENV").as_deref(), Some("live"));
        assert_eq!(lookup("HOME"), None);
    }

    #[test]
    fn json_object_unwraps_maps() {
        let map = json_object(serde_json::json!({"a": 1}));
        assert_eq!(map.get("a"), Some(&Value::from(1)));
        assert!(json_object(Value::Null).is_empty());
    }
}
