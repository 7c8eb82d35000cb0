//! Conversion between stored id-keyed maps and client-side record arrays.

use serde_json::{Map, Value};

const ID_FIELD: &str = "id";

/// Flattens a stored collection into records, defaulting `id` to the map key.
///
/// Accepts both object-shaped collections and array-shaped ones (the latter
/// are keyed by index). Non-object entries are skipped.
pub fn map_to_array(value: Option<&Value>) -> Vec<Value> {
    let entries: Vec<(String, &Value)> = match value {
        Some(Value::Object(map)) => map.iter().map(|(key, v)| (key.clone(), v)).collect(),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(index, v)| (index.to_string(), v))
            .collect(),
        _ => Vec::new(),
    };

    entries
        .into_iter()
        .filter_map(|(key, record)| {
            let mut record = record.as_object()?.clone();
            if !record.get(ID_FIELD).is_some_and(Value::is_string) {
                record.insert(ID_FIELD.to_string(), Value::String(key));
            }
            Some(Value::Object(record))
        })
        .collect()
}

/// Keys records by their `id`. Records without a string id are dropped.
pub fn array_to_map(items: &[Value]) -> Map<String, Value> {
    items
        .iter()
        .filter_map(|record| {
            let id = record.get(ID_FIELD)?.as_str()?.to_string();
            Some((id, record.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{array_to_map, map_to_array};
    use serde_json::json;

    #[test]
    fn id_defaults_to_map_key() {
        let stored = json!({
            "k1": {"title": "no id"},
            "k2": {"id": "explicit", "title": "with id"},
            "k3": "not a record"
        });
        let records = map_to_array(Some(&stored));
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["id"], "k1");
        assert_eq!(records[1]["id"], "explicit");
    }

    #[test]
    fn array_collections_use_index_keys() {
        let stored = json!([{"title": "a"}, {"title": "b"}]);
        let records = map_to_array(Some(&stored));
        assert_eq!(records[1]["id"], "1");
    }

    #[test]
    fn missing_collection_is_empty() {
        assert!(map_to_array(None).is_empty());
    }

    #[test]
    fn array_to_map_keys_by_id() {
        let map = array_to_map(&[json!({"id": "a"}), json!({"title": "orphan"})]);
        assert_eq!(map.len(), 1);
        assert!(map.contains_key("a"));
    }
}
