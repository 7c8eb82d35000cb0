//! JSON document tree operations shared by the in-process store and the
//! local mirror.
//!
//! # Invariants
//! - After any write, no `null`, empty object or empty array remains in the
//!   tree (empty parents are pruned as well).
//! - Array elements are addressed by decimal index; writing past the end of an
//!   array turns it into an object keyed by index.

use serde_json::{Map, Value};

/// Reads the value addressed by `segments`.
pub fn read<'a>(root: &'a Value, segments: &[String]) -> Option<&'a Value> {
    let mut node = root;
    for segment in segments {
        node = match node {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    if is_empty(node) {
        None
    } else {
        Some(node)
    }
}

/// Writes `value` at `segments`; `None` (or a `null` value) deletes.
pub fn write(root: &mut Value, segments: &[String], value: Option<Value>) {
    let value = value.and_then(prune);
    match segments.split_first() {
        None => *root = value.unwrap_or(Value::Null),
        Some((head, rest)) => {
            write_child(root, head, rest, value);
            if is_empty(root) {
                *root = Value::Null;
            }
        }
    }
}

fn write_child(node: &mut Value, head: &str, rest: &[String], value: Option<Value>) {
    if let Value::Array(items) = node {
        if let Some(index) = head.parse::<usize>().ok().filter(|index| *index < items.len()) {
            let child = &mut items[index];
            match rest.split_first() {
                None => *child = value.unwrap_or(Value::Null),
                Some((next, tail)) => write_child(child, next, tail, value),
            }
            if is_empty(child) {
                items.remove(index);
            }
            return;
        }
        let converted: Map<String, Value> = std::mem::take(items)
            .into_iter()
            .enumerate()
            .map(|(index, item)| (index.to_string(), item))
            .collect();
        *node = Value::Object(converted);
    }

    if !node.is_object() {
        if value.is_none() {
            return;
        }
        *node = Value::Object(Map::new());
    }
    let Value::Object(map) = node else {
        return;
    };

    match rest.split_first() {
        None => match value {
            Some(value) => {
                map.insert(head.to_string(), value);
            }
            None => {
                map.remove(head);
            }
        },
        Some((next, tail)) => {
            let child = map.entry(head.to_string()).or_insert(Value::Null);
            write_child(child, next, tail, value);
            if is_empty(child) {
                map.remove(head);
            }
        }
    }
}

/// Drops nulls and empty containers recursively; `None` when nothing is left.
pub fn prune(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::Object(map) => {
            let pruned: Map<String, Value> = map
                .into_iter()
                .filter_map(|(key, child)| prune(child).map(|child| (key, child)))
                .collect();
            (!pruned.is_empty()).then_some(Value::Object(pruned))
        }
        Value::Array(items) => {
            let pruned: Vec<Value> = items.into_iter().filter_map(prune).collect();
            (!pruned.is_empty()).then_some(Value::Array(pruned))
        }
        other => Some(other),
    }
}

pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::{prune, read, write};
    use serde_json::{json, Value};

    fn segments(path: &str) -> Vec<String> {
        path.split('/').map(str::to_string).collect()
    }

    #[test]
    fn write_creates_intermediate_objects() {
        let mut root = Value::Null;
        write(&mut root, &segments("tasks/t1/title"), Some(json!("Plan")));
        assert_eq!(root, json!({"tasks": {"t1": {"title": "Plan"}}}));
    }

    #[test]
    fn deleting_last_child_prunes_parents() {
        let mut root = json!({"tasks": {"t1": {"title": "Plan"}}, "users": {"u": 1}});
        write(&mut root, &segments("tasks/t1/title"), None);
        assert_eq!(root, json!({"users": {"u": 1}}));
    }

    #[test]
    fn null_and_empty_values_are_not_stored() {
        let mut root = json!({});
        write(
            &mut root,
            &segments("tasks/t1"),
            Some(json!({"assignedTo": [], "subtasks": {}, "title": "A", "x": null})),
        );
        assert_eq!(root, json!({"tasks": {"t1": {"title": "A"}}}));
    }

    #[test]
    fn read_follows_array_indices() {
        let root = json!({"t": {"subtasks": [{"id": "s1"}, {"id": "s2"}]}});
        assert_eq!(
            read(&root, &segments("t/subtasks/1/id")),
            Some(&json!("s2"))
        );
        assert_eq!(read(&root, &segments("t/subtasks/5")), None);
    }

    #[test]
    fn writing_inside_array_replaces_element() {
        let mut root = json!({"t": {"subtasks": [{"done": false}, {"done": false}]}});
        write(&mut root, &segments("t/subtasks/1/done"), Some(json!(true)));
        assert_eq!(root, json!({"t": {"subtasks": [{"done": false}, {"done": true}]}}));
    }

    #[test]
    fn prune_returns_none_for_empty_tree() {
        assert_eq!(prune(json!({"a": {"b": []}})), None);
    }
}
