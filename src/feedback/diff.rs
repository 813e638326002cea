//! Generic recursive structural diff over JSON values, keyed by
//! dot/bracket path. Schema-independent: works identically for customer,
//! project, task, and billing blobs.

use serde_json::Value;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffKind {
    Changed,
    Added,
    Removed,
}

#[derive(Debug, Clone)]
pub struct DiffEntry {
    /// Dot/bracket path of the leaf, e.g. `tasks[0].estimated_hours`.
    pub path: String,
    pub kind: DiffKind,
    pub old: Option<Value>,
    pub new: Option<Value>,
}

/// Compute all leaf-level differences between two values.
/// Keys are visited in sorted order, so the output is deterministic.
pub fn diff_values(original: &Value, corrected: &Value) -> Vec<DiffEntry> {
    let mut entries = Vec::new();
    walk(original, corrected, "", &mut entries);
    entries
}

fn walk(original: &Value, corrected: &Value, path: &str, entries: &mut Vec<DiffEntry>) {
    match (original, corrected) {
        (Value::Object(old_map), Value::Object(new_map)) => {
            let keys: BTreeSet<&String> = old_map.keys().chain(new_map.keys()).collect();
            for key in keys {
                let child_path = join_key(path, key);
                match (old_map.get(key), new_map.get(key)) {
                    (Some(old), Some(new)) => walk(old, new, &child_path, entries),
                    (Some(old), None) => entries.push(DiffEntry {
                        path: child_path,
                        kind: DiffKind::Removed,
                        old: Some(old.clone()),
                        new: None,
                    }),
                    (None, Some(new)) => entries.push(DiffEntry {
                        path: child_path,
                        kind: DiffKind::Added,
                        old: None,
                        new: Some(new.clone()),
                    }),
                    (None, None) => unreachable!("key came from one of the maps"),
                }
            }
        }
        (Value::Array(old_items), Value::Array(new_items)) => {
            let len = old_items.len().max(new_items.len());
            for index in 0..len {
                let child_path = format!("{path}[{index}]");
                match (old_items.get(index), new_items.get(index)) {
                    (Some(old), Some(new)) => walk(old, new, &child_path, entries),
                    (Some(old), None) => entries.push(DiffEntry {
                        path: child_path,
                        kind: DiffKind::Removed,
                        old: Some(old.clone()),
                        new: None,
                    }),
                    (None, Some(new)) => entries.push(DiffEntry {
                        path: child_path,
                        kind: DiffKind::Added,
                        old: None,
                        new: Some(new.clone()),
                    }),
                    (None, None) => unreachable!("index below max length"),
                }
            }
        }
        (old, new) => {
            if old != new {
                entries.push(DiffEntry {
                    path: path.to_string(),
                    kind: DiffKind::Changed,
                    old: Some(old.clone()),
                    new: Some(new.clone()),
                });
            }
        }
    }
}

fn join_key(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

/// Set the value at a dot/bracket path, creating intermediate objects and
/// extending arrays with nulls as needed. Used to replay corrections onto
/// a base structure.
pub fn set_value_at_path(target: &mut Value, path: &str, value: Value) {
    let segments = parse_path(path);
    let mut current = target;

    for (i, segment) in segments.iter().enumerate() {
        let last = i == segments.len() - 1;
        match segment {
            PathSegment::Key(key) => {
                if !current.is_object() {
                    *current = Value::Object(Default::default());
                }
                let map = current.as_object_mut().expect("just coerced to object");
                if last {
                    map.insert(key.clone(), value);
                    return;
                }
                current = map.entry(key.clone()).or_insert(Value::Null);
            }
            PathSegment::Index(index) => {
                if !current.is_array() {
                    *current = Value::Array(Vec::new());
                }
                let items = current.as_array_mut().expect("just coerced to array");
                while items.len() <= *index {
                    items.push(Value::Null);
                }
                if last {
                    items[*index] = value;
                    return;
                }
                current = &mut items[*index];
            }
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum PathSegment {
    Key(String),
    Index(usize),
}

fn parse_path(path: &str) -> Vec<PathSegment> {
    let mut segments = Vec::new();
    for part in path.split('.') {
        let mut rest = part;
        // Split "tasks[0][2]" into the key and its indices.
        if let Some(bracket) = rest.find('[') {
            let (key, indices) = rest.split_at(bracket);
            if !key.is_empty() {
                segments.push(PathSegment::Key(key.to_string()));
            }
            rest = indices;
            for chunk in rest.split('[').filter(|c| !c.is_empty()) {
                if let Some(index) = chunk
                    .strip_suffix(']')
                    .and_then(|n| n.parse::<usize>().ok())
                {
                    segments.push(PathSegment::Index(index));
                }
            }
        } else if !rest.is_empty() {
            segments.push(PathSegment::Key(rest.to_string()));
        }
    }
    segments
}
