//! Tolerant reconciliation of upstream JSON collections.
//!
//! Every registry this system talks to is inconsistent about shape: the same
//! endpoint may return an array, a single object, or an object wrapping a
//! singular/plural `item`/`items`/`results` key. These helpers flatten any of
//! those into a plain list of object records and never panic; unknown shapes
//! yield an empty list.

use serde_json::{Map, Value};

pub type Record = Map<String, Value>;

fn as_object(value: &Value) -> Option<&Record> {
    value.as_object()
}

/// Flatten an arbitrary JSON value into a deduplicated list of object records.
///
/// Accepted shapes: `null`, a bare object, an array of objects, or an object
/// wrapping an `item`/`items`/`results` key that is itself an array or a
/// single object.
pub fn unwrap_collection(value: Option<&Value>) -> Vec<Record> {
    let Some(value) = value else {
        return Vec::new();
    };

    let mut records: Vec<Record> = Vec::new();
    match value {
        Value::Array(entries) => {
            records.extend(entries.iter().filter_map(as_object).cloned());
        }
        Value::Object(object) => {
            let wrapped = ["item", "items", "results"]
                .iter()
                .find_map(|key| object.get(*key));
            match wrapped {
                Some(Value::Array(entries)) => {
                    records.extend(entries.iter().filter_map(as_object).cloned());
                }
                Some(Value::Object(single)) => records.push(single.clone()),
                // A wrapper key holding anything else is an unknown shape.
                Some(_) => {}
                None => records.push(object.clone()),
            }
        }
        _ => {}
    }

    dedupe(records)
}

/// First object record found in a value, looking through arrays.
pub fn first_item(value: Option<&Value>) -> Option<Record> {
    match value? {
        Value::Array(entries) => entries.iter().find_map(as_object).cloned(),
        Value::Object(object) => Some(object.clone()),
        _ => None,
    }
}

/// Merge several sources into one deduplicated record list.
pub fn collect_objects(sources: &[Option<&Value>]) -> Vec<Record> {
    let mut records = Vec::new();
    for source in sources {
        records.extend(unwrap_collection(*source));
    }
    dedupe(records)
}

fn dedupe(records: Vec<Record>) -> Vec<Record> {
    let mut seen: Vec<Record> = Vec::with_capacity(records.len());
    for record in records {
        if !seen.contains(&record) {
            seen.push(record);
        }
    }
    seen
}

/// Fast hash for fallback record ids when the upstream record lacks a stable
/// one. Not cryptographic. The same distinguishing fields always hash to the
/// same id, which the dedupe-by-key invariants require.
pub fn stable_key(parts: &[&str]) -> String {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    for part in parts {
        part.hash(&mut hasher);
    }
    format!("{:016x}", hasher.finish())
}
