//! Registry-specific record reconciliation.
//!
//! The bill registry wraps the same logical list in different envelopes
//! depending on endpoint and era: `bills`, `results`, `data`, `items`,
//! nested `{bill: {...}}` objects, or a bare top-level `bill`. This module is
//! the only place that knows those shapes; callers receive flat record lists
//! and never inspect raw payloads.

use serde_json::Value;

use policyglass_common::records::{first_item, unwrap_collection, Record};

const COLLECTION_ENVELOPES: &[&str] = &["bills", "results", "data", "items"];

/// Flatten a search/list payload into bill records, unwrapping nested
/// `{bill: {...}}` envelopes along the way. Unknown shapes yield an empty
/// list; this never fails.
pub fn extract_bill_records(payload: &Value) -> Vec<Record> {
    let Some(object) = payload.as_object() else {
        return Vec::new();
    };

    let mut flattened: Vec<Record> = Vec::new();
    for envelope in COLLECTION_ENVELOPES {
        let Some(candidate) = object.get(*envelope) else {
            continue;
        };
        let entries = unwrap_collection(Some(candidate));
        for entry in &entries {
            match entry.get("bill").and_then(|b| first_item(Some(b))) {
                Some(bill) => flattened.push(bill),
                None => flattened.push(entry.clone()),
            }
        }
        if entries.is_empty() {
            if let Some(candidate_object) = candidate.as_object() {
                flattened.extend(unwrap_collection(candidate_object.get("bill")));
            }
        }
    }

    if flattened.is_empty() {
        if let Some(bill) = object.get("bill").and_then(Value::as_object) {
            flattened.push(bill.clone());
        }
    }

    dedupe(flattened)
}

/// Flatten a sub-collection payload (text versions, actions, amendments,
/// sections) by trying the expected envelope keys in order, then the whole
/// payload.
pub fn extract_collection(payload: &Value, envelopes: &[&str]) -> Vec<Record> {
    let Some(object) = payload.as_object() else {
        return Vec::new();
    };
    for envelope in envelopes {
        let records = unwrap_collection(object.get(*envelope));
        if !records.is_empty() {
            return records;
        }
    }
    Vec::new()
}

/// The `pagination.next` link, when the payload has more pages.
pub fn next_page_url(payload: &Value) -> Option<String> {
    payload
        .get("pagination")?
        .get("next")?
        .as_str()
        .map(str::to_string)
}

/// Pick the best text link from a version record: structured XML/USLM over
/// HTML/plain text over a raw download/link field.
pub fn version_text_url(version: &Record) -> Option<String> {
    let mut formats: Vec<Record> = Vec::new();
    formats.extend(unwrap_collection(version.get("formats")));
    formats.extend(unwrap_collection(version.get("urls")));
    if let Some(download) = version.get("download").and_then(Value::as_object) {
        formats.extend(unwrap_collection(download.get("formats")));
    }

    let format_type = |f: &Record| -> String {
        ["type", "format", "fileType"]
            .iter()
            .find_map(|key| f.get(*key).and_then(Value::as_str))
            .unwrap_or_default()
            .to_lowercase()
    };
    let format_url = |f: &Record| -> Option<String> {
        f.get("url").and_then(Value::as_str).map(str::to_string)
    };

    for wanted in [&["xml", "uslm"][..], &["html", "txt"][..]] {
        let found = formats.iter().find(|f| {
            let t = format_type(f);
            wanted.iter().any(|w| t.contains(w)) && f.get("url").map_or(false, Value::is_string)
        });
        if let Some(found) = found {
            return format_url(found);
        }
    }

    if let Some(download) = version.get("download") {
        match download {
            Value::String(s) if !s.is_empty() => return Some(s.clone()),
            Value::Object(o) => {
                if let Some(url) = o.get("url").and_then(Value::as_str) {
                    return Some(url.to_string());
                }
            }
            _ => {}
        }
    }
    if let Some(link) = version.get("link").and_then(Value::as_str) {
        return Some(link.to_string());
    }
    if let Some(url) = version.get("url").and_then(Value::as_str) {
        return Some(url.to_string());
    }
    version
        .get("content")
        .and_then(Value::as_object)
        .and_then(|content| content.get("url"))
        .and_then(Value::as_str)
        .map(str::to_string)
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
