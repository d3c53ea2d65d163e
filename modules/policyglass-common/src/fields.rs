//! Ordered-candidate field lookup over schema-inconsistent records.
//!
//! The upstream registries disagree about field naming between endpoints and
//! even between rows of one response. Each logical value (title, date,
//! sponsor name) is extracted by trying an alias list in priority order.
//! Alias lists live as data next to their call sites so they can be tested
//! in isolation.

use serde_json::Value;

use crate::records::Record;

/// Coerce a scalar JSON value to a string. Numbers stringify; everything
/// else is absent.
pub fn as_str(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// First string value nested one level inside an object, in key order.
fn first_nested_str(value: &Value) -> Option<String> {
    let object = value.as_object()?;
    object.values().find_map(as_str)
}

/// Try each alias key in order; return the first string-coercible value.
/// An object-valued alias is scanned one level deep for a string, matching
/// how the registries nest `{type: {code, description}}`-style values.
pub fn pick_str(record: &Record, aliases: &[&str]) -> Option<String> {
    for alias in aliases {
        let Some(value) = record.get(*alias) else {
            continue;
        };
        if let Some(direct) = as_str(value) {
            return Some(direct);
        }
        if let Some(nested) = first_nested_str(value) {
            return Some(nested);
        }
    }
    None
}

/// Walk a dotted path of object keys.
pub fn get_path<'a>(record: &'a Record, path: &[&str]) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    let mut current = record.get(*first)?;
    for key in rest {
        current = current.as_object()?.get(*key)?;
    }
    Some(current)
}

/// Try each alias path in order; return the first string-coercible value.
pub fn pick_path_str(record: &Record, paths: &[&[&str]]) -> Option<String> {
    paths
        .iter()
        .find_map(|path| get_path(record, path).and_then(as_str))
}

/// Try each alias key in order; return the first value parseable as u32.
pub fn pick_u32(record: &Record, aliases: &[&str]) -> Option<u32> {
    pick_str(record, aliases).and_then(|s| s.parse().ok())
}

/// Try each alias key in order; return the first value parseable as f64.
pub fn pick_f64(record: &Record, aliases: &[&str]) -> Option<f64> {
    for alias in aliases {
        match record.get(*alias) {
            Some(Value::Number(n)) => return n.as_f64(),
            Some(Value::String(s)) => {
                if let Ok(parsed) = s.trim().parse() {
                    return Some(parsed);
                }
            }
            _ => continue,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn pick_str_honors_priority_order() {
        let r = record(json!({"shortTitle": "Short", "title": "Long"}));
        assert_eq!(
            pick_str(&r, &["title", "shortTitle"]),
            Some("Long".to_string())
        );
        assert_eq!(
            pick_str(&r, &["officialTitle", "shortTitle"]),
            Some("Short".to_string())
        );
    }

    #[test]
    fn pick_str_coerces_numbers() {
        let r = record(json!({"number": 1234}));
        assert_eq!(pick_str(&r, &["number"]), Some("1234".to_string()));
    }

    #[test]
    fn pick_str_scans_nested_objects() {
        let r = record(json!({"type": {"code": "ih", "ordinal": 1}}));
        assert_eq!(pick_str(&r, &["type"]), Some("ih".to_string()));
    }

    #[test]
    fn pick_str_skips_empty_strings() {
        let r = record(json!({"title": "", "shortTitle": "Real"}));
        assert_eq!(
            pick_str(&r, &["title", "shortTitle"]),
            Some("Real".to_string())
        );
    }

    #[test]
    fn pick_path_str_walks_objects() {
        let r = record(json!({"latestAction": {"text": "Passed House"}}));
        assert_eq!(
            pick_path_str(&r, &[&["latestAction", "text"]]),
            Some("Passed House".to_string())
        );
        assert_eq!(pick_path_str(&r, &[&["latestAction", "date"]]), None);
    }

    #[test]
    fn pick_u32_parses_strings_and_numbers() {
        let r = record(json!({"congress": "118", "cycle": 2024}));
        assert_eq!(pick_u32(&r, &["congress"]), Some(118));
        assert_eq!(pick_u32(&r, &["cycle"]), Some(2024));
        assert_eq!(pick_u32(&r, &["missing"]), None);
    }

    #[test]
    fn pick_f64_handles_string_amounts() {
        let r = record(json!({"income": "50000", "expenses": 1200.5}));
        assert_eq!(pick_f64(&r, &["income"]), Some(50000.0));
        assert_eq!(pick_f64(&r, &["expenses"]), Some(1200.5));
    }
}
