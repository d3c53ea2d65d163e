//! Bill-reference detection in free text.

use regex::Regex;
use std::sync::LazyLock;

// Longer chamber forms come first so "h.res. 5" is not consumed by the
// "h.r." alternative. Dots and inner spaces are optional throughout; an
// optional leading congress number may carry an ordinal suffix.
static BILL_REFERENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)
        \b
        (?: (\d{2,3}) (?:st|nd|rd|th)? \s* )?
        ( h\.?\s?j\.?\s?res\.? | h\.?\s?con\.?\s?res\.? | h\.?\s?res\.? | h\.?\s?r\.?
        | s\.?\s?j\.?\s?res\.? | s\.?\s?con\.?\s?res\.? | s\.?\s?res\.? | s\.?
        )
        \s* (\d{1,4}) \b",
    )
    .unwrap()
});

/// Canonicalize an explicit bill reference inside free text to
/// `"<TYPE> <NUMBER>"`, suffixed `"(<NNN>th Congress)"` when a congress
/// number was present. Text without a recognizable reference passes through
/// trimmed. Pure function, no I/O.
pub fn normalize_query(query: &str) -> String {
    let Some(caps) = BILL_REFERENCE_RE.captures(query) else {
        return query.trim().to_string();
    };

    let bill_type: String = caps
        .get(2)
        .map(|m| {
            m.as_str()
                .chars()
                .filter(|c| c.is_ascii_alphabetic())
                .collect::<String>()
                .to_lowercase()
        })
        .unwrap_or_default();
    let bill_number = caps
        .get(3)
        .and_then(|m| m.as_str().parse::<u32>().ok());

    let (Some(number), false) = (bill_number, bill_type.is_empty()) else {
        return query.trim().to_string();
    };

    let normalized = format!("{} {}", bill_type.to_uppercase(), number);
    match caps.get(1) {
        Some(congress) => format!("{} ({}th Congress)", normalized, congress.as_str()),
        None => normalized,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_bare_abbreviation() {
        assert_eq!(normalize_query("hr 1234"), "HR 1234");
        assert_eq!(normalize_query("H.R. 1234"), "HR 1234");
        assert_eq!(normalize_query("hr1234"), "HR 1234");
    }

    #[test]
    fn carries_congress_prefix() {
        assert_eq!(normalize_query("118 s.5678"), "S 5678 (118th Congress)");
        assert_eq!(normalize_query("118th hr 22"), "HR 22 (118th Congress)");
    }

    #[test]
    fn recognizes_joint_resolutions() {
        assert_eq!(normalize_query("what is s.j.res. 42 about"), "SJRES 42");
        assert_eq!(normalize_query("h.con.res. 7"), "HCONRES 7");
        assert_eq!(normalize_query("h.res. 5"), "HRES 5");
    }

    #[test]
    fn strips_leading_zeros_from_number() {
        assert_eq!(normalize_query("hr 0042"), "HR 42");
    }

    #[test]
    fn passes_through_plain_text() {
        assert_eq!(normalize_query("  healthcare reform  "), "healthcare reform");
        assert_eq!(normalize_query("budget debate in the house"), "budget debate in the house");
    }

    #[test]
    fn ignores_embedded_letters() {
        // "his", "plans" and similar words never read as chamber prefixes.
        assert_eq!(normalize_query("his 45 plans"), "his 45 plans");
    }
}
