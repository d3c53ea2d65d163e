//! Non-advocacy language detection.
//!
//! Answers describe the legislative record; they never tell the reader what
//! to do about it. This regex layer is the deterministic half of the
//! guardrail and always runs, independent of model availability.

use regex::Regex;
use std::sync::LazyLock;

const ADVOCACY_PATTERNS: &[&str] = &[
    r"(?i)\bshould\b",
    r"(?i)\bmust\b",
    r"(?i)\brecommend\b",
    r"(?i)\bconsider\b",
    r"(?i)\badvise\b",
    r"(?i)\bcall your representative\b",
];

static ADVOCACY_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    ADVOCACY_PATTERNS
        .iter()
        .map(|pattern| Regex::new(pattern).unwrap())
        .collect()
});

/// Check text for advocacy or imperative language. Returns one warning per
/// triggered pattern.
pub fn detect_advocacy(text: &str) -> Vec<String> {
    ADVOCACY_RES
        .iter()
        .zip(ADVOCACY_PATTERNS)
        .filter(|(re, _)| re.is_match(text))
        .map(|(_, pattern)| format!("Guardrail triggered: {pattern}"))
        .collect()
}
