//! Contract tests for the pipeline's pure surfaces:
//! - query normalization canonicalizes explicit bill references
//! - the guardrail regex layer works with no model configured
//! - the answer grounder's terminal and fallback behavior
//! - reconciliation and change-summary invariants

use serde_json::json;

use policyglass_common::records::unwrap_collection;
use policyglass_common::{
    ChangeSummary, DnaMetadata, PolicyDnaResult, PolicySearchHit, PolicyTimelineEntry,
};
use policyglass_core::dna::diff_change_summary;
use policyglass_core::grounder::{ground_answer, GrounderInput};
use policyglass_core::guardrail::check_guardrail;
use policyglass_core::query::normalize_query;

#[test]
fn query_normalization_contract() {
    assert_eq!(normalize_query("hr 1234"), "HR 1234");
    assert_eq!(normalize_query("118 s.5678"), "S 5678 (118th Congress)");
    assert_eq!(normalize_query("  healthcare reform "), "healthcare reform");
}

#[tokio::test]
async fn guardrail_regex_layer_is_model_independent() {
    let finding = check_guardrail(None, "You should call your representative").await;
    assert!(!finding.ok);
    assert!(!finding.warnings.is_empty());

    let clean = check_guardrail(None, "HR 1234 passed the House on March 3").await;
    assert!(clean.ok);
}

#[tokio::test]
async fn grounder_without_hits_is_terminal() {
    let answer = ground_answer(
        None,
        GrounderInput {
            question: "anything at all",
            policies: &[],
            dna: None,
            influence: None,
        },
    )
    .await;
    assert!(answer.citations.is_empty());
    assert!(answer.disclaimers.as_ref().is_some_and(|d| !d.is_empty()));
}

#[tokio::test]
async fn grounder_fallback_citations_match_digest_lines() {
    let policies = vec![PolicySearchHit {
        bill_id: "118-hr-1".to_string(),
        congress: 118,
        bill_type: "hr".to_string(),
        bill_number: "1".to_string(),
        title: "An Act".to_string(),
        status: "Introduced".to_string(),
        latest_action: None,
        summary: Some("A summary".to_string()),
        jurisdiction: "federal".to_string(),
        sections: vec![],
        confidence: 80,
        sponsor: None,
    }];
    let dna = PolicyDnaResult {
        bill_id: "118-hr-1".to_string(),
        timeline: vec![PolicyTimelineEntry {
            version_id: "ih".to_string(),
            label: "Introduced".to_string(),
            issued_on: Some("2024-01-01".to_string()),
            change_summary: Some(ChangeSummary {
                added: 1,
                removed: 0,
                modified: 0,
            }),
            source_uri: None,
        }],
        blame: vec![],
        actions: vec![],
        metadata: DnaMetadata::default(),
    };

    // No model configured: the deterministic formatter must still produce a
    // non-empty answer citing each digest line exactly once.
    let answer = ground_answer(
        None,
        GrounderInput {
            question: "status of hr 1?",
            policies: &policies,
            dna: Some(&dna),
            influence: None,
        },
    )
    .await;
    assert!(!answer.answer.is_empty());
    assert_eq!(answer.citations.len(), 2);
}

#[test]
fn reconciliation_is_pure_and_idempotent() {
    let payload = json!({"items": [{"a": 1}, {"a": 1}, {"b": 2}]});
    let first = unwrap_collection(Some(&payload));
    let second = unwrap_collection(Some(&payload));
    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
}

#[test]
fn change_summaries_are_never_negative() {
    for (before, after) in [
        ("", ""),
        ("", "new text"),
        ("old text", ""),
        ("shared words here", "shared words there"),
    ] {
        let change = diff_change_summary(before, after);
        // u32 fields cannot go negative; the invariant worth pinning is the
        // modified-overlap bound.
        assert!(change.modified <= change.added.max(change.removed));
        if change.added == 0 || change.removed == 0 {
            assert_eq!(change.modified, 0);
        }
    }
}
