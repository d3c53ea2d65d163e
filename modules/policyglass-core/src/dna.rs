//! Bill "DNA": version timeline with diff-based change summaries, blame
//! attribution merged from several weak signals, and alias-tolerant
//! metadata.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate};
use serde_json::Value;
use similar::{ChangeTag, TextDiff};

use congress_client::version_text_url;
use policyglass_common::records::{stable_key, unwrap_collection, Record};
use policyglass_common::{
    pick_str, BillLocator, BillSponsor, ChangeSummary, DnaMetadata, PolicyActionEvent,
    PolicyBlameEntry, PolicyDnaResult, PolicyGlassError, PolicyTimelineEntry,
};

use crate::deps::Deps;

/// Pagination bound per sub-collection fetch.
const MAX_COLLECTION_PAGES: usize = 3;
const MAX_ACTIONS: usize = 25;
const MAX_BLAME: usize = 20;
const MAX_AMENDMENT_BLAME: usize = 10;
/// Actions used to synthesize blame when no other signal exists.
const FALLBACK_BLAME_ACTIONS: usize = 3;

const VERSION_INLINE_ALIASES: &[&str] =
    &["textVersions", "versions", "billVersions", "billTextVersions"];
const VERSION_ID_ALIASES: &[&str] =
    &["versionCode", "versionNumber", "version", "id", "versionName", "type"];
const VERSION_LABEL_ALIASES: &[&str] =
    &["versionName", "versionCode", "title", "label", "type"];
const VERSION_DATE_ALIASES: &[&str] =
    &["issuedDate", "date", "updateDate", "dateIssued", "versionDate"];
const ACTION_TYPE_ALIASES: &[&str] = &["type", "actionType"];
const ACTION_DATE_ALIASES: &[&str] = &["date", "actionDate", "recordedAt", "datetime"];
const ACTION_ACTOR_ALIASES: &[&str] = &["actor", "by", "committee", "chamber"];
const ACTION_TEXT_ALIASES: &[&str] = &["text", "description", "source"];
const ACTION_LINK_ALIASES: &[&str] = &["link", "url", "sourceLink"];
const AMENDMENT_ID_ALIASES: &[&str] =
    &["number", "amendmentNumber", "id", "version", "versionName"];
const TITLE_ALIASES: &[&str] =
    &["title", "shortTitle", "originChamberTitle", "officialTitle"];
const SPONSOR_NAME_ALIASES: &[&str] = &["fullName", "name", "sponsorName"];
const SUMMARY_TEXT_ALIASES: &[&str] = &["text", "description", "summary"];
const INTRODUCED_DATE_ALIASES: &[&str] =
    &["introducedDate", "introduced", "dateIntroduced", "introducedOn"];
const SECTION_ID_ALIASES: &[&str] = &["sectionId", "identifier", "id"];
const SECTION_HEADING_ALIASES: &[&str] = &["heading", "title", "sectionTitle"];
const SECTION_TEXT_ALIASES: &[&str] = &["summary", "text", "sectionText", "snippet"];

/// Build the full DNA for one bill. A malformed id fails fast as a
/// structural error; sub-collection failures degrade to empty lists; the
/// detail fetch itself failing is an upstream error since nothing can be
/// built without it.
pub async fn build_policy_dna(
    deps: &Deps,
    bill_id: &str,
) -> Result<PolicyDnaResult, PolicyGlassError> {
    let locator = BillLocator::parse(bill_id)?;

    let detail = deps
        .congress
        .bill_detail(locator.congress, &locator.bill_type, &locator.bill_number)
        .await
        .map_err(|err| PolicyGlassError::Upstream(err.to_string()))?;
    let bill: Record = detail
        .get("bill")
        .and_then(Value::as_object)
        .cloned()
        .or_else(|| detail.as_object().cloned())
        .unwrap_or_default();

    // The four sub-collections are independent of each other; only the
    // version diff walk later requires ordering.
    let (versions, actions, amendments, sections) = tokio::join!(
        fetch_collection(deps, &locator, "text", VERSION_INLINE_ALIASES),
        fetch_collection(deps, &locator, "actions", &["actions"]),
        fetch_collection(deps, &locator, "amendments", &["amendments"]),
        fetch_collection(deps, &locator, "sections", &["sections", "sectionList"]),
    );

    let mut versions = merge_records(versions, inline_records(&bill, VERSION_INLINE_ALIASES), version_key);
    let actions = merge_records(actions, inline_records(&bill, &["actions"]), action_key);
    let amendments = merge_records(
        amendments,
        inline_records(&bill, &["amendments", "relatedBills"]),
        amendment_key,
    );
    let sections = merge_records(
        sections,
        inline_records(&bill, &["sections", "sectionList"]),
        section_key,
    );

    versions.sort_by_key(version_sort_ts);
    let timeline = build_timeline(deps, &versions).await;
    let action_events = map_actions(&actions);
    let metadata = extract_metadata(&bill, &locator);

    let timeline = if timeline.is_empty() {
        synthesize_timeline(&bill)
    } else {
        timeline
    };

    let blame = build_blame(
        &amendments,
        &sections,
        &timeline,
        metadata.sponsor.as_ref(),
        &action_events,
    );

    tracing::info!(
        bill_id,
        versions = timeline.len(),
        blame = blame.len(),
        actions = action_events.len(),
        "Built policy DNA"
    );

    Ok(PolicyDnaResult {
        bill_id: bill_id.to_string(),
        timeline,
        blame,
        actions: action_events,
        metadata,
    })
}

async fn fetch_collection(
    deps: &Deps,
    locator: &BillLocator,
    segment: &str,
    envelopes: &[&str],
) -> Vec<Record> {
    match deps
        .congress
        .sub_collection(
            locator.congress,
            &locator.bill_type,
            &locator.bill_number,
            segment,
            envelopes,
            MAX_COLLECTION_PAGES,
        )
        .await
    {
        Ok(records) => records,
        Err(err) => {
            tracing::warn!(error = %err, segment, "Sub-collection fetch failed; continuing without it");
            Vec::new()
        }
    }
}

fn inline_records(bill: &Record, aliases: &[&str]) -> Vec<Record> {
    for alias in aliases {
        let records = unwrap_collection(bill.get(*alias));
        if !records.is_empty() {
            return records;
        }
    }
    Vec::new()
}

/// Keep fetched records first, then any inline ones whose natural key was
/// not already seen.
fn merge_records(
    fetched: Vec<Record>,
    inline: Vec<Record>,
    key: impl Fn(&Record) -> String,
) -> Vec<Record> {
    let mut seen: HashSet<String> = fetched.iter().map(&key).collect();
    let mut merged = fetched;
    for record in inline {
        if seen.insert(key(&record)) {
            merged.push(record);
        }
    }
    merged
}

fn version_key(record: &Record) -> String {
    pick_str(record, VERSION_ID_ALIASES)
        .unwrap_or_else(|| stable_key(&[&Value::Object(record.clone()).to_string()]))
}

fn action_key(record: &Record) -> String {
    let date = pick_str(record, ACTION_DATE_ALIASES).unwrap_or_default();
    let text = pick_str(record, ACTION_TEXT_ALIASES).unwrap_or_default();
    stable_key(&[&date, &text])
}

fn amendment_key(record: &Record) -> String {
    pick_str(record, AMENDMENT_ID_ALIASES)
        .unwrap_or_else(|| stable_key(&[&Value::Object(record.clone()).to_string()]))
}

fn section_key(record: &Record) -> String {
    pick_str(record, SECTION_ID_ALIASES)
        .or_else(|| pick_str(record, SECTION_HEADING_ALIASES))
        .unwrap_or_else(|| stable_key(&[&Value::Object(record.clone()).to_string()]))
}

/// Best-available issue timestamp; undated versions sort as epoch 0.
fn version_sort_ts(record: &Record) -> i64 {
    pick_str(record, VERSION_DATE_ALIASES)
        .and_then(|raw| parse_date_ts(&raw))
        .unwrap_or(0)
}

fn parse_date_ts(raw: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp());
    }
    None
}

/// Walk versions in issue order, downloading each text and diffing it
/// against its predecessor. Strictly sequential: each diff needs the
/// previous version's text.
async fn build_timeline(deps: &Deps, versions: &[Record]) -> Vec<PolicyTimelineEntry> {
    let mut timeline = Vec::with_capacity(versions.len());
    let mut previous_text = String::new();
    for (idx, version) in versions.iter().enumerate() {
        let text = match version_text_url(version) {
            Some(url) => deps.congress.download_version_text(&url).await,
            None => String::new(),
        };
        let change_summary = diff_change_summary(&previous_text, &text);
        previous_text = text;

        timeline.push(PolicyTimelineEntry {
            version_id: pick_str(version, VERSION_ID_ALIASES).unwrap_or_else(|| format!("v{idx}")),
            label: pick_str(version, VERSION_LABEL_ALIASES)
                .unwrap_or_else(|| format!("Version {}", idx + 1)),
            issued_on: pick_str(version, VERSION_DATE_ALIASES),
            change_summary: Some(change_summary),
            source_uri: version_text_url(version),
        });
    }
    timeline
}

/// Word-level change tally between successive version texts. `modified`
/// approximates replacement edits as the overlap of insertions and
/// deletions; it is a heuristic, not a structural diff.
pub fn diff_change_summary(previous: &str, current: &str) -> ChangeSummary {
    if previous.is_empty() {
        return ChangeSummary {
            added: if current.is_empty() { 0 } else { 1 },
            removed: 0,
            modified: 0,
        };
    }

    let diff = TextDiff::from_words(previous, current);
    let mut added = 0u32;
    let mut removed = 0u32;
    for change in diff.iter_all_changes() {
        if change.value().trim().is_empty() {
            continue;
        }
        match change.tag() {
            ChangeTag::Insert => added += 1,
            ChangeTag::Delete => removed += 1,
            ChangeTag::Equal => {}
        }
    }

    let modified = if added > 0 && removed > 0 {
        added.min(removed)
    } else {
        0
    };

    ChangeSummary {
        added,
        removed,
        modified,
    }
}

fn map_actions(records: &[Record]) -> Vec<PolicyActionEvent> {
    records
        .iter()
        .take(MAX_ACTIONS)
        .map(|action| PolicyActionEvent {
            action_type: pick_str(action, ACTION_TYPE_ALIASES).unwrap_or_else(|| "action".to_string()),
            date: pick_str(action, ACTION_DATE_ALIASES),
            actor: pick_str(action, ACTION_ACTOR_ALIASES),
            description: pick_str(action, ACTION_TEXT_ALIASES),
            link: pick_str(action, ACTION_LINK_ALIASES),
        })
        .collect()
}

// --- Blame ---

/// Merge blame signals from amendments, declared sections, and the version
/// timeline; fall back to the first legislative actions when all three are
/// silent. Deduped by (sectionId, heading, actionDate), capped.
fn build_blame(
    amendments: &[Record],
    sections: &[Record],
    timeline: &[PolicyTimelineEntry],
    sponsor: Option<&BillSponsor>,
    actions: &[PolicyActionEvent],
) -> Vec<PolicyBlameEntry> {
    let mut entries = blame_from_amendments(amendments);
    entries.extend(blame_from_sections(sections));
    entries.extend(blame_from_timeline(timeline, sponsor));

    let mut deduped: Vec<PolicyBlameEntry> = Vec::new();
    let mut seen = HashSet::new();
    for entry in entries {
        if seen.insert(entry.dedup_key()) {
            deduped.push(entry);
        }
        if deduped.len() >= MAX_BLAME {
            break;
        }
    }

    if deduped.is_empty() {
        deduped = blame_from_actions(actions);
    }
    deduped
}

fn blame_from_amendments(amendments: &[Record]) -> Vec<PolicyBlameEntry> {
    amendments
        .iter()
        .take(MAX_AMENDMENT_BLAME)
        .map(|amendment| {
            let sponsor = amendment
                .get("sponsor")
                .and_then(Value::as_object)
                .cloned()
                .or_else(|| unwrap_collection(amendment.get("sponsors")).into_iter().next());
            let latest_action = amendment.get("latestAction").and_then(Value::as_object);

            PolicyBlameEntry {
                section_id: amendment_key(amendment),
                heading: pick_str(amendment, &["title", "purpose", "description"]),
                author: sponsor
                    .as_ref()
                    .and_then(|s| pick_str(s, SPONSOR_NAME_ALIASES))
                    .or_else(|| pick_str(amendment, &["sponsor"])),
                action_type: pick_str(amendment, &["action"]).or_else(|| {
                    latest_action.and_then(|a| pick_str(a, &["text", "action"]))
                }),
                action_date: pick_str(amendment, &["submittedDate", "date"]).or_else(|| {
                    latest_action.and_then(|a| pick_str(a, &["date"]))
                }),
                summary: pick_str(amendment, &["description", "purpose", "text"]),
                source_uri: pick_str(amendment, &["url", "link", "origin"]).or_else(|| {
                    latest_action.and_then(|a| pick_str(a, &["link", "url"]))
                }),
            }
        })
        .collect()
}

fn blame_from_sections(sections: &[Record]) -> Vec<PolicyBlameEntry> {
    sections
        .iter()
        .map(|section| PolicyBlameEntry {
            section_id: section_key(section),
            heading: pick_str(section, SECTION_HEADING_ALIASES),
            author: pick_str(section, &["author", "sponsor", "committee"]),
            action_type: pick_str(section, &["action", "status"]),
            action_date: pick_str(section, &["date", "updatedDate"]),
            summary: pick_str(section, SECTION_TEXT_ALIASES),
            source_uri: pick_str(section, &["url", "citation", "source"]),
        })
        .collect()
}

fn blame_from_timeline(
    timeline: &[PolicyTimelineEntry],
    sponsor: Option<&BillSponsor>,
) -> Vec<PolicyBlameEntry> {
    timeline
        .iter()
        .enumerate()
        .map(|(idx, entry)| PolicyBlameEntry {
            section_id: entry.version_id.clone(),
            heading: Some(entry.label.clone()),
            author: sponsor.map(|s| s.name.clone()),
            action_type: Some(if idx == 0 { "Introduced" } else { "Revision" }.to_string()),
            action_date: entry.issued_on.clone(),
            summary: entry.change_summary.map(|c| {
                format!(
                    "{} additions, {} removals, {} modifications",
                    c.added, c.removed, c.modified
                )
            }),
            source_uri: entry.source_uri.clone(),
        })
        .collect()
}

fn blame_from_actions(actions: &[PolicyActionEvent]) -> Vec<PolicyBlameEntry> {
    actions
        .iter()
        .take(FALLBACK_BLAME_ACTIONS)
        .enumerate()
        .map(|(idx, action)| PolicyBlameEntry {
            section_id: action
                .date
                .clone()
                .map(|d| stable_key(&[&d, action.description.as_deref().unwrap_or("")]))
                .unwrap_or_else(|| format!("action-{idx}")),
            heading: action.description.clone(),
            author: action.actor.clone(),
            action_type: Some(action.action_type.clone()),
            action_date: action.date.clone(),
            summary: action.description.clone(),
            source_uri: action.link.clone(),
        })
        .collect()
}

// --- Metadata ---

fn extract_metadata(bill: &Record, locator: &BillLocator) -> DnaMetadata {
    let sponsor = bill
        .get("sponsor")
        .and_then(Value::as_object)
        .cloned()
        .or_else(|| unwrap_collection(bill.get("sponsors")).into_iter().next());
    let summary_record = bill
        .get("summary")
        .and_then(Value::as_object)
        .cloned()
        .or_else(|| unwrap_collection(bill.get("summaries")).into_iter().next());

    DnaMetadata {
        title: pick_str(bill, TITLE_ALIASES).or_else(|| {
            unwrap_collection(bill.get("titles"))
                .first()
                .and_then(|t| pick_str(t, &["title"]))
        }),
        summary: summary_record
            .as_ref()
            .and_then(|s| pick_str(s, SUMMARY_TEXT_ALIASES)),
        sponsor: sponsor.as_ref().map(|s| BillSponsor {
            name: pick_str(s, SPONSOR_NAME_ALIASES).unwrap_or_default(),
            party: pick_str(s, &["party"]),
            state: pick_str(s, &["state"]),
            bioguide_id: pick_str(s, &["bioguideId", "bioguide_id", "bioguide"]),
        }),
        congress: Some(locator.congress),
        bill_type: Some(locator.bill_type.clone()),
        bill_number: Some(locator.bill_number.clone()),
    }
}

/// A valid bill with no published text versions still gets a one-entry
/// timeline keyed to its introduction, so consumers never see an empty
/// timeline for an otherwise-resolvable bill.
fn synthesize_timeline(bill: &Record) -> Vec<PolicyTimelineEntry> {
    vec![PolicyTimelineEntry {
        version_id: "introduced".to_string(),
        label: "Introduced".to_string(),
        issued_on: pick_str(bill, INTRODUCED_DATE_ALIASES),
        change_summary: None,
        source_uri: pick_str(bill, &["url"]),
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn first_version_scores_sentinel() {
        let change = diff_change_summary("", "any text at all");
        assert_eq!(change, ChangeSummary { added: 1, removed: 0, modified: 0 });
        let empty = diff_change_summary("", "");
        assert_eq!(empty, ChangeSummary::default());
    }

    #[test]
    fn diff_counts_are_non_negative_and_modified_bounded() {
        let change = diff_change_summary(
            "the quick brown fox jumps over the lazy dog",
            "the slow brown fox walks over the lazy cat today",
        );
        assert!(change.added > 0);
        assert!(change.removed > 0);
        assert_eq!(change.modified, change.added.min(change.removed));
    }

    #[test]
    fn diff_pure_insertion_has_zero_modified() {
        let change = diff_change_summary("section one", "section one and section two");
        assert!(change.added > 0);
        assert_eq!(change.removed, 0);
        assert_eq!(change.modified, 0);
    }

    #[test]
    fn identical_texts_have_zero_changes() {
        let change = diff_change_summary("same text here", "same text here");
        assert_eq!(change, ChangeSummary::default());
    }

    #[test]
    fn version_sort_puts_undated_first() {
        let mut versions = vec![
            record(json!({"versionCode": "enr", "issuedDate": "2024-03-01"})),
            record(json!({"versionCode": "unk"})),
            record(json!({"versionCode": "ih", "issuedDate": "2023-01-15"})),
        ];
        versions.sort_by_key(version_sort_ts);
        let order: Vec<_> = versions
            .iter()
            .map(|v| pick_str(v, &["versionCode"]).unwrap())
            .collect();
        assert_eq!(order, vec!["unk", "ih", "enr"]);
    }

    #[test]
    fn parse_date_handles_both_formats() {
        assert!(parse_date_ts("2024-03-01").is_some());
        assert!(parse_date_ts("2024-03-01T12:30:00Z").is_some());
        assert!(parse_date_ts("March 1, 2024").is_none());
    }

    #[test]
    fn merge_records_dedupes_by_natural_key() {
        let fetched = vec![record(json!({"versionCode": "ih"}))];
        let inline = vec![
            record(json!({"versionCode": "ih", "extra": true})),
            record(json!({"versionCode": "rh"})),
        ];
        let merged = merge_records(fetched, inline, version_key);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn action_key_is_date_plus_text_hash() {
        let a = record(json!({"actionDate": "2024-01-01", "text": "Passed House"}));
        let b = record(json!({"date": "2024-01-01", "description": "Passed House"}));
        assert_eq!(action_key(&a), action_key(&b));
    }

    #[test]
    fn blame_dedupes_and_caps() {
        let timeline: Vec<PolicyTimelineEntry> = (0..30)
            .map(|i| PolicyTimelineEntry {
                version_id: format!("v{}", i % 5),
                label: "Revision".to_string(),
                issued_on: Some("2024-01-01".to_string()),
                change_summary: None,
                source_uri: None,
            })
            .collect();
        let blame = build_blame(&[], &[], &timeline, None, &[]);
        // 30 entries collapse to 5 distinct (versionId, heading, date) keys.
        assert_eq!(blame.len(), 5);
        assert!(blame.len() <= MAX_BLAME);
    }

    #[test]
    fn blame_falls_back_to_actions() {
        let actions = vec![
            PolicyActionEvent {
                action_type: "IntroReferral".to_string(),
                date: Some("2024-01-03".to_string()),
                actor: Some("House".to_string()),
                description: Some("Introduced in House".to_string()),
                link: None,
            };
            5
        ];
        let blame = build_blame(&[], &[], &[], None, &actions);
        assert_eq!(blame.len(), FALLBACK_BLAME_ACTIONS);
        assert_eq!(blame[0].author.as_deref(), Some("House"));
    }

    #[test]
    fn blame_timeline_marks_first_as_introduced() {
        let timeline = vec![
            PolicyTimelineEntry {
                version_id: "ih".to_string(),
                label: "Introduced in House".to_string(),
                issued_on: Some("2023-01-01".to_string()),
                change_summary: Some(ChangeSummary { added: 1, removed: 0, modified: 0 }),
                source_uri: None,
            },
            PolicyTimelineEntry {
                version_id: "rh".to_string(),
                label: "Reported in House".to_string(),
                issued_on: Some("2023-06-01".to_string()),
                change_summary: None,
                source_uri: None,
            },
        ];
        let blame = blame_from_timeline(&timeline, None);
        assert_eq!(blame[0].action_type.as_deref(), Some("Introduced"));
        assert_eq!(blame[1].action_type.as_deref(), Some("Revision"));
    }

    #[test]
    fn metadata_prefers_locator_identity() {
        let bill = record(json!({
            "title": "Sample Act",
            "congress": 999,
            "sponsors": [{"fullName": "Rep. A. Smith", "party": "X", "state": "MN"}],
            "summaries": [{"text": "Does things."}],
        }));
        let locator = BillLocator::parse("118-hr-9").unwrap();
        let metadata = extract_metadata(&bill, &locator);
        assert_eq!(metadata.congress, Some(118));
        assert_eq!(metadata.title.as_deref(), Some("Sample Act"));
        assert_eq!(metadata.summary.as_deref(), Some("Does things."));
        assert_eq!(
            metadata.sponsor.as_ref().map(|s| s.name.as_str()),
            Some("Rep. A. Smith")
        );
    }

    #[test]
    fn synthesized_timeline_uses_introduction_date() {
        let bill = record(json!({"introducedDate": "2024-02-02"}));
        let timeline = synthesize_timeline(&bill);
        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline[0].label, "Introduced");
        assert_eq!(timeline[0].issued_on.as_deref(), Some("2024-02-02"));
    }

    #[test]
    fn map_actions_reads_alias_fields() {
        let actions = vec![record(json!({
            "actionDate": "2024-05-05",
            "text": "Passed Senate",
            "chamber": "Senate",
            "url": "https://x/action",
        }))];
        let events = map_actions(&actions);
        assert_eq!(events[0].action_type, "action");
        assert_eq!(events[0].date.as_deref(), Some("2024-05-05"));
        assert_eq!(events[0].actor.as_deref(), Some("Senate"));
        assert_eq!(events[0].description.as_deref(), Some("Passed Senate"));
    }
}
