//! Relevance-ranked bill search over the registry's paginated, alias-happy
//! records.

use std::collections::HashSet;

use serde_json::Value;

use congress_client::{extract_bill_records, SearchParams};
use policyglass_common::records::Record;
use policyglass_common::{
    pick_path_str, pick_str, pick_u32, BillLocator, BillSponsor, PolicyFilters, PolicyGlassError,
    PolicySearchHit, PolicySectionHit,
};

use crate::deps::Deps;

/// Pagination bound: the registry will happily page forever on broad terms.
const MAX_SEARCH_PAGES: usize = 3;
/// Records considered across all pages before scoring.
const RESULT_CAP: usize = 40;
/// Hits returned after ranking.
const MAX_HITS: usize = 8;
/// Minimum blended relevance a hit must reach.
const MIN_RELEVANCE: f32 = 0.12;
/// Short tokens that still carry signal despite their length.
const SIGNAL_ACRONYMS: &[&str] = &[
    "ai", "va", "epa", "fda", "irs", "fcc", "ftc", "sec", "dod", "hud", "nasa", "snap",
];

const TITLE_ALIASES: &[&str] = &["title", "shortTitle", "originChamberTitle", "officialTitle"];
const TYPE_ALIASES: &[&str] = &["billType", "type", "bill_type"];
const NUMBER_ALIASES: &[&str] = &["billNumber", "number", "bill_num", "bill_id"];
const CONGRESS_ALIASES: &[&str] = &["congress", "congressNumber", "congress_num"];
const SPONSOR_NAME_ALIASES: &[&str] = &["fullName", "name", "sponsorName"];
const SECTION_HEADING_ALIASES: &[&str] = &["heading", "title", "sectionTitle"];
const SECTION_TEXT_ALIASES: &[&str] = &["text", "sectionText", "summary", "snippet"];
const SECTION_ID_ALIASES: &[&str] = &["sectionId", "identifier"];
const SECTION_URL_ALIASES: &[&str] = &["url", "citation", "source"];

/// Search the bill registry and rank the results against the query. Upstream
/// failures degrade to an empty hit list; only a malformed explicit bill id
/// is a structural error.
pub async fn policy_search(
    deps: &Deps,
    query: &str,
    filters: Option<&PolicyFilters>,
) -> Result<Vec<PolicySearchHit>, PolicyGlassError> {
    if let Some(bill_id) = filters.and_then(|f| f.bill_id.as_deref()) {
        return fetch_single_bill(deps, bill_id).await;
    }

    let keywords = filters
        .and_then(|f| f.keywords.clone())
        .unwrap_or_default();
    let tokens = build_token_index(query, &keywords);
    if !tokens.iter().any(|t| t.signal) {
        tracing::info!(query, "No signal tokens in query; skipping registry search");
        return Ok(Vec::new());
    }

    let search_text = combine_query(query, &keywords);
    let params = SearchParams {
        congress: filters.and_then(|f| f.congress),
        from_date: filters
            .and_then(|f| f.date_range.as_ref())
            .and_then(|r| r.from.clone()),
        to_date: filters
            .and_then(|f| f.date_range.as_ref())
            .and_then(|r| r.to.clone()),
        page_size: deps.config.search_page_size,
    };

    let pages = match deps
        .congress
        .search_pages(&search_text, &params, MAX_SEARCH_PAGES)
        .await
    {
        Ok(pages) => pages,
        Err(err) => {
            tracing::warn!(error = %err, "Bill search failed; returning no hits");
            return Ok(Vec::new());
        }
    };

    let mut hits = merge_pages(&pages, filters);
    hits.truncate(RESULT_CAP);

    let mut scored: Vec<(f32, PolicySearchHit)> = hits
        .into_iter()
        .filter_map(|hit| {
            let relevance = relevance_score(&hit, &tokens);
            (relevance >= MIN_RELEVANCE).then_some((relevance, hit))
        })
        .collect();
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(MAX_HITS);

    let total = scored.len();
    let ranked: Vec<PolicySearchHit> = scored
        .into_iter()
        .enumerate()
        .map(|(rank, (relevance, mut hit))| {
            hit.confidence = confidence(relevance, rank, total, hit.summary.is_some());
            hit
        })
        .collect();

    tracing::info!(count = ranked.len(), query, "Ranked policy search hits");
    Ok(ranked)
}

async fn fetch_single_bill(
    deps: &Deps,
    bill_id: &str,
) -> Result<Vec<PolicySearchHit>, PolicyGlassError> {
    let locator = BillLocator::parse(bill_id)?;
    let detail = match deps
        .congress
        .bill_detail(locator.congress, &locator.bill_type, &locator.bill_number)
        .await
    {
        Ok(detail) => detail,
        Err(err) => {
            tracing::warn!(error = %err, bill_id, "Bill detail fetch failed; returning no hits");
            return Ok(Vec::new());
        }
    };

    let records = extract_bill_records(&detail);
    let Some(mut hit) = records
        .first()
        .and_then(|record| map_bill_record(record, Some(locator.congress)))
    else {
        return Ok(Vec::new());
    };
    hit.confidence = confidence(0.0, 0, 1, hit.summary.is_some());
    Ok(vec![hit])
}

/// Flatten result pages to hits, skipping records without a usable identity
/// and deduping by composite bill id across pages.
fn merge_pages(pages: &[Value], filters: Option<&PolicyFilters>) -> Vec<PolicySearchHit> {
    let fallback_congress = filters.and_then(|f| f.congress);
    let mut seen: HashSet<String> = HashSet::new();
    let mut hits = Vec::new();
    for page in pages {
        for record in extract_bill_records(page) {
            let Some(hit) = map_bill_record(&record, fallback_congress) else {
                continue;
            };
            if seen.insert(hit.bill_id.clone()) {
                hits.push(hit);
            }
        }
    }
    hits
}

/// Map one reconciled registry record to a search hit. Records missing the
/// bill type or number cannot form a composite id and are skipped.
fn map_bill_record(record: &Record, fallback_congress: Option<u32>) -> Option<PolicySearchHit> {
    let bill_type = pick_str(record, TYPE_ALIASES)?.to_lowercase();
    let bill_number = pick_str(record, NUMBER_ALIASES)?;
    let congress = pick_u32(record, CONGRESS_ALIASES)
        .or(fallback_congress)
        .unwrap_or(0);

    let latest_action = pick_path_str(record, &[&["latestAction", "text"]]).or_else(|| {
        record
            .get("actions")
            .and_then(Value::as_array)
            .and_then(|a| a.first())
            .and_then(Value::as_object)
            .and_then(|a| pick_str(a, &["text"]))
    });
    let summary = summary_text(record).or_else(|| {
        pick_str(record, &["titleDescription"]).or_else(|| latest_action.clone())
    });

    Some(PolicySearchHit {
        bill_id: format!("{}-{}-{}", congress, bill_type, bill_number),
        congress,
        bill_type: bill_type.clone(),
        bill_number,
        title: pick_str(record, TITLE_ALIASES).unwrap_or_else(|| "Untitled bill".to_string()),
        status: pick_str(record, &["currentStatus"])
            .or_else(|| pick_path_str(record, &[&["latestAction", "text"]]))
            .unwrap_or_else(|| "Unknown".to_string()),
        latest_action,
        summary,
        jurisdiction: "federal".to_string(),
        sections: extract_sections(record),
        confidence: 0,
        sponsor: extract_sponsor(record),
    })
}

fn summary_text(record: &Record) -> Option<String> {
    pick_path_str(record, &[&["summary", "text"]]).or_else(|| {
        record
            .get("summaries")
            .and_then(|s| s.as_array())
            .and_then(|s| s.first())
            .and_then(|s| s.as_object())
            .and_then(|s| pick_str(s, &["text"]))
    })
}

fn extract_sponsor(record: &Record) -> Option<BillSponsor> {
    let sponsors = record.get("sponsors").and_then(Value::as_array)?;
    let first = sponsors.first()?.as_object()?;
    Some(BillSponsor {
        name: pick_str(first, SPONSOR_NAME_ALIASES).unwrap_or_default(),
        party: pick_str(first, &["party"]),
        state: pick_str(first, &["state"]),
        bioguide_id: pick_str(first, &["bioguideId", "bioguide_id", "bioguide"]),
    })
}

/// Pull snippet sections out of a bill record: its summary plus up to three
/// declared sections.
fn extract_sections(record: &Record) -> Vec<PolicySectionHit> {
    let mut sections = Vec::new();
    let bill_key = pick_str(record, NUMBER_ALIASES).unwrap_or_else(|| "bill".to_string());

    if let Some(summary) = summary_text(record) {
        sections.push(PolicySectionHit {
            id: format!("{}-summary", bill_key),
            heading: pick_path_str(record, &[&["summary", "title"]]),
            snippet: clip(&summary, 300),
            score: 0.82,
            source_uri: pick_path_str(record, &[&["summary", "url"]])
                .or_else(|| pick_str(record, &["url"])),
        });
    }

    let declared = record
        .get("sections")
        .or_else(|| record.get("sectionList"))
        .and_then(Value::as_array);
    if let Some(declared) = declared {
        for (idx, section) in declared.iter().take(3).enumerate() {
            let Some(section) = section.as_object() else {
                continue;
            };
            let Some(text) = pick_str(section, SECTION_TEXT_ALIASES) else {
                continue;
            };
            sections.push(PolicySectionHit {
                id: pick_str(section, SECTION_ID_ALIASES)
                    .unwrap_or_else(|| format!("{}-section-{}", bill_key, idx)),
                heading: pick_str(section, SECTION_HEADING_ALIASES),
                snippet: clip(&text, 280),
                score: 0.7 - idx as f32 * 0.05,
                source_uri: pick_str(section, SECTION_URL_ALIASES)
                    .or_else(|| pick_str(record, &["url"])),
            });
        }
    }

    sections
}

fn clip(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

// --- Token index ---

#[derive(Debug, Clone)]
struct QueryToken {
    variants: Vec<String>,
    signal: bool,
}

fn combine_query(query: &str, keywords: &[String]) -> String {
    let mut combined = query.trim().to_string();
    for keyword in keywords {
        let keyword = keyword.trim();
        if !keyword.is_empty() && !combined.contains(keyword) {
            combined.push(' ');
            combined.push_str(keyword);
        }
    }
    combined
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| t.len() > 1)
        .map(str::to_string)
        .collect()
}

/// Lightweight stemming: the token itself plus plural/suffix-stripped forms.
fn stem_variants(token: &str) -> Vec<String> {
    let mut variants = vec![token.to_string()];
    for suffix in ["ation", "ment", "ing", "ed", "es", "al", "s"] {
        if let Some(stem) = token.strip_suffix(suffix) {
            if stem.len() >= 3 && !variants.iter().any(|v| v == stem) {
                variants.push(stem.to_string());
            }
        }
    }
    variants
}

fn is_signal(token: &str) -> bool {
    token.len() >= 4
        || token.chars().all(|c| c.is_ascii_digit())
        || SIGNAL_ACRONYMS.contains(&token)
}

fn build_token_index(query: &str, keywords: &[String]) -> Vec<QueryToken> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut tokens = Vec::new();
    for token in tokenize(&combine_query(query, keywords)) {
        if !seen.insert(token.clone()) {
            continue;
        }
        tokens.push(QueryToken {
            variants: stem_variants(&token),
            signal: is_signal(&token),
        });
    }
    tokens
}

fn token_matches(field_tokens: &HashSet<String>, token: &QueryToken) -> bool {
    field_tokens.iter().any(|field_token| {
        token.variants.iter().any(|v| v == field_token)
            || stem_variants(field_token)
                .iter()
                .any(|fv| token.variants.contains(fv))
    })
}

// --- Scoring ---

/// Blend of weighted token matches (70%) and field coverage (30%), with a
/// literal-alias bonus and an all-signal-tokens bonus. A hit matching no
/// signal token scores zero regardless of stop-word overlap.
fn relevance_score(hit: &PolicySearchHit, tokens: &[QueryToken]) -> f32 {
    if tokens.is_empty() {
        return 0.0;
    }

    let section_text = hit
        .sections
        .iter()
        .map(|s| s.snippet.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let sponsor_name = hit.sponsor.as_ref().map(|s| s.name.clone()).unwrap_or_default();

    // Weights descend with how authoritative a field match is.
    let fields: Vec<(f32, &str)> = [
        (3.0_f32, hit.title.as_str()),
        (2.0, hit.summary.as_deref().unwrap_or("")),
        (1.5, hit.latest_action.as_deref().unwrap_or("")),
        (1.0, section_text.as_str()),
        (0.5, sponsor_name.as_str()),
    ]
    .into_iter()
    .filter(|(_, text)| !text.trim().is_empty())
    .collect();
    if fields.is_empty() {
        return 0.0;
    }

    let total_weight: f32 = fields.iter().map(|(w, _)| w).sum();
    let mut matched_weight = 0.0_f32;
    let mut covered_fields = 0usize;
    let mut matched_tokens: HashSet<usize> = HashSet::new();

    for (weight, text) in &fields {
        let field_tokens: HashSet<String> = tokenize(text).into_iter().collect();
        let mut field_matched = 0usize;
        for (idx, token) in tokens.iter().enumerate() {
            if token_matches(&field_tokens, token) {
                field_matched += 1;
                matched_tokens.insert(idx);
            }
        }
        if field_matched > 0 {
            covered_fields += 1;
            matched_weight += weight * field_matched as f32 / tokens.len() as f32;
        }
    }

    let signal_matched = matched_tokens
        .iter()
        .filter(|idx| tokens[**idx].signal)
        .count();
    if signal_matched == 0 {
        return 0.0;
    }

    let match_score = matched_weight / total_weight;
    let coverage = covered_fields as f32 / fields.len() as f32;
    let mut score = 0.7 * match_score + 0.3 * coverage;

    // Literal "HR 1234"-style mention of the bill's own identity.
    let alias = format!("{} {}", hit.bill_type, hit.bill_number);
    if fields
        .iter()
        .any(|(_, text)| text.to_lowercase().contains(&alias))
    {
        score += 0.15;
    }

    let signal_total = tokens.iter().filter(|t| t.signal).count();
    if signal_total > 0 && signal_matched == signal_total {
        score += 0.05;
    }

    score.clamp(0.0, 0.99)
}

/// Rank heuristic kept from the original scorer: base 70, decaying rank
/// bonus, summary coverage, and a small bump for busy result sets.
fn rank_heuristic(rank: usize, total: usize, has_summary: bool) -> u8 {
    let rank_bonus = 20_i32.saturating_sub(rank as i32 * 5).max(0);
    let coverage = if has_summary { 8 } else { 0 };
    let total_bonus = if total > 3 { 2 } else { 0 };
    (70 + rank_bonus + coverage + total_bonus).min(99) as u8
}

/// Final 0–99 confidence: whichever is larger of scaled relevance and the
/// rank heuristic, floored at 35.
fn confidence(relevance: f32, rank: usize, total: usize, has_summary: bool) -> u8 {
    let from_relevance = (relevance * 100.0) as u8;
    from_relevance
        .max(rank_heuristic(rank, total, has_summary))
        .clamp(35, 99)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn tokenize_drops_short_tokens() {
        assert_eq!(tokenize("a healthcare, bill!"), vec!["healthcare", "bill"]);
    }

    #[test]
    fn stem_variants_strip_common_suffixes() {
        assert!(stem_variants("funding").contains(&"fund".to_string()));
        assert!(stem_variants("reforms").contains(&"reform".to_string()));
        assert!(stem_variants("regulation").contains(&"regul".to_string()));
        // Short stems are not produced.
        assert_eq!(stem_variants("is"), vec!["is".to_string()]);
    }

    #[test]
    fn signal_tokens_by_length_digits_and_acronyms() {
        assert!(is_signal("healthcare"));
        assert!(is_signal("1234"));
        assert!(is_signal("epa"));
        assert!(!is_signal("the"));
        assert!(!is_signal("of"));
    }

    #[test]
    fn map_skips_records_without_identity() {
        assert!(map_bill_record(&record(json!({"title": "No id"})), None).is_none());
        assert!(map_bill_record(&record(json!({"billType": "hr"})), None).is_none());
    }

    #[test]
    fn map_builds_composite_id_with_fallback_congress() {
        let hit = map_bill_record(
            &record(json!({"type": "HR", "number": 42, "title": "Test"})),
            Some(118),
        )
        .unwrap();
        assert_eq!(hit.bill_id, "118-hr-42");
        assert_eq!(hit.title, "Test");
    }

    #[test]
    fn merge_pages_dedupes_overlapping_bills() {
        let page1 = json!({"bills": [
            {"congress": 118, "type": "hr", "number": "1", "title": "One"},
            {"congress": 118, "type": "hr", "number": "2", "title": "Two"},
        ]});
        let page2 = json!({"bills": [
            {"congress": 118, "type": "hr", "number": "2", "title": "Two"},
            {"congress": 118, "type": "s", "number": "3", "title": "Three"},
        ]});
        let hits = merge_pages(&[page1, page2], None);
        assert_eq!(hits.len(), 3);
        let ids: HashSet<_> = hits.iter().map(|h| h.bill_id.clone()).collect();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn sections_include_summary_and_declared() {
        let bill = record(json!({
            "number": "7",
            "summary": {"text": "A summary of the act", "url": "https://x/sum"},
            "sections": [
                {"heading": "Sec. 1", "text": "Short title"},
                {"heading": "Sec. 2", "sectionText": "Definitions"},
            ],
        }));
        let sections = extract_sections(&bill);
        assert_eq!(sections.len(), 3);
        assert_eq!(sections[0].id, "7-summary");
        assert!(sections[1].score > sections[2].score);
        assert!(sections.iter().all(|s| s.score <= 0.99));
    }

    fn sample_hit(title: &str, summary: Option<&str>) -> PolicySearchHit {
        PolicySearchHit {
            bill_id: "118-hr-1234".to_string(),
            congress: 118,
            bill_type: "hr".to_string(),
            bill_number: "1234".to_string(),
            title: title.to_string(),
            status: "Introduced".to_string(),
            latest_action: None,
            summary: summary.map(str::to_string),
            jurisdiction: "federal".to_string(),
            sections: vec![],
            confidence: 0,
            sponsor: None,
        }
    }

    #[test]
    fn relevance_rewards_title_matches() {
        let tokens = build_token_index("rural hospital funding", &[]);
        let on_topic = sample_hit(
            "Rural Hospital Funding Act",
            Some("Expands funding for rural hospitals"),
        );
        let off_topic = sample_hit("National Park Renaming Act", Some("Renames a park"));
        assert!(relevance_score(&on_topic, &tokens) > 0.3);
        assert_eq!(relevance_score(&off_topic, &tokens), 0.0);
    }

    #[test]
    fn relevance_rejects_stop_word_only_matches() {
        let tokens = build_token_index("the state of the union", &[]);
        // "the"/"of" are not signal tokens; "state"/"union" are, and miss.
        let hit = sample_hit("Irrigation Act", Some("About the management of water"));
        assert_eq!(relevance_score(&hit, &tokens), 0.0);
    }

    #[test]
    fn relevance_alias_bonus_applies() {
        let tokens = build_token_index("hr 1234 status", &[]);
        let with_alias = sample_hit("An Act cited as HR 1234", Some("Status updates"));
        let without_alias = sample_hit("An unrelated Act about status", None);
        assert!(relevance_score(&with_alias, &tokens) > relevance_score(&without_alias, &tokens));
    }

    #[test]
    fn relevance_stays_in_bounds() {
        let tokens = build_token_index("hr 1234 healthcare funding reform", &[]);
        let hit = sample_hit(
            "HR 1234 healthcare funding reform",
            Some("hr 1234 healthcare funding reform"),
        );
        let score = relevance_score(&hit, &tokens);
        assert!(score > 0.0 && score <= 0.99);
    }

    #[test]
    fn confidence_bounds_hold() {
        assert!(confidence(0.0, 0, 1, false) >= 35);
        assert!(confidence(0.99, 0, 10, true) <= 99);
        for rank in 0..10 {
            let c = confidence(0.5, rank, 10, true);
            assert!((35..=99).contains(&c));
        }
    }

    #[test]
    fn rank_heuristic_decays_with_rank() {
        assert!(rank_heuristic(0, 1, false) > rank_heuristic(4, 1, false));
        assert_eq!(rank_heuristic(0, 1, false), 90);
        assert_eq!(rank_heuristic(0, 5, true), 99);
    }

    #[test]
    fn no_signal_tokens_produce_no_index_signal() {
        let tokens = build_token_index("of a an", &[]);
        assert!(!tokens.iter().any(|t| t.signal));
    }
}
