//! Best-effort cross-referencing of a bill against the lobbying-filings and
//! campaign-finance registries. Either source failing or coming back empty
//! only adds an explanatory note; it never aborts the sibling lookup.

use std::collections::HashSet;

use serde_json::Value;

use lda_client::FilingSearch;
use policyglass_common::records::{stable_key, unwrap_collection, Record};
use policyglass_common::{
    pick_f64, pick_str, pick_u32, DateRange, FinanceRecord, InfluenceMetadata, InfluenceResult,
    LobbyingRecord,
};

use crate::deps::Deps;

/// Search-term variants tried against the filings registry.
const MAX_SEARCH_TERMS: usize = 5;
/// Stop querying further variants once this many filings accumulate.
const LOBBYING_TARGET: usize = 10;
/// Words kept when shortening a long keyword phrase.
const PHRASE_PREFIX_WORDS: usize = 4;
const LDA_PER_PAGE: u32 = 10;

const FILING_ID_ALIASES: &[&str] = &["id", "filing_uuid", "filing_id", "registration_number"];
const CLIENT_ALIASES: &[&str] = &["client_name", "client"];
const CLIENT_NESTED_ALIASES: &[&str] = &["name", "client_name", "organization_name"];
const REGISTRANT_ALIASES: &[&str] = &["registrant_name", "registrant"];
const REGISTRANT_NESTED_ALIASES: &[&str] = &["name", "organization_name"];
const AMOUNT_ALIASES: &[&str] = &["amount", "income_amount", "expenses", "income"];
const ISSUE_ALIASES: &[&str] = &["specific_issue", "general_issue_area"];
const ISSUE_NESTED_ALIASES: &[&str] = &["issue", "description", "specific_issue"];
const PERIOD_ALIASES: &[&str] = &["period", "report_period", "effective_date", "filing_period"];
const FILING_URL_ALIASES: &[&str] = &["url", "pdf_url", "filing_url", "document_url"];
const CANDIDATE_ID_ALIASES: &[&str] = &["candidate_id", "id"];
const COMMITTEE_ALIASES: &[&str] = &["committee_name", "candidate_name"];
const RECEIPTS_ALIASES: &[&str] = &["receipts", "total_receipts"];

#[derive(Debug, Clone, Default)]
pub struct InfluenceInput {
    pub bill_id: String,
    pub keywords: Vec<String>,
    pub sponsors: Vec<String>,
    pub period: Option<DateRange>,
}

/// Run the lobbying and finance lookups concurrently and assemble the
/// result with honest gap notes. Infallible by construction.
pub async fn influence_lookup(deps: &Deps, input: &InfluenceInput) -> InfluenceResult {
    let search_terms = lobbying_search_terms(&input.bill_id, &input.keywords);

    let (lobbying, finance) = tokio::join!(
        fetch_lobbying(deps, &search_terms, input.period.as_ref()),
        fetch_finance(deps, &input.sponsors),
    );

    let mut notes = Vec::new();
    if !deps.fec.has_key() {
        notes.push("FEC API key not provided; finance data may be limited.".to_string());
    }
    if lobbying.is_empty() {
        notes.push("No recent lobbying filings matched the query.".to_string());
    }
    if finance.is_empty() {
        notes.push("No campaign-finance totals were matched to bill sponsors.".to_string());
    }

    let mut links = std::collections::BTreeMap::new();
    links.insert("lda".to_string(), deps.lda.filings_link());
    links.insert(
        "fec".to_string(),
        "https://api.open.fec.gov/developers/".to_string(),
    );

    tracing::info!(
        lobbying = lobbying.len(),
        finance = finance.len(),
        terms = search_terms.len(),
        "Influence lookup complete"
    );

    InfluenceResult {
        lobbying,
        finance,
        metadata: InfluenceMetadata {
            notes,
            links,
            search_terms,
        },
    }
}

/// Variants tried against the filings search: the bill id with dashes as
/// spaces, each keyword phrase, and a shortened prefix of long phrases.
/// Deduplicated case-insensitively and capped.
pub fn lobbying_search_terms(bill_id: &str, keywords: &[String]) -> Vec<String> {
    let mut terms = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut push = |term: String, terms: &mut Vec<String>| {
        let trimmed = term.trim().to_string();
        if !trimmed.is_empty() && seen.insert(trimmed.to_lowercase()) {
            terms.push(trimmed);
        }
    };

    push(bill_id.replace('-', " "), &mut terms);
    for keyword in keywords {
        push(keyword.clone(), &mut terms);
        let words: Vec<&str> = keyword.split_whitespace().collect();
        if words.len() > PHRASE_PREFIX_WORDS {
            push(words[..PHRASE_PREFIX_WORDS].join(" "), &mut terms);
        }
    }

    terms.truncate(MAX_SEARCH_TERMS);
    terms
}

async fn fetch_lobbying(
    deps: &Deps,
    terms: &[String],
    period: Option<&DateRange>,
) -> Vec<LobbyingRecord> {
    let mut records: Vec<LobbyingRecord> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for term in terms {
        if records.len() >= LOBBYING_TARGET {
            break;
        }
        let search = FilingSearch {
            search: term.clone(),
            from_date: period.and_then(|p| p.from.clone()),
            to_date: period.and_then(|p| p.to.clone()),
            per_page: LDA_PER_PAGE,
        };
        let payload = match deps.lda.search_filings(&search).await {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(error = %err, term, "Lobbying filings search failed; trying next term");
                continue;
            }
        };
        for record in map_lobbying_records(&payload) {
            if seen.insert(record.id.clone()) {
                records.push(record);
            }
        }
    }

    records.truncate(LOBBYING_TARGET);
    records
}

/// Map a raw filings payload into lobbying records, deduped by filing id.
/// Filings without any stable id get a deterministic hash of their
/// distinguishing fields.
pub fn map_lobbying_records(payload: &Value) -> Vec<LobbyingRecord> {
    let object = payload.as_object();
    let results = object
        .map(|o| {
            ["results", "data", "filings"]
                .iter()
                .map(|key| unwrap_collection(o.get(*key)))
                .find(|records| !records.is_empty())
                .unwrap_or_default()
        })
        .unwrap_or_default();

    let mut seen: HashSet<String> = HashSet::new();
    let mut mapped = Vec::new();
    for filing in &results {
        let issues = unwrap_collection(
            filing
                .get("specific_issues")
                .or_else(|| filing.get("specificIssues")),
        );
        let primary_issue = issues.first();
        let client_obj = filing.get("client").and_then(Value::as_object);
        let registrant_obj = filing.get("registrant").and_then(Value::as_object);

        let client = pick_str(filing, CLIENT_ALIASES)
            .or_else(|| client_obj.and_then(|c| pick_str(c, CLIENT_NESTED_ALIASES)))
            .unwrap_or_else(|| "Unknown client".to_string());
        let registrant = pick_str(filing, REGISTRANT_ALIASES)
            .or_else(|| registrant_obj.and_then(|r| pick_str(r, REGISTRANT_NESTED_ALIASES)))
            .unwrap_or_else(|| "Unknown registrant".to_string());
        let period = pick_str(filing, PERIOD_ALIASES).or_else(|| filing_year_period(filing));

        let id = pick_str(filing, FILING_ID_ALIASES).unwrap_or_else(|| {
            stable_key(&[&client, &registrant, period.as_deref().unwrap_or("")])
        });

        let record = LobbyingRecord {
            id,
            client,
            registrant,
            amount: primary_issue
                .and_then(|i| pick_f64(i, &["amount"]))
                .or_else(|| pick_f64(filing, AMOUNT_ALIASES)),
            issue: pick_str(filing, ISSUE_ALIASES)
                .or_else(|| primary_issue.and_then(|i| pick_str(i, ISSUE_NESTED_ALIASES))),
            period,
            source_url: pick_str(filing, FILING_URL_ALIASES).or_else(|| {
                filing
                    .get("document")
                    .and_then(Value::as_object)
                    .and_then(|d| pick_str(d, &["url"]))
            }),
        };
        if seen.insert(record.id.clone()) {
            mapped.push(record);
        }
    }
    mapped
}

fn filing_year_period(filing: &Record) -> Option<String> {
    let year = pick_str(filing, &["year"])?;
    match pick_str(filing, &["quarter"]) {
        Some(quarter) => Some(format!("{} Q{}", year, quarter)),
        None => Some(year),
    }
}

/// Name variants tried against the candidate search, noisiest form last.
pub fn sponsor_name_variants(name: &str) -> Vec<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let mut variants = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut push = |variant: String, variants: &mut Vec<String>| {
        let v = variant.trim().to_string();
        if !v.is_empty() && seen.insert(v.to_lowercase()) {
            variants.push(v);
        }
    };

    push(trimmed.to_string(), &mut variants);
    push(trimmed.replace(',', " ").split_whitespace().collect::<Vec<_>>().join(" "), &mut variants);

    let words: Vec<&str> = trimmed
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .collect();
    if words.len() >= 2 {
        push(words[..2].join(" "), &mut variants);
    }
    if let Some(last) = words.last() {
        push(last.to_string(), &mut variants);
    }

    variants
}

async fn fetch_finance(deps: &Deps, sponsors: &[String]) -> Vec<FinanceRecord> {
    let mut records: Vec<FinanceRecord> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for sponsor in sponsors {
        let Some(candidate_id) = resolve_candidate_id(deps, sponsor).await else {
            tracing::debug!(sponsor, "No FEC candidate matched any name variant");
            continue;
        };
        if !seen.insert(candidate_id.clone()) {
            continue;
        }
        if let Some(record) = fetch_candidate_totals(deps, &candidate_id).await {
            records.push(record);
        }
    }

    records
}

async fn resolve_candidate_id(deps: &Deps, sponsor: &str) -> Option<String> {
    for variant in sponsor_name_variants(sponsor) {
        let payload = match deps.fec.search_candidates(&variant).await {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(error = %err, variant, "FEC candidate search failed");
                continue;
            }
        };
        let candidates = unwrap_collection(payload.get("results"));
        if let Some(id) = candidates
            .first()
            .and_then(|c| pick_str(c, CANDIDATE_ID_ALIASES))
        {
            return Some(id);
        }
    }
    None
}

async fn fetch_candidate_totals(deps: &Deps, candidate_id: &str) -> Option<FinanceRecord> {
    let payload = match deps.fec.candidate_totals(candidate_id).await {
        Ok(payload) => payload,
        Err(err) => {
            tracing::warn!(error = %err, candidate_id, "FEC totals fetch failed");
            return None;
        }
    };
    let record = unwrap_collection(payload.get("results")).into_iter().next()?;
    let cycle = pick_u32(&record, &["cycle"]);

    Some(FinanceRecord {
        candidate_id: candidate_id.to_string(),
        committee_name: pick_str(&record, COMMITTEE_ALIASES)
            .unwrap_or_else(|| candidate_id.to_string()),
        total_receipts: pick_f64(&record, RECEIPTS_ALIASES),
        cycle,
        source_url: Some(deps.fec.candidate_link(candidate_id, cycle)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn search_terms_include_bill_id_and_phrases() {
        let terms = lobbying_search_terms(
            "118-hr-1234",
            &["rural hospital emergency funding act of 2024".to_string()],
        );
        assert_eq!(terms[0], "118 hr 1234");
        assert!(terms.contains(&"rural hospital emergency funding act of 2024".to_string()));
        assert!(terms.contains(&"rural hospital emergency funding".to_string()));
    }

    #[test]
    fn search_terms_dedupe_and_cap() {
        let keywords: Vec<String> = (0..10).map(|i| format!("keyword {}", i)).collect();
        let terms = lobbying_search_terms("118-hr-1", &keywords);
        assert!(terms.len() <= MAX_SEARCH_TERMS);

        let dup = lobbying_search_terms("118-hr-1", &["118 HR 1".to_string()]);
        assert_eq!(dup.len(), 1);
    }

    #[test]
    fn name_variants_cover_noisy_forms() {
        let variants = sponsor_name_variants("Smith, Alice Q.");
        assert!(variants.contains(&"Smith, Alice Q.".to_string()));
        assert!(variants.contains(&"Smith Alice Q.".to_string()));
        assert!(variants.contains(&"Smith Alice".to_string()));
        assert!(variants.contains(&"Q.".to_string()));
        assert!(sponsor_name_variants("  ").is_empty());
    }

    #[test]
    fn map_lobbying_reads_nested_aliases() {
        let payload = json!({"results": [{
            "filing_uuid": "f-1",
            "client": {"name": "Acme Health"},
            "registrant": {"organization_name": "Lobby LLC"},
            "specific_issues": [{"issue": "Hospital funding", "amount": "50000"}],
            "year": 2024,
            "quarter": 2,
            "pdf_url": "https://x/f1.pdf",
        }]});
        let records = map_lobbying_records(&payload);
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.id, "f-1");
        assert_eq!(r.client, "Acme Health");
        assert_eq!(r.registrant, "Lobby LLC");
        assert_eq!(r.amount, Some(50000.0));
        assert_eq!(r.issue.as_deref(), Some("Hospital funding"));
        assert_eq!(r.period.as_deref(), Some("2024 Q2"));
        assert_eq!(r.source_url.as_deref(), Some("https://x/f1.pdf"));
    }

    #[test]
    fn map_lobbying_dedupes_by_filing_id() {
        let payload = json!({"results": [
            {"id": "same", "client_name": "A", "registrant_name": "B"},
            {"id": "same", "client_name": "A", "registrant_name": "B"},
            {"id": "other", "client_name": "C", "registrant_name": "D"},
        ]});
        assert_eq!(map_lobbying_records(&payload).len(), 2);
    }

    #[test]
    fn map_lobbying_fallback_ids_are_deterministic() {
        let payload = json!({"filings": [
            {"client_name": "Acme", "registrant_name": "Lobby LLC", "period": "2024 Q1"},
        ]});
        let first = map_lobbying_records(&payload);
        let second = map_lobbying_records(&payload);
        assert_eq!(first[0].id, second[0].id);
        assert!(!first[0].id.is_empty());
    }

    #[test]
    fn map_lobbying_handles_unknown_shapes() {
        assert!(map_lobbying_records(&json!(null)).is_empty());
        assert!(map_lobbying_records(&json!({"unexpected": true})).is_empty());
        assert!(map_lobbying_records(&json!([1, 2, 3])).is_empty());
    }
}
