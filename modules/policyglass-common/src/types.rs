use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::PolicyGlassError;

// --- Bill identity ---

/// The `(congress, billType, billNumber)` triple identifying one bill.
/// Serialized as the composite id `"<congress>-<billType>-<billNumber>"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillLocator {
    pub congress: u32,
    pub bill_type: String,
    pub bill_number: String,
}

impl BillLocator {
    /// Parse a composite bill id. Malformed ids are structural errors,
    /// distinct from upstream failures.
    pub fn parse(bill_id: &str) -> Result<Self, PolicyGlassError> {
        let mut parts = bill_id.splitn(3, '-');
        let congress = parts.next().unwrap_or_default();
        let bill_type = parts.next().unwrap_or_default();
        let bill_number = parts.next().unwrap_or_default();

        let congress: u32 = congress
            .parse()
            .map_err(|_| PolicyGlassError::InvalidBillId(bill_id.to_string()))?;
        if bill_type.is_empty() || bill_number.is_empty() {
            return Err(PolicyGlassError::InvalidBillId(bill_id.to_string()));
        }

        Ok(Self {
            congress,
            bill_type: bill_type.to_lowercase(),
            bill_number: bill_number.to_string(),
        })
    }

    pub fn composite_id(&self) -> String {
        format!("{}-{}-{}", self.congress, self.bill_type, self.bill_number)
    }

    /// Human alias, e.g. `"HR 1234"`. Used for literal-mention scoring.
    pub fn alias(&self) -> String {
        format!("{} {}", self.bill_type.to_uppercase(), self.bill_number)
    }
}

// --- Search ---

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicySectionHit {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    pub snippet: String,
    /// Relevance of this excerpt, 0.0–0.99.
    pub score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_uri: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillSponsor {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub party: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bioguide_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicySearchHit {
    pub bill_id: String,
    pub congress: u32,
    pub bill_type: String,
    pub bill_number: String,
    pub title: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub jurisdiction: String,
    pub sections: Vec<PolicySectionHit>,
    /// Derived 0–99 integer, never user-supplied.
    pub confidence: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sponsor: Option<BillSponsor>,
}

// --- DNA ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSummary {
    pub added: u32,
    pub removed: u32,
    pub modified: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyTimelineEntry {
    pub version_id: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued_on: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_summary: Option<ChangeSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_uri: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyBlameEntry {
    pub section_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_uri: Option<String>,
}

impl PolicyBlameEntry {
    /// Dedup key for merged blame signals.
    pub fn dedup_key(&self) -> (String, Option<String>, Option<String>) {
        (
            self.section_id.clone(),
            self.heading.clone(),
            self.action_date.clone(),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyActionEvent {
    #[serde(rename = "type")]
    pub action_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DnaMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sponsor: Option<BillSponsor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub congress: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bill_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bill_number: Option<String>,
}

/// Aggregate produced by one DNA build. Owned by that request and never
/// mutated after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyDnaResult {
    pub bill_id: String,
    pub timeline: Vec<PolicyTimelineEntry>,
    pub blame: Vec<PolicyBlameEntry>,
    pub actions: Vec<PolicyActionEvent>,
    pub metadata: DnaMetadata,
}

// --- Influence ---

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LobbyingRecord {
    pub id: String,
    pub client: String,
    pub registrant: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinanceRecord {
    pub candidate_id: String,
    pub committee_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_receipts: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycle: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfluenceMetadata {
    pub notes: Vec<String>,
    pub links: BTreeMap<String, String>,
    pub search_terms: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfluenceResult {
    pub lobbying: Vec<LobbyingRecord>,
    pub finance: Vec<FinanceRecord>,
    pub metadata: InfluenceMetadata,
}

// --- Answer + guardrail ---

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    pub label: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GroundedAnswer {
    pub answer: String,
    pub citations: Vec<Citation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disclaimers: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GuardrailFinding {
    pub ok: bool,
    pub warnings: Vec<String>,
}

// --- Request filters ---

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jurisdiction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub congress: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bill_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
}

// --- Orchestrator ---

/// The single state record threading through the pipeline. Created at
/// request entry, discarded at response. Stages append to `logs`; every
/// other field is last-writer-wins within one run.
#[derive(Debug, Clone, Default)]
pub struct OrchestratorState {
    pub query: String,
    pub normalized_query: String,
    pub filters: Option<PolicyFilters>,
    pub policies: Vec<PolicySearchHit>,
    pub dna: Option<PolicyDnaResult>,
    pub influence: Option<InfluenceResult>,
    pub answer: Option<GroundedAnswer>,
    pub guardrail_result: Option<GuardrailFinding>,
    pub logs: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestratorResult {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<PolicyFilters>,
    pub policies: Vec<PolicySearchHit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dna: Option<PolicyDnaResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub influence: Option<InfluenceResult>,
    pub answer: GroundedAnswer,
    pub guardrail: GuardrailFinding,
    pub logs: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyDetailResponse {
    pub bill_id: String,
    pub dna: PolicyDnaResult,
    pub influence: InfluenceResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_bill_id() {
        let locator = BillLocator::parse("118-hr-1234").unwrap();
        assert_eq!(locator.congress, 118);
        assert_eq!(locator.bill_type, "hr");
        assert_eq!(locator.bill_number, "1234");
        assert_eq!(locator.composite_id(), "118-hr-1234");
        assert_eq!(locator.alias(), "HR 1234");
    }

    #[test]
    fn parse_uppercases_are_normalized() {
        let locator = BillLocator::parse("117-SJRES-12").unwrap();
        assert_eq!(locator.bill_type, "sjres");
    }

    #[test]
    fn parse_rejects_malformed_ids() {
        assert!(BillLocator::parse("hr-1234").is_err());
        assert!(BillLocator::parse("118-hr").is_err());
        assert!(BillLocator::parse("118--1234").is_err());
        assert!(BillLocator::parse("").is_err());
    }

    #[test]
    fn search_hit_serializes_camel_case() {
        let hit = PolicySearchHit {
            bill_id: "118-hr-1".to_string(),
            congress: 118,
            bill_type: "hr".to_string(),
            bill_number: "1".to_string(),
            title: "A bill".to_string(),
            status: "Introduced".to_string(),
            latest_action: None,
            summary: None,
            jurisdiction: "federal".to_string(),
            sections: vec![],
            confidence: 70,
            sponsor: None,
        };
        let json = serde_json::to_value(&hit).unwrap();
        assert_eq!(json["billId"], "118-hr-1");
        assert_eq!(json["billType"], "hr");
        assert!(json.get("latestAction").is_none());
    }

    #[test]
    fn action_event_uses_type_tag() {
        let action = PolicyActionEvent {
            action_type: "vote".to_string(),
            date: None,
            actor: None,
            description: None,
            link: None,
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["type"], "vote");
    }
}
