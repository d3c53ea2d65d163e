//! Grounded answer assembly: a context digest built from the pipeline's
//! evidence, a constrained generative completion over it, and a
//! deterministic formatter that guarantees a cited answer whenever hits
//! exist.

use ai_client::{truncate_to_char_boundary, Claude};
use policyglass_common::{
    Citation, GroundedAnswer, InfluenceResult, PolicyDnaResult, PolicySearchHit,
};

/// Hits quoted in the digest.
const DIGEST_POLICIES: usize = 3;
/// Most-recent timeline entries quoted in the digest.
const DIGEST_TIMELINE: usize = 3;
/// Context handed to the model is bounded; the digest is short but the
/// question is caller-controlled.
const MAX_PROMPT_BYTES: usize = 12_000;

const GROUNDER_SYSTEM_PROMPT: &str = "You are a legislative research assistant. \
Answer the user's question using ONLY the numbered context lines provided; never \
introduce outside facts. Choose citations only from the provided citation list. \
Describe the record without advising, recommending, or urging any action. If the \
context cannot answer the question, say so plainly.";

pub struct GrounderInput<'a> {
    pub question: &'a str,
    pub policies: &'a [PolicySearchHit],
    pub dna: Option<&'a PolicyDnaResult>,
    pub influence: Option<&'a InfluenceResult>,
}

struct DigestLine {
    text: String,
    citation: Citation,
}

/// Produce a cited answer for the question. Never fails: an empty hit list
/// is a terminal "no match" answer, and any generative failure falls back to
/// the deterministic formatter.
pub async fn ground_answer(claude: Option<&Claude>, input: GrounderInput<'_>) -> GroundedAnswer {
    if input.policies.is_empty() {
        return GroundedAnswer {
            answer: format!(
                "I could not find a bill that directly matches \"{}\". Try narrowing \
                 the request with a bill number, chamber, or congress session.",
                input.question
            ),
            citations: Vec::new(),
            disclaimers: Some(vec![
                "No matching bills returned by the bill registry".to_string()
            ]),
        };
    }

    let digest = build_digest(input.policies, input.dna, input.influence);

    if let Some(claude) = claude {
        match generate_answer(claude, input.question, &digest).await {
            Ok(answer) => return answer,
            Err(err) => {
                tracing::warn!(error = %err, "Generative grounding failed; using deterministic formatter");
            }
        }
    }

    format_deterministic(input.question, &digest)
}

/// Ordered evidence digest: top search hits, the most recent timeline
/// entries, and the leading lobbying/finance records, each paired with a
/// citation.
fn build_digest(
    policies: &[PolicySearchHit],
    dna: Option<&PolicyDnaResult>,
    influence: Option<&InfluenceResult>,
) -> Vec<DigestLine> {
    let mut lines = Vec::new();

    for hit in policies.iter().take(DIGEST_POLICIES) {
        let section = hit.sections.first();
        let clause = section
            .and_then(|s| s.heading.as_deref())
            .unwrap_or("summary");
        let snippet = section
            .map(|s| s.snippet.as_str())
            .or(hit.summary.as_deref())
            .or(hit.latest_action.as_deref())
            .unwrap_or(hit.title.as_str());
        let url = section
            .and_then(|s| s.source_uri.clone())
            .unwrap_or_else(|| bill_page_url(hit));
        lines.push(DigestLine {
            text: format!(
                "• {} ({}) – {}: {}",
                hit.title, hit.jurisdiction, clause, snippet
            ),
            citation: Citation {
                label: hit.title.clone(),
                url,
            },
        });
    }

    if let Some(dna) = dna {
        let start = dna.timeline.len().saturating_sub(DIGEST_TIMELINE);
        for version in &dna.timeline[start..] {
            let change = version.change_summary.unwrap_or_default();
            lines.push(DigestLine {
                text: format!(
                    "• {} issued {} with {} additions and {} removals",
                    version.label,
                    version.issued_on.as_deref().unwrap_or("unknown date"),
                    change.added,
                    change.removed
                ),
                citation: Citation {
                    label: format!("{} text", version.label),
                    url: version
                        .source_uri
                        .clone()
                        .unwrap_or_else(|| "https://www.govinfo.gov/".to_string()),
                },
            });
        }
    }

    if let Some(influence) = influence {
        if let Some(top) = influence.lobbying.first() {
            lines.push(DigestLine {
                text: format!(
                    "• Lobbying filings show {} lobbying for {} on {} in {}",
                    top.registrant,
                    top.client,
                    top.issue.as_deref().unwrap_or("the bill"),
                    top.period.as_deref().unwrap_or("recent cycles")
                ),
                citation: Citation {
                    label: top.client.clone(),
                    url: top.source_url.clone().unwrap_or_else(|| {
                        influence
                            .metadata
                            .links
                            .get("lda")
                            .cloned()
                            .unwrap_or_else(|| "https://lda.senate.gov/".to_string())
                    }),
                },
            });
        }
        if let Some(finance) = influence.finance.first() {
            lines.push(DigestLine {
                text: format!(
                    "• Campaign-finance reports list {} receiving ${} in cycle {}",
                    finance.committee_name,
                    finance
                        .total_receipts
                        .map(|r| format!("{:.0}", r))
                        .unwrap_or_else(|| "N/A".to_string()),
                    finance
                        .cycle
                        .map(|c| c.to_string())
                        .unwrap_or_default()
                ),
                citation: Citation {
                    label: finance.committee_name.clone(),
                    url: finance.source_url.clone().unwrap_or_else(|| {
                        influence
                            .metadata
                            .links
                            .get("fec")
                            .cloned()
                            .unwrap_or_else(|| "https://www.fec.gov/".to_string())
                    }),
                },
            });
        }
    }

    lines
}

fn bill_page_url(hit: &PolicySearchHit) -> String {
    format!(
        "https://www.congress.gov/bill/{}th-congress/{}/{}",
        hit.congress, hit.bill_type, hit.bill_number
    )
}

/// Constrained completion: the model sees only the digest and must return a
/// shape-valid answer. Shape violations are errors so the caller can fall
/// back.
async fn generate_answer(
    claude: &Claude,
    question: &str,
    digest: &[DigestLine],
) -> anyhow::Result<GroundedAnswer> {
    let context: String = digest
        .iter()
        .enumerate()
        .map(|(idx, line)| format!("{}. {}\n", idx + 1, line.text))
        .collect();
    let citations: Vec<&Citation> = digest.iter().map(|line| &line.citation).collect();
    let citation_list = serde_json::to_string(&citations)?;

    let user_prompt = format!(
        "Question: {}\n\nContext lines:\n{}\nAvailable citations:\n{}",
        question, context, citation_list
    );
    let user_prompt = truncate_to_char_boundary(&user_prompt, MAX_PROMPT_BYTES);

    let answer: GroundedAnswer = claude.extract(GROUNDER_SYSTEM_PROMPT, user_prompt).await?;

    if answer.answer.trim().is_empty() {
        anyhow::bail!("model returned an empty answer");
    }
    Ok(answer)
}

/// Deterministic fallback: the digest lines become the prose and the
/// citation list is exactly the digest's citations.
fn format_deterministic(question: &str, digest: &[DigestLine]) -> GroundedAnswer {
    let mut parts = vec![format!("Here is what I found about \"{}\":", question)];
    parts.extend(digest.iter().map(|line| line.text.clone()));
    parts.push("All information is descriptive and sourced from official records.".to_string());

    GroundedAnswer {
        answer: parts.join("\n"),
        citations: digest.iter().map(|line| line.citation.clone()).collect(),
        disclaimers: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use policyglass_common::{
        ChangeSummary, DnaMetadata, FinanceRecord, InfluenceMetadata, LobbyingRecord,
        PolicySectionHit, PolicyTimelineEntry,
    };

    fn hit(title: &str) -> PolicySearchHit {
        PolicySearchHit {
            bill_id: "118-hr-1".to_string(),
            congress: 118,
            bill_type: "hr".to_string(),
            bill_number: "1".to_string(),
            title: title.to_string(),
            status: "Introduced".to_string(),
            latest_action: Some("Referred to committee".to_string()),
            summary: Some("A summary".to_string()),
            jurisdiction: "federal".to_string(),
            sections: vec![PolicySectionHit {
                id: "1-summary".to_string(),
                heading: Some("Summary".to_string()),
                snippet: "Does things".to_string(),
                score: 0.82,
                source_uri: Some("https://x/section".to_string()),
            }],
            confidence: 90,
            sponsor: None,
        }
    }

    fn dna() -> PolicyDnaResult {
        PolicyDnaResult {
            bill_id: "118-hr-1".to_string(),
            timeline: (0..5)
                .map(|i| PolicyTimelineEntry {
                    version_id: format!("v{i}"),
                    label: format!("Version {i}"),
                    issued_on: Some(format!("2024-0{}-01", i + 1)),
                    change_summary: Some(ChangeSummary {
                        added: i as u32,
                        removed: 1,
                        modified: 0,
                    }),
                    source_uri: None,
                })
                .collect(),
            blame: vec![],
            actions: vec![],
            metadata: DnaMetadata::default(),
        }
    }

    fn influence() -> InfluenceResult {
        InfluenceResult {
            lobbying: vec![LobbyingRecord {
                id: "f1".to_string(),
                client: "Acme Health".to_string(),
                registrant: "Lobby LLC".to_string(),
                amount: None,
                issue: None,
                period: None,
                source_url: None,
            }],
            finance: vec![FinanceRecord {
                candidate_id: "C001".to_string(),
                committee_name: "Friends of A".to_string(),
                total_receipts: Some(123456.0),
                cycle: Some(2024),
                source_url: None,
            }],
            metadata: InfluenceMetadata::default(),
        }
    }

    #[tokio::test]
    async fn empty_policies_is_terminal_with_disclaimer() {
        let answer = ground_answer(
            None,
            GrounderInput {
                question: "what about hr 1?",
                policies: &[],
                dna: None,
                influence: None,
            },
        )
        .await;
        assert!(answer.citations.is_empty());
        assert!(answer.disclaimers.as_ref().is_some_and(|d| !d.is_empty()));
        assert!(answer.answer.contains("could not find"));
    }

    #[tokio::test]
    async fn deterministic_fallback_cites_every_digest_line() {
        let policies = vec![hit("Act One"), hit("Act Two"), hit("Act Three"), hit("Act Four")];
        let dna = dna();
        let influence = influence();
        let answer = ground_answer(
            None,
            GrounderInput {
                question: "status?",
                policies: &policies,
                dna: Some(&dna),
                influence: Some(&influence),
            },
        )
        .await;

        // 3 policy lines + 3 timeline lines + 1 lobbying + 1 finance.
        assert_eq!(answer.citations.len(), 8);
        assert!(!answer.answer.is_empty());
        let line_count = answer.answer.lines().filter(|l| l.starts_with('•')).count();
        assert_eq!(line_count, answer.citations.len());
    }

    #[test]
    fn digest_takes_most_recent_timeline_entries() {
        let dna = dna();
        let lines = build_digest(&[], Some(&dna), None);
        assert_eq!(lines.len(), 3);
        assert!(lines[0].text.contains("Version 2"));
        assert!(lines[2].text.contains("Version 4"));
    }

    #[test]
    fn digest_falls_back_to_bill_page_url() {
        let mut h = hit("Act");
        h.sections.clear();
        let lines = build_digest(&[h], None, None);
        assert_eq!(
            lines[0].citation.url,
            "https://www.congress.gov/bill/118th-congress/hr/1"
        );
    }
}
