//! The fixed pipeline: normalize → search → dna → influence → ground →
//! guardrail. Stages run strictly in sequence; each reads what it needs
//! from the state, writes its own fields, and appends one log line.

use policyglass_common::{
    GroundedAnswer, GuardrailFinding, OrchestratorResult, OrchestratorState, PolicyDetailResponse,
    PolicyFilters, PolicyGlassError,
};

use crate::deps::Deps;
use crate::dna::build_policy_dna;
use crate::grounder::{ground_answer, GrounderInput};
use crate::guardrail::check_guardrail;
use crate::influence::{influence_lookup, InfluenceInput};
use crate::query::normalize_query;
use crate::search::policy_search;

/// Run the full pipeline for one chat request. Structural errors (a
/// malformed explicit bill id) surface immediately; everything else
/// degrades stage-locally, so the caller always receives a complete result.
pub async fn run_orchestrator(
    deps: &Deps,
    query: &str,
    filters: Option<PolicyFilters>,
) -> Result<OrchestratorResult, PolicyGlassError> {
    let mut state = OrchestratorState {
        query: query.to_string(),
        filters,
        ..Default::default()
    };

    // normalize
    state.normalized_query = normalize_query(&state.query);
    state
        .logs
        .push(format!("Normalized query to: {}", state.normalized_query));

    // search
    let effective_query = if state.normalized_query.is_empty() {
        state.query.clone()
    } else {
        state.normalized_query.clone()
    };
    state.policies = policy_search(deps, &effective_query, state.filters.as_ref()).await?;
    state.logs.push(format!(
        "Retrieved {} policies from the bill registry",
        state.policies.len()
    ));

    // dna
    if state.policies.is_empty() {
        state
            .logs
            .push("Skipping DNA computation; no policies available.".to_string());
    } else {
        let primary = &state.policies[0];
        match build_policy_dna(deps, &primary.bill_id).await {
            Ok(dna) => {
                state.logs.push(format!("Built DNA for {}", dna.bill_id));
                state.dna = Some(dna);
            }
            Err(err) => {
                tracing::warn!(error = %err, bill_id = %primary.bill_id, "DNA stage degraded");
                state.logs.push(format!("DNA build failed: {}", err));
            }
        }
    }

    // influence
    if state.policies.is_empty() {
        state
            .logs
            .push("Skipping influence lookup; no policies available.".to_string());
    } else {
        let primary = &state.policies[0];
        let input = InfluenceInput {
            bill_id: primary.bill_id.clone(),
            keywords: vec![effective_query.clone(), primary.title.clone()],
            sponsors: primary
                .sponsor
                .as_ref()
                .filter(|s| !s.name.is_empty())
                .map(|s| vec![s.name.clone()])
                .unwrap_or_default(),
            period: None,
        };
        state.influence = Some(influence_lookup(deps, &input).await);
        state.logs.push("Influence lookup complete".to_string());
    }

    // ground
    let answer = ground_answer(
        deps.claude(),
        GrounderInput {
            question: &state.query,
            policies: &state.policies,
            dna: state.dna.as_ref(),
            influence: state.influence.as_ref(),
        },
    )
    .await;
    state.answer = Some(answer);
    state
        .logs
        .push("Answer grounded with citations".to_string());

    // guardrail
    match &state.answer {
        Some(answer) => {
            let finding = check_guardrail(deps.claude(), &answer.answer).await;
            state.logs.push(
                if finding.ok {
                    "Guardrail passed"
                } else {
                    "Guardrail warnings issued"
                }
                .to_string(),
            );
            state.guardrail_result = Some(finding);
        }
        None => {
            state.guardrail_result = Some(GuardrailFinding {
                ok: false,
                warnings: vec!["Missing answer".to_string()],
            });
        }
    }

    Ok(finalize(state))
}

/// Terminal defaults: whatever a stage left unset becomes a safe,
/// well-typed value so callers never see a partial shape.
fn finalize(state: OrchestratorState) -> OrchestratorResult {
    OrchestratorResult {
        query: state.query,
        filters: state.filters,
        policies: state.policies,
        dna: state.dna,
        influence: state.influence,
        answer: state.answer.unwrap_or_else(|| GroundedAnswer {
            answer: "No answer generated.".to_string(),
            citations: Vec::new(),
            disclaimers: None,
        }),
        guardrail: state.guardrail_result.unwrap_or_else(|| GuardrailFinding {
            ok: false,
            warnings: vec!["Guardrail missing".to_string()],
        }),
        logs: state.logs,
    }
}

/// Detail view for one bill: its DNA plus an influence lookup whose
/// keywords derive from the DNA metadata and early actions.
pub async fn policy_detail(
    deps: &Deps,
    bill_id: &str,
) -> Result<PolicyDetailResponse, PolicyGlassError> {
    let dna = build_policy_dna(deps, bill_id).await?;

    let mut keywords = Vec::new();
    if let Some(title) = &dna.metadata.title {
        keywords.push(title.clone());
    }
    keywords.extend(
        dna.actions
            .iter()
            .filter_map(|action| action.description.clone())
            .take(2),
    );
    let sponsors = dna
        .metadata
        .sponsor
        .as_ref()
        .filter(|s| !s.name.is_empty())
        .map(|s| vec![s.name.clone()])
        .unwrap_or_default();

    let influence = influence_lookup(
        deps,
        &InfluenceInput {
            bill_id: bill_id.to_string(),
            keywords,
            sponsors,
            period: None,
        },
    )
    .await;

    Ok(PolicyDetailResponse {
        bill_id: bill_id.to_string(),
        dna,
        influence,
    })
}
