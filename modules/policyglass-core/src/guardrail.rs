//! Non-advocacy validation of candidate answers. The regex layer always
//! runs; the model pass is advisory and can only make the verdict stricter.

use ai_client::Claude;
use policyglass_common::{detect_advocacy, GuardrailFinding};

const MODERATION_SYSTEM_PROMPT: &str = "You review answers about legislation for \
advocacy. The answer must describe the record without recommending, urging, or \
advising any action by the reader. Return ok=true only when the answer is purely \
descriptive, and list a short warning for every advocacy phrase you find.";

/// Validate an answer. Merge rule: the deterministic layer is fail-closed
/// (its warnings always count) and the generative layer is fail-open (its
/// absence or failure leaves the regex verdict standing).
pub async fn check_guardrail(claude: Option<&Claude>, answer: &str) -> GuardrailFinding {
    let regex_warnings = detect_advocacy(answer);
    let regex_ok = regex_warnings.is_empty();

    let model_finding = match claude {
        Some(claude) => match claude
            .extract::<GuardrailFinding>(MODERATION_SYSTEM_PROMPT, answer)
            .await
        {
            Ok(finding) => Some(finding),
            Err(err) => {
                tracing::warn!(error = %err, "Model guardrail pass failed; using regex verdict only");
                None
            }
        },
        None => None,
    };

    match model_finding {
        Some(model) => GuardrailFinding {
            ok: model.ok && regex_ok,
            warnings: merge_warnings(regex_warnings, model.warnings),
        },
        None => GuardrailFinding {
            ok: regex_ok,
            warnings: regex_warnings,
        },
    }
}

fn merge_warnings(regex: Vec<String>, model: Vec<String>) -> Vec<String> {
    let mut merged = regex;
    for warning in model {
        if !merged.contains(&warning) {
            merged.push(warning);
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn advocacy_fails_without_model() {
        let finding = check_guardrail(None, "You should call your representative").await;
        assert!(!finding.ok);
        assert!(!finding.warnings.is_empty());
    }

    #[tokio::test]
    async fn descriptive_text_passes_without_model() {
        let finding =
            check_guardrail(None, "HR 1234 was reported out of committee in March").await;
        assert!(finding.ok);
        assert!(finding.warnings.is_empty());
    }

    #[test]
    fn merged_warnings_are_a_deduped_union() {
        let warnings = merge_warnings(
            vec!["a".to_string(), "b".to_string()],
            vec!["b".to_string(), "c".to_string()],
        );
        assert_eq!(warnings, vec!["a", "b", "c"]);
    }
}
