use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{error, info};

use crate::analysis::extract::parse_embedded;
use crate::analysis::grading::{convert_scores, overall_score};
use crate::analysis::prompts::{evaluation_prompt, transcript, EVALUATOR_SYSTEM};
use crate::analysis::AnalysisError;
use crate::config::CompletionProfile;
use crate::llm::{complete, LlmProvider};
use crate::store::ConversationTurn;

/// Persisted as `feedback_<timestamp>.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub participant_id: String,
    pub evaluation_date: String,
    #[serde(default)]
    pub evaluation_type: Option<String>,
    pub conversation_logs: Vec<ConversationTurn>,
    pub evaluation_result: Value,
}

/// Adds `scores`, `converted_scores` and `overall_score` to a parsed
/// evaluation. Grades are read from `grades`, or `scores` for older
/// outputs; every other field is preserved.
pub fn score_evaluation(value: Value) -> Result<Map<String, Value>, AnalysisError> {
    let mut evaluation = match value {
        Value::Object(map) => map,
        other => return Err(AnalysisError::Shape(format!("expected an object, got {}", other))),
    };

    let grades = evaluation
        .get("grades")
        .or_else(|| evaluation.get("scores"))
        .and_then(Value::as_object)
        .cloned()
        .ok_or_else(|| AnalysisError::Shape("missing grades".to_string()))?;

    let converted = convert_scores(&grades);
    let overall = overall_score(grades.values());

    evaluation
        .entry("grades")
        .or_insert_with(|| Value::Object(grades.clone()));
    evaluation.insert("scores".to_string(), Value::Object(grades));
    evaluation.insert("converted_scores".to_string(), Value::Object(converted));
    evaluation.insert("overall_score".to_string(), Value::from(overall));
    Ok(evaluation)
}

/// Grades the patient's side of a transcript against the fixed rubric.
pub async fn evaluate(
    llm: &dyn LlmProvider,
    profile: &CompletionProfile,
    turns: &[ConversationTurn],
) -> Result<Map<String, Value>, AnalysisError> {
    let prompt = evaluation_prompt(&transcript(turns));
    let raw = complete(llm, profile, EVALUATOR_SYSTEM, &prompt).await?;

    let parsed: Value = parse_embedded(&raw).map_err(|e| {
        error!("Evaluation JSON parse error: {}", e.raw);
        e
    })?;
    let evaluation = score_evaluation(parsed)?;
    info!(
        "Evaluation scored {} over {} turns",
        evaluation["overall_score"],
        turns.len()
    );
    Ok(evaluation)
}
