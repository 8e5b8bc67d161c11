use chrono::Local;
use serde_json::{json, Value};
use tracing::error;

use crate::analysis::extract::parse_embedded;
use crate::analysis::prompts::{cheatsheet_prompt, transcript, CHEATSHEET_SYSTEM};
use crate::analysis::AnalysisError;
use crate::config::CompletionProfile;
use crate::llm::{complete, LlmProvider};
use crate::store::{ConversationTurn, UserInfo};

/// Everything the cheatsheet prompt is built from.
pub struct CheatsheetInputs<'a> {
    pub participant_id: &'a str,
    pub user_info: Option<&'a UserInfo>,
    pub conversation: &'a [ConversationTurn],
    pub feedback: Option<&'a Value>,
}

impl CheatsheetInputs<'_> {
    pub fn prompt(&self, generated_date: &str) -> String {
        let symptoms = self
            .user_info
            .map(UserInfo::symptoms_text)
            .unwrap_or_else(|| "정보 없음".to_string());
        let evaluation = self
            .feedback
            .and_then(|f| f.get("evaluation_result"))
            .cloned()
            .unwrap_or_else(|| json!({}));

        cheatsheet_prompt(
            self.participant_id,
            &symptoms,
            &transcript(self.conversation),
            &evaluation,
            generated_date,
        )
    }
}

/// Produces the cheatsheet object returned by the model, verbatim.
pub async fn generate(
    llm: &dyn LlmProvider,
    profile: &CompletionProfile,
    inputs: &CheatsheetInputs<'_>,
) -> Result<Value, AnalysisError> {
    let generated_date = Local::now().format("%Y년 %m월 %d일").to_string();
    let raw = complete(llm, profile, CHEATSHEET_SYSTEM, &inputs.prompt(&generated_date)).await?;

    parse_embedded(&raw).map_err(|e| {
        error!("Cheatsheet JSON parse error: {}", e.raw);
        AnalysisError::from(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_uses_latest_feedback_result() {
        let feedback = json!({"evaluation_result": {"overall_score": 63}});
        let turns = vec![ConversationTurn::new("배가 아파요", "어디가요?", None, None)];
        let inputs = CheatsheetInputs {
            participant_id: "p9",
            user_info: None,
            conversation: &turns,
            feedback: Some(&feedback),
        };

        let prompt = inputs.prompt("2025년 03월 04일");
        assert!(prompt.contains("- 초기 증상: 정보 없음"));
        assert!(prompt.contains("환자: 배가 아파요"));
        assert!(prompt.contains("\"overall_score\": 63"));
    }
}
