use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{error, warn};

use crate::analysis::extract::parse_embedded;
use crate::analysis::prompts::{quest_prompt, QUEST_SYSTEM};
use crate::config::CompletionProfile;
use crate::llm::{complete, LlmError, LlmProvider};

/// A conversational sub-goal tracked by the frontend. Fields other than
/// `id` and `keywords` are passed to the model untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Quest {
    pub id: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
struct ModelVerdict {
    #[serde(default)]
    completed_quests: Vec<String>,
}

/// Outcome of a quest check. `fallback` is set when the keyword heuristic
/// produced the result instead of the model.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct QuestAnalysis {
    pub completed_quests: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_result: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub fallback: bool,
}

/// One line of `quest_analysis_<date>.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestAnalysisEntry {
    pub timestamp: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub user_message: String,
    pub bot_response: String,
    pub active_quests: Vec<Quest>,
    pub analysis_result: String,
    pub completed_quests: Vec<String>,
}

/// Marks a quest complete when any of its keywords occurs, ignoring case,
/// in the user message or the bot response.
pub fn keyword_fallback(quests: &[Quest], user_message: &str, bot_response: &str) -> Vec<String> {
    let conversation = format!("{} {}", user_message, bot_response).to_lowercase();
    quests
        .iter()
        .filter(|quest| {
            quest
                .keywords
                .iter()
                .any(|keyword| conversation.contains(&keyword.to_lowercase()))
        })
        .map(|quest| quest.id.clone())
        .collect()
}

/// Asks the model which quests the latest exchange completed, dropping to
/// the keyword heuristic when its answer does not parse.
pub async fn analyze(
    llm: &dyn LlmProvider,
    profile: &CompletionProfile,
    quests: &[Quest],
    user_message: &str,
    bot_response: &str,
) -> Result<QuestAnalysis, LlmError> {
    if quests.is_empty() {
        return Ok(QuestAnalysis {
            completed_quests: Vec::new(),
            analysis_result: None,
            fallback: false,
        });
    }

    let prompt = quest_prompt(user_message, bot_response, quests);
    let raw = complete(llm, profile, QUEST_SYSTEM, &prompt).await?;
    let raw = raw.trim().to_string();

    match parse_embedded::<ModelVerdict>(&raw) {
        Ok(verdict) => Ok(QuestAnalysis {
            completed_quests: verdict.completed_quests,
            analysis_result: Some(raw),
            fallback: false,
        }),
        Err(e) => {
            error!("Quest analysis JSON parse error: {}", e.source);
            error!("Raw response: {}", e.raw);
            warn!("Falling back to keyword matching for {} quests", quests.len());
            Ok(QuestAnalysis {
                completed_quests: keyword_fallback(quests, user_message, bot_response),
                analysis_result: None,
                fallback: true,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quest(id: &str, keywords: &[&str]) -> Quest {
        Quest {
            id: id.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            extra: Map::new(),
        }
    }

    #[test]
    fn keyword_present_completes_quest() {
        let quests = vec![quest("headache", &["두통"])];
        assert_eq!(
            keyword_fallback(&quests, "어제부터 두통이 있어요", "그래"),
            vec!["headache".to_string()]
        );
    }

    #[test]
    fn keyword_absent_excludes_quest() {
        let quests = vec![quest("headache", &["두통"])];
        assert!(keyword_fallback(&quests, "배가 아파요", "흠").is_empty());
    }

    #[test]
    fn matching_ignores_case_and_checks_bot_side() {
        let quests = vec![quest("med", &["Tylenol"]), quest("none", &[])];
        assert_eq!(
            keyword_fallback(&quests, "약은요", "TYLENOL 드세요"),
            vec!["med".to_string()]
        );
    }

    #[test]
    fn unknown_quest_fields_round_trip() {
        let quest: Quest = serde_json::from_str(
            r#"{"id": "symptom", "title": "증상 설명", "keywords": ["위치"]}"#,
        )
        .unwrap();
        assert_eq!(quest.extra["title"], "증상 설명");
        let back = serde_json::to_value(&quest).unwrap();
        assert_eq!(back["title"], "증상 설명");
    }
}
