use serde::Deserialize;
use serde_json::Value;

use crate::analysis::quest::Quest;
use crate::store::ConversationTurn;

/// Blank identifiers are treated as absent.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// JSON truthiness: null, false, 0, "", [] and {} are all missing.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    pub participant_id: Option<String>,
    pub page_type: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ClearRequest {
    pub participant_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SaveUserDataRequest {
    #[serde(rename = "participantId")]
    pub participant_id: Option<String>,
    #[serde(default)]
    pub symptoms: Value,
    #[serde(default)]
    pub consent: Value,
    #[serde(rename = "loginTime", default)]
    pub login_time: Value,
}

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    pub date: Option<String>,
    pub participant_id: Option<String>,
    pub page_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    #[serde(default)]
    pub logs: Vec<ConversationTurn>,
    pub participant_id: Option<String>,
    #[serde(default = "default_evaluation_type")]
    pub evaluation_type: String,
}

fn default_evaluation_type() -> String {
    "conversation_based".to_string()
}

#[derive(Debug, Deserialize)]
pub struct FeedbackQuery {
    pub participant_id: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CheatsheetRequest {
    pub participant_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeQuestRequest {
    #[serde(default)]
    pub user_message: String,
    #[serde(default)]
    pub bot_response: String,
    #[serde(default)]
    pub active_quests: Vec<Quest>,
    pub participant_id: Option<String>,
}

/// A spoken utterance, either bare text or a logged message object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum VoiceMessage {
    Text(String),
    Entry {
        #[serde(alias = "user_message", alias = "text")]
        content: String,
    },
}

impl VoiceMessage {
    pub fn into_text(self) -> String {
        match self {
            VoiceMessage::Text(text) => text,
            VoiceMessage::Entry { content } => content,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeVoiceRequest {
    #[serde(default)]
    pub messages: Vec<VoiceMessage>,
    pub participant_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TtsRequest {
    #[serde(default)]
    pub text: String,
    pub participant_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DebugQuery {
    pub participant_id: Option<String>,
    pub filename: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn truthiness_matches_form_validation() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!([])));
        assert!(!is_truthy(&json!(0)));
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(["두통"])));
        assert!(is_truthy(&json!("두통")));
    }

    #[test]
    fn voice_messages_accept_strings_and_objects() {
        let req: AnalyzeVoiceRequest = serde_json::from_value(json!({
            "messages": ["음 머리가 아파요", {"content": "어제부터요"}, {"user_message": "네"}]
        }))
        .unwrap();
        let texts: Vec<String> = req.messages.into_iter().map(VoiceMessage::into_text).collect();
        assert_eq!(texts, vec!["음 머리가 아파요", "어제부터요", "네"]);
    }
}
