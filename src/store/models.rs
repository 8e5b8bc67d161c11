use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::clock;

pub const DEFAULT_PAGE_TYPE: &str = "chat";
pub const UNKNOWN_PARTICIPANT: &str = "unknown";
pub const USER_INFO_FILE: &str = "user_info.json";
pub const CONVERSATION_PREFIX: &str = "medical_conversation_";

/// One user/bot exchange as written to the per-day conversation log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationTurn {
    #[serde(default)]
    pub timestamp: String,
    pub user_message: String,
    pub bot_response: String,
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub participant_id: Option<String>,
    #[serde(default)]
    pub page_type: Option<String>,
}

impl ConversationTurn {
    pub fn new(
        user_message: impl Into<String>,
        bot_response: impl Into<String>,
        participant_id: Option<String>,
        page_type: Option<String>,
    ) -> Self {
        Self {
            timestamp: clock::iso_now(),
            user_message: user_message.into(),
            bot_response: bot_response.into(),
            session_id: clock::session_stamp(),
            participant_id,
            page_type,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserInfo {
    pub participant_id: String,
    pub symptoms: Value,
    pub consent: Value,
    #[serde(default)]
    pub login_time: Value,
    pub created_at: String,
}

impl UserInfo {
    pub fn symptoms_text(&self) -> String {
        match &self.symptoms {
            Value::String(s) => s.clone(),
            Value::Null => "정보 없음".to_string(),
            Value::Array(items) => items
                .iter()
                .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
                .collect::<Vec<_>>()
                .join(", "),
            other => other.to_string(),
        }
    }
}
