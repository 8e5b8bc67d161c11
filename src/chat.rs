use tracing::{error, info};

use crate::config::AppConfig;
use crate::llm::{models::ChatOptions, LlmError, LlmProvider};
use crate::session::SessionStore;
use crate::store::{clock, ConversationTurn, LogStore, DEFAULT_PAGE_TYPE, UNKNOWN_PARTICIPANT};

/// One doctor-persona exchange: update the participant's buffer, ask the
/// model, log the turn for today and return the reply.
///
/// A failed log write is reported but does not fail the exchange.
pub async fn chat_turn(
    config: &AppConfig,
    llm: &dyn LlmProvider,
    store: &LogStore,
    sessions: &SessionStore,
    message: &str,
    participant_id: Option<&str>,
    page_type: Option<&str>,
) -> Result<String, LlmError> {
    let key = SessionStore::key(participant_id);
    let history = sessions.push_user(key, message);

    let options = ChatOptions::from(&config.llm.chat).with_system(config.chat.system_prompt.clone());
    let reply = llm.chat(&history, options).await?.content;
    info!("Bot reply for {}: {}", key, reply);

    let page_type = page_type.unwrap_or(DEFAULT_PAGE_TYPE);
    let turn = ConversationTurn::new(
        message,
        reply.clone(),
        participant_id.map(str::to_string),
        Some(page_type.to_string()),
    );
    if let Err(e) = store.append_log(
        participant_id.unwrap_or(UNKNOWN_PARTICIPANT),
        page_type,
        &clock::today(),
        &turn,
    ) {
        error!("Failed to save conversation log: {}", e);
    }

    sessions.push_assistant(key, &reply);
    Ok(reply)
}
