pub mod models;
pub mod openai;

use openai::OpenAiProvider;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{AppConfig, CompletionProfile};
use models::{ChatOptions, ChatResponse, Message};

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Network Error: {0}")]
    Network(String),
    #[error("API Error: {0}")]
    Api(String),
    #[error("Invalid Request")]
    InvalidRequest,
    #[error("Rate Limited")]
    RateLimited,
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Returns the text of the single top completion.
    async fn chat(&self, messages: &[Message], options: ChatOptions) -> Result<ChatResponse, LlmError>;
}

pub struct ProviderFactory;

impl ProviderFactory {
    pub fn create_default(config: &AppConfig) -> Arc<dyn LlmProvider> {
        Arc::new(OpenAiProvider::new(
            config.llm.api_key.clone(),
            config.llm.api_base.clone(),
            config.llm.chat.model.clone(),
        ))
    }
}

/// Sends a one-shot system + user prompt pair and returns the reply text.
pub async fn complete(
    llm: &dyn LlmProvider,
    profile: &CompletionProfile,
    system: &str,
    prompt: &str,
) -> Result<String, LlmError> {
    let options = ChatOptions::from(profile).with_system(system);
    let response = llm.chat(&[Message::user(prompt)], options).await?;
    Ok(response.content)
}
