use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::debug;

use crate::llm::{models::{ChatOptions, ChatResponse, Message, Usage}, LlmError, LlmProvider};

/// Chat-completions client for OpenAI-compatible endpoints.
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    default_model: String,
}

impl OpenAiProvider {
    pub fn new(api_key: String, base_url: String, default_model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            default_model,
        }
    }

    fn request_body(&self, messages: &[Message], options: &ChatOptions) -> serde_json::Value {
        let model = options.model.as_deref().unwrap_or(&self.default_model);

        let mut final_messages: Vec<Message> = Vec::with_capacity(messages.len() + 1);
        if let Some(system) = &options.system_prompt {
            final_messages.push(Message::system(system.clone()));
        }
        final_messages.extend_from_slice(messages);

        json!({
            "model": model,
            "messages": final_messages,
            "temperature": options.temperature.unwrap_or(0.7),
            "max_tokens": options.max_tokens.unwrap_or(1000),
        })
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn chat(&self, messages: &[Message], options: ChatOptions) -> Result<ChatResponse, LlmError> {
        let model = options
            .model
            .clone()
            .unwrap_or_else(|| self.default_model.clone());
        let body = self.request_body(messages, &options);
        debug!("Sending {} messages to {}", messages.len(), model);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                return Err(LlmError::RateLimited);
            }
            return Err(LlmError::Api(format!("OpenAI Error {}: {}", status, text)));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        let content = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or(LlmError::InvalidRequest)?
            .to_string();

        let usage = json.get("usage").map(|u| Usage {
            input_tokens: u["prompt_tokens"].as_u64().unwrap_or(0) as u32,
            output_tokens: u["completion_tokens"].as_u64().unwrap_or(0) as u32,
        });

        Ok(ChatResponse {
            content,
            model,
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_leads_the_message_list() {
        let provider = OpenAiProvider::new("k".into(), "https://example.test/v1/".into(), "gpt-x".into());
        let options = ChatOptions {
            temperature: Some(0.1),
            max_tokens: Some(42),
            ..Default::default()
        }
        .with_system("persona");

        let body = provider.request_body(&[Message::user("hi")], &options);

        assert_eq!(body["model"], "gpt-x");
        assert_eq!(body["max_tokens"], 42);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "persona");
        assert_eq!(body["messages"][1]["content"], "hi");
        assert_eq!(provider.base_url, "https://example.test/v1");
    }
}
