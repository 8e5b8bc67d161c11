use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use crate::config::TtsConfig;
use crate::speech::{SpeechError, SpeechProvider};

pub struct ElevenLabsProvider {
    client: Client,
    config: TtsConfig,
}

impl ElevenLabsProvider {
    pub fn new(config: TtsConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/text-to-speech/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.voice_id
        )
    }

    fn request_body(&self, text: &str) -> serde_json::Value {
        json!({
            "text": text,
            "model_id": self.config.model_id,
            "voice_settings": {
                "stability": self.config.stability,
                "similarity_boost": self.config.similarity_boost,
                "style": self.config.style,
                "use_speaker_boost": self.config.use_speaker_boost,
            }
        })
    }
}

#[async_trait]
impl SpeechProvider for ElevenLabsProvider {
    fn name(&self) -> &str {
        "elevenlabs"
    }

    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SpeechError> {
        let response = self
            .client
            .post(self.endpoint())
            .header("Accept", "audio/mpeg")
            .header("Content-Type", "application/json")
            .header("xi-api-key", &self.config.api_key)
            .json(&self.request_body(text))
            .send()
            .await
            .map_err(|e| SpeechError::Network(e.to_string()))?;

        // Anything but 200 is a failure, including other 2xx codes.
        if response.status() != reqwest::StatusCode::OK {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SpeechError::Api { status, body });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SpeechError::Network(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}
