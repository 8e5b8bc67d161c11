pub mod elevenlabs;

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::config::AppConfig;
use crate::store::{LogStore, StoreError};
use elevenlabs::ElevenLabsProvider;

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("Network Error: {0}")]
    Network(String),
    #[error("Synthesis failed with status {status}: {body}")]
    Api { status: u16, body: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Text-to-speech backend returning encoded (mp3) audio.
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SpeechError>;
}

pub fn create_default(config: &AppConfig) -> Arc<dyn SpeechProvider> {
    Arc::new(ElevenLabsProvider::new(config.tts.clone()))
}

/// Synthesizes `text` and writes the audio under the participant directory
/// (or the log root). Returns the written file path.
pub async fn synthesize_to_store(
    provider: &dyn SpeechProvider,
    store: &LogStore,
    participant_id: Option<&str>,
    text: &str,
) -> Result<PathBuf, SpeechError> {
    let audio = provider.synthesize(text).await?;
    let path = store.write_audio(participant_id, &audio)?;
    info!("Audio file written: {}", path.display());
    Ok(path)
}
