use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
        }
    }
}

/// Model parameters for one kind of completion request.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CompletionProfile {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl CompletionProfile {
    fn new(model: &str, max_tokens: u32, temperature: f32) -> Self {
        Self {
            model: model.to_string(),
            max_tokens,
            temperature,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_openai_base")]
    pub api_base: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_chat_profile")]
    pub chat: CompletionProfile,
    #[serde(default = "default_evaluation_profile")]
    pub evaluation: CompletionProfile,
    #[serde(default = "default_cheatsheet_profile")]
    pub cheatsheet: CompletionProfile,
    #[serde(default = "default_quest_profile")]
    pub quest: CompletionProfile,
    #[serde(default = "default_voice_profile")]
    pub voice: CompletionProfile,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: default_openai_base(),
            api_key: String::new(),
            chat: default_chat_profile(),
            evaluation: default_evaluation_profile(),
            cheatsheet: default_cheatsheet_profile(),
            quest: default_quest_profile(),
            voice: default_voice_profile(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TtsConfig {
    #[serde(default = "default_elevenlabs_base")]
    pub api_base: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_voice_id")]
    pub voice_id: String,
    #[serde(default = "default_tts_model")]
    pub model_id: String,
    #[serde(default = "default_half")]
    pub stability: f32,
    #[serde(default = "default_half")]
    pub similarity_boost: f32,
    #[serde(default)]
    pub style: f32,
    #[serde(default = "default_true")]
    pub use_speaker_boost: bool,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            api_base: default_elevenlabs_base(),
            api_key: String::new(),
            voice_id: default_voice_id(),
            model_id: default_tts_model(),
            stability: default_half(),
            similarity_boost: default_half(),
            style: 0.0,
            use_speaker_boost: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    #[serde(default = "default_max_history")]
    pub max_history_messages: usize,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_history_messages: default_max_history(),
            system_prompt: default_system_prompt(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub tts: TtsConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

impl AppConfig {
    pub fn load(path: &str) -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();

        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("MEDTALK").separator("__"))
            .build()?;

        let mut app_config: AppConfig = settings.try_deserialize()?;

        // Expand environment variables if present like ${OPENAI_API_KEY}
        app_config.server.host = expand_env(&app_config.server.host);
        app_config.storage.log_dir = expand_env(&app_config.storage.log_dir);
        app_config.llm.api_key = expand_env(&app_config.llm.api_key);
        app_config.tts.api_key = expand_env(&app_config.tts.api_key);

        Ok(app_config)
    }

    /// Both upstream credentials are required before the server may start.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.llm.api_key.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "llm.api_key is empty (set OPENAI_API_KEY)".to_string(),
            ));
        }
        if self.tts.api_key.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "tts.api_key is empty (set ELEVENLABS_API_KEY)".to_string(),
            ));
        }
        Ok(())
    }
}

fn expand_env(val: &str) -> String {
    if val.starts_with("${") && val.ends_with('}') {
        let var_name = &val[2..val.len() - 1];
        std::env::var(var_name).unwrap_or_else(|_| "".to_string())
    } else {
        val.to_string()
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_openai_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_elevenlabs_base() -> String {
    "https://api.elevenlabs.io/v1".to_string()
}

fn default_voice_id() -> String {
    "BNr4zvrC1bGIdIstzjFQ".to_string()
}

fn default_tts_model() -> String {
    "eleven_multilingual_v2".to_string()
}

fn default_half() -> f32 {
    0.5
}

fn default_true() -> bool {
    true
}

fn default_max_history() -> usize {
    10
}

fn default_chat_profile() -> CompletionProfile {
    CompletionProfile::new("gpt-3.5-turbo", 300, 0.8)
}

fn default_evaluation_profile() -> CompletionProfile {
    CompletionProfile::new("gpt-4o", 1000, 0.3)
}

fn default_cheatsheet_profile() -> CompletionProfile {
    CompletionProfile::new("gpt-3.5-turbo", 2000, 0.3)
}

fn default_quest_profile() -> CompletionProfile {
    CompletionProfile::new("gpt-4", 500, 0.1)
}

fn default_voice_profile() -> CompletionProfile {
    CompletionProfile::new("gpt-4o", 800, 0.2)
}

fn default_system_prompt() -> String {
    crate::analysis::prompts::DOCTOR_PERSONA.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_braced_env_var() {
        std::env::set_var("MEDTALK_TEST_EXPAND", "secret");
        assert_eq!(expand_env("${MEDTALK_TEST_EXPAND}"), "secret");
        assert_eq!(expand_env("plain"), "plain");
        assert_eq!(expand_env("${MEDTALK_TEST_MISSING_VAR}"), "");
    }

    #[test]
    fn defaults_match_original_service() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.storage.log_dir, "logs");
        assert_eq!(config.llm.chat.model, "gpt-3.5-turbo");
        assert_eq!(config.llm.evaluation.max_tokens, 1000);
        assert_eq!(config.chat.max_history_messages, 10);
        assert!(config.validate().is_err());
    }
}
