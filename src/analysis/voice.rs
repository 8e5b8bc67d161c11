use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::{error, warn};

use crate::analysis::extract::parse_embedded;
use crate::analysis::prompts::{voice_prompt, VOICE_SYSTEM};
use crate::analysis::AnalysisError;
use crate::config::CompletionProfile;
use crate::llm::{complete, LlmProvider};

/// Korean hesitation words counted by the local heuristic.
pub const FILLER_WORDS: [&str; 8] = ["음", "어", "아", "그", "저", "저기", "뭐", "그러니까"];

const REPEAT_THRESHOLD: usize = 3;

/// Language-pattern summary of a participant's spoken utterances.
///
/// Every metric is required when parsing a model reply; an object missing
/// any of them is treated as unusable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct VoiceAnalysis {
    pub filler_words: Map<String, Value>,
    pub repeated_expressions: Vec<String>,
    pub average_sentence_length: f64,
    pub clarity_score: f64,
    pub strengths: Vec<String>,
    pub suggestions: Vec<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub fallback: bool,
}

fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| !w.is_empty())
}

fn sentences(utterances: &[String]) -> Vec<&str> {
    utterances
        .iter()
        .flat_map(|u| u.split(['.', '?', '!', '\n']))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Counts fillers and repeats without the model. Used when the model's
/// answer cannot be parsed.
pub fn heuristic_analysis(utterances: &[String]) -> VoiceAnalysis {
    let mut fillers: BTreeMap<&str, u64> = BTreeMap::new();
    let mut repeats: BTreeMap<&str, usize> = BTreeMap::new();
    let mut word_count = 0u64;

    for utterance in utterances {
        for word in words(utterance) {
            word_count += 1;
            if FILLER_WORDS.contains(&word) {
                *fillers.entry(word).or_default() += 1;
            } else if word.chars().count() >= 2 {
                *repeats.entry(word).or_default() += 1;
            }
        }
    }

    let sentences = sentences(utterances);
    let average_sentence_length = if sentences.is_empty() {
        0.0
    } else {
        let chars: usize = sentences.iter().map(|s| s.chars().count()).sum();
        ((chars as f64 / sentences.len() as f64) * 10.0).round() / 10.0
    };

    let filler_total: u64 = fillers.values().sum();
    let clarity_score = if word_count == 0 {
        0.0
    } else {
        (100.0 * (1.0 - filler_total as f64 / word_count as f64)).round().clamp(0.0, 100.0)
    };

    let repeated_expressions: Vec<String> = repeats
        .into_iter()
        .filter(|(_, n)| *n >= REPEAT_THRESHOLD)
        .map(|(w, _)| w.to_string())
        .collect();

    let mut suggestions = Vec::new();
    if filler_total > 0 {
        suggestions.push("군말(음, 어 등)을 줄이고 잠시 멈춘 뒤 말해보세요.".to_string());
    }
    if !repeated_expressions.is_empty() {
        suggestions.push("같은 표현을 반복하기보다 다양한 표현으로 설명해보세요.".to_string());
    }
    if average_sentence_length > 40.0 {
        suggestions.push("한 문장에 한 가지 정보만 담아 짧게 말해보세요.".to_string());
    }

    VoiceAnalysis {
        filler_words: fillers
            .into_iter()
            .map(|(w, n)| (w.to_string(), Value::from(n)))
            .collect(),
        repeated_expressions,
        average_sentence_length,
        clarity_score,
        strengths: Vec::new(),
        suggestions,
        fallback: true,
    }
}

pub async fn analyze(
    llm: &dyn LlmProvider,
    profile: &CompletionProfile,
    utterances: &[String],
) -> Result<VoiceAnalysis, AnalysisError> {
    let raw = complete(llm, profile, VOICE_SYSTEM, &voice_prompt(utterances)).await?;

    match parse_embedded::<VoiceAnalysis>(&raw) {
        Ok(mut analysis) => {
            analysis.fallback = false;
            Ok(analysis)
        }
        Err(e) => {
            error!("Voice analysis JSON parse error: {}", e.raw);
            warn!("Using heuristic voice analysis");
            Ok(heuristic_analysis(utterances))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::models::{ChatOptions, ChatResponse, Message};
    use crate::config::AppConfig;
    use crate::llm::LlmError;
    use async_trait::async_trait;

    struct CannedLlm(&'static str);

    #[async_trait]
    impl LlmProvider for CannedLlm {
        fn name(&self) -> &str {
            "canned"
        }

        async fn chat(&self, _messages: &[Message], _options: ChatOptions) -> Result<ChatResponse, LlmError> {
            Ok(ChatResponse {
                content: self.0.to_string(),
                model: "canned".to_string(),
                usage: None,
            })
        }
    }

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn counts_fillers_and_repeats() {
        let analysis = heuristic_analysis(&lines(&[
            "음 머리가 아파요. 음 어제부터 아파요.",
            "어 그러니까 아파요!",
        ]));

        assert_eq!(analysis.filler_words["음"], 2);
        assert_eq!(analysis.filler_words["어"], 1);
        assert_eq!(analysis.filler_words["그러니까"], 1);
        assert_eq!(analysis.repeated_expressions, vec!["아파요".to_string()]);
        assert!(analysis.fallback);
        assert!(!analysis.suggestions.is_empty());
    }

    #[test]
    fn clarity_drops_with_fillers() {
        let clean = heuristic_analysis(&lines(&["어제부터 머리 뒤쪽이 아파요"]));
        let noisy = heuristic_analysis(&lines(&["음 어 음 머리 아파요"]));
        assert_eq!(clean.clarity_score, 100.0);
        assert_eq!(noisy.clarity_score, 40.0);
    }

    #[test]
    fn empty_input_is_all_zero() {
        let analysis = heuristic_analysis(&[]);
        assert_eq!(analysis.average_sentence_length, 0.0);
        assert_eq!(analysis.clarity_score, 0.0);
        assert!(analysis.filler_words.is_empty());
    }

    #[tokio::test]
    async fn complete_model_reply_is_used() {
        let llm = CannedLlm(
            r#"```json
{"filler_words": {"음": 1}, "repeated_expressions": [], "average_sentence_length": 12.5,
 "clarity_score": 88, "strengths": ["증상을 구체적으로 설명함"], "suggestions": []}
```"#,
        );
        let analysis = analyze(&llm, &AppConfig::default().llm.voice, &lines(&["음 머리가 아파요"]))
            .await
            .unwrap();

        assert!(!analysis.fallback);
        assert_eq!(analysis.clarity_score, 88.0);
        assert_eq!(analysis.strengths, vec!["증상을 구체적으로 설명함".to_string()]);
    }

    #[tokio::test]
    async fn incomplete_model_reply_uses_heuristic() {
        for reply in ["{}", r#"{"error": "분석 불가"}"#, "분석할 수 없습니다"] {
            let analysis = analyze(&CannedLlm(reply), &AppConfig::default().llm.voice, &lines(&["음 어 음 머리 아파요"]))
                .await
                .unwrap();

            assert!(analysis.fallback, "reply {:?} should fall back", reply);
            assert_eq!(analysis.filler_words["음"], 2);
            assert_eq!(analysis.clarity_score, 40.0);
        }
    }
}
