//! Fixed prompt templates. The JSON keys named inside them come back from
//! the model verbatim and are used downstream as-is.

use serde::Serialize;
use serde_json::Value;

use crate::store::ConversationTurn;

pub const DOCTOR_PERSONA: &str = "당신은 50대 후반의 경험 많은 내과 의사입니다.

성격 특징:
- 다소 까칠하고 직설적인 성격
- 환자와 친근하면서도 전문적인 태도
- 불필요한 공손함보다는 솔직한 소통 선호
- \"그래\", \"음\", \"흠\" 같은 짧은 반응을 자주 사용
- 나이 많은 의사다운 경험과 지혜를 바탕으로 한 진료

진료 스타일:
- 핵심적인 진료 질문과 답변
- 불필요한 자세한 설명보다는 핵심만 전달
- 때로는 짧은 한마디로 끝내기도 함
- 의료 전문 용어를 적절히 사용
- 진료 상황에 맞는 적절한 톤과 어조

진료 시나리오:
- 증상 문진, 진찰, 진단, 처방 등 의료 과정 진행
- 환자의 증상을 정확히 파악하고 적절한 진료 제공
- 필요시 추가 검사나 상담을 권유
- 한국어로 진료하되 자연스럽게";

pub const CHAT_APOLOGY: &str = "죄송합니다. 일시적인 오류가 발생했습니다. 잠시 후 다시 시도해주세요.";

pub const EVALUATOR_SYSTEM: &str =
    "당신은 의료 진료 대화 평가 전문가입니다. 환자의 진료 대화 능력을 객관적이고 정확하게 평가해주세요.";

pub const CHEATSHEET_SYSTEM: &str = "당신은 의료 진료 치트시트 생성 전문가입니다. 실제 진료에서 환자가 사용할 수 있는 실용적이고 자연스러운 치트시트를 생성해주세요.";

pub const QUEST_SYSTEM: &str =
    "당신은 의료 진료 대화 분석 전문가입니다. 정확하고 객관적으로 퀘스트 완료 여부를 판단해주세요.";

pub const VOICE_SYSTEM: &str = "당신은 환자의 말하기 습관을 분석하는 의사소통 코치입니다. 환자의 발화에서 언어 패턴을 객관적으로 분석해주세요.";

/// Rubric criteria in prompt order.
pub const EVALUATION_CRITERIA: [&str; 10] = [
    "symptom_location",
    "symptom_timing",
    "symptom_severity",
    "current_medication",
    "allergy_info",
    "diagnosis_info",
    "prescription_info",
    "side_effects",
    "followup_plan",
    "emergency_plan",
];

/// `환자:`/`의사:` transcript, one blank line between exchanges.
pub fn transcript(turns: &[ConversationTurn]) -> String {
    let mut text = String::new();
    for turn in turns {
        text.push_str(&format!("환자: {}\n", turn.user_message));
        text.push_str(&format!("의사: {}\n\n", turn.bot_response));
    }
    text
}

fn pretty<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

pub fn evaluation_prompt(conversation_text: &str) -> String {
    format!(
        r#"<Instruction> 너는 환자의 대화 내용 평가 챗봇이야. Conversation Text 중 환자가 한 말을 Evaluation Criteria를 기준으로 Evaluation Score를 매겨줘.

<Conversation Text>
{conversation_text}
</Conversation Text>

<Evaluation Criteria>
1. 환자 입장에서 꼭 말해야 하는 것
   - 어디가 아픈지 구체적인 위치 = "symptom_location"
   - 언제부터 아픈지 시작 시기 = "symptom_timing"
   - 증상이 얼마나 심한지 강도 = "symptom_severity"
   - 현재 복용 중인 약물 = "current_medication"
   - 알레르기 여부 = "allergy_info"

2. 진료과정 중에 꼭 들어야 하는 것
   - 의사의 진단명과 진단 근거 = "diagnosis_info"
   - 처방약의 이름과 복용 방법 = "prescription_info"
   - 약의 부작용과 주의사항 = "side_effects"
   - 다음 진료 계획과 재방문 시기 = "followup_plan"
   - 증상 악화 시 언제 다시 와야 하는지 = "emergency_plan"

추가 중요한 평가 원칙:
1. 구체적인 대화로그를 기반으로 평가하세요
2. 해당 정보가 대화에서 실제로 언급되지 않으면 무조건 '하'로 평가하세요
3. 각 항목의 모두 이유를 작성하세요. 이유는 반드시 대화 내용을 인용하여 구체적으로 작성하세요
4. improvement_tips는 '하' 등급을 받은 항목에 대해서만 환자가 해야하는 역할을 생성하세요

</Evaluation Criteria>

<Evaluation Score>
- 상: 가이드라인을 완벽하게 준수, 구체적이고 상세한 정보 제공
- 중: 가이드라인을 대부분 준수, 대부분의 정보를 적절히 제공
- 하: 가이드라인을 거의 준수하지 않음, 정보가 부족하거나 불구체적
</Evaluation Score>

<Example>
{{
    "grades": {{
        "symptom_location": "상",
        "symptom_timing": "중",
        "symptom_severity": "하",
        "current_medication": "상",
        "allergy_info": "중",
        "diagnosis_info": "상",
        "prescription_info": "중",
        "side_effects": "하",
        "followup_plan": "중",
        "emergency_plan": "중"
    }},
    "score_reasons": {{
        "symptom_location": "환자가 '머리 뒤쪽이 아파요'라고 구체적인 위치를 언급했습니다.",
        "symptom_timing": "환자가 '어제부터'라고 시작 시기를 언급했지만 더 구체적인 시간이 필요합니다.",
        "symptom_severity": "증상의 강도에 대한 언급이 대화에서 확인되지 않습니다.",
        "current_medication": "환자가 현재 복용 중인 약물을 구체적으로 언급했습니다.",
        "allergy_info": "알레르기 정보가 언급되었습니다.",
        "diagnosis_info": "의사가 진단명과 근거를 설명했습니다.",
        "prescription_info": "처방약 정보가 부분적으로 언급되었습니다.",
        "side_effects": "약의 부작용에 대한 언급이 대화에서 확인되지 않습니다.",
        "followup_plan": "다음 진료 계획이 언급되었습니다.",
        "emergency_plan": "증상 악화 시 대응 방안이 언급되었습니다."
    }},
    "improvement_tips": [
        "증상의 강도를 구체적으로 설명해보세요 (예: 10점 만점에 7점 정도).",
        "약의 부작용과 주의사항을 더 자세히 듣고 기록해보세요.",
        "알레르기 정보를 더 구체적으로 제공해보세요."
    ]
}}
</Example>

"#
    )
}

pub fn cheatsheet_prompt(
    participant_id: &str,
    symptoms: &str,
    conversation_text: &str,
    evaluation: &Value,
    generated_date: &str,
) -> String {
    let evaluation = pretty(evaluation);
    format!(
        r#"다음은 의료 진료 연습 대화와 피드백 데이터입니다.
실제 진료 중에 바로 보고 말할 수 있는 스크립트를 생성해주세요.

사용자 정보:
- 참여자 ID: {participant_id}
- 초기 증상: {symptoms}

대화 내용:
{conversation_text}

피드백 평가:
{evaluation}

다음 JSON 형식으로 응답해주세요:
{{
    "cheatsheet": {{
        "title": "진료 스크립트",
        "patient_info": {{
            "participant_id": "{participant_id}",
            "initial_symptoms": "{symptoms}",
            "generated_date": "{generated_date}"
        }},
        "script": [
            {{
                "title": "증상 설명",
                "content": "의사에게 처음 말할 증상 설명 스크립트",
                "example": "어제부터 머리 뒤쪽이 지속적으로 아파요"
            }},
            {{
                "title": "과거 병력",
                "content": "의사가 물어볼 과거 병력에 대한 답변 스크립트",
                "example": "알레르기는 없고, 만성질환도 없습니다"
            }}
        ],
        "questions": [
            {{
                "question": "증상이 언제부터 시작되었나요?",
                "answer": "구체적인 답변 예시"
            }},
            {{
                "question": "어떤 상황에서 증상이 심해지나요?",
                "answer": "상황별 답변 예시"
            }},
            {{
                "question": "복용 중인 약이 있나요?",
                "answer": "약물 정보 답변 예시"
            }}
        ],
        "listening": [
            "진찰 결과",
            "진단명과 근거",
            "처방약 정보",
            "복용법과 주의사항"
        ],
        "my_questions": [
            "이 약의 부작용은 무엇인가요?",
            "언제까지 복용해야 하나요?",
            "증상이 악화되면 어떻게 해야 하나요?",
            "다음 진료는 언제 받아야 하나요?"
        ],
        "precautions": [
            "의사의 설명이 이해되지 않으면 반드시 다시 물어보세요",
            "약을 복용하기 전에 부작용을 꼭 확인하세요",
            "증상이 예상과 다르게 변화하면 즉시 병원에 연락하세요",
            "다음 진료 일정을 정확히 확인하고 기록하세요"
        ]
    }}
}}

스크립트 생성 시 주의사항:
- 실제 진료 중에 바로 보고 말할 수 있는 간단하고 명확한 표현 사용
- 피드백에서 지적된 개선점들을 반영
- 구체적이고 실용적인 정보 포함
- 각 섹션별로 구분하여 쉽게 찾을 수 있도록 구성
- 실제 말할 수 있는 자연스러운 표현 사용"#
    )
}

pub fn quest_prompt<T: Serialize + ?Sized>(user_message: &str, bot_response: &str, active_quests: &T) -> String {
    let quests = pretty(active_quests);
    format!(
        r#"
당신은 의료 진료 대화에서 환자의 응답을 분석하여 특정 퀘스트의 완료 여부를 판단하는 전문가입니다.

현재 대화:
환자: {user_message}
의사: {bot_response}

진행 중인 퀘스트들:
{quests}

각 퀘스트에 대해 다음 기준으로 완료 여부를 판단해주세요:

1. **증상 설명 퀘스트**: 환자가 증상의 위치, 시작 시기, 강도, 지속 시간을 구체적으로 언급했는지
2. **약물 정보 퀘스트**: 환자가 현재 복용 중인 약물을 언급했는지
3. **과거 병력 퀘스트**: 환자가 과거 병력이나 알레르기를 언급했는지
4. **의사소통 명확성 퀘스트**: 환자가 명확하고 이해하기 쉽게 설명했는지
5. **질문하기 퀘스트**: 환자가 의사에게 적절한 질문을 했는지
6. **후속 조치 퀘스트**: 환자가 의사의 설명에 대한 확인이나 추가 질문을 했는지

완료된 퀘스트의 ID만 JSON 배열로 응답해주세요. 완료되지 않은 퀘스트는 포함하지 마세요.

응답 형식:
```json
{{
    "completed_quests": ["quest_id1", "quest_id2"]
}}
```

분석해주세요.
"#
    )
}

pub fn voice_prompt(utterances: &[String]) -> String {
    let numbered = utterances
        .iter()
        .enumerate()
        .map(|(i, u)| format!("{}. {}", i + 1, u))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        r#"다음은 진료 연습 중 환자가 음성으로 말한 발화 목록입니다.

<Utterances>
{numbered}
</Utterances>

다음 항목을 분석해주세요:
1. 자주 사용한 군말(예: "음", "어", "그", "저기")과 횟수 = "filler_words"
2. 반복해서 사용한 표현 = "repeated_expressions"
3. 문장당 평균 글자 수 = "average_sentence_length"
4. 전달의 명확성 (0-100) = "clarity_score"
5. 잘한 점 = "strengths"
6. 개선할 점 = "suggestions"

다음 JSON 형식으로만 응답해주세요:
```json
{{
    "filler_words": {{"음": 3, "어": 1}},
    "repeated_expressions": ["그러니까"],
    "average_sentence_length": 18.5,
    "clarity_score": 72,
    "strengths": ["증상의 위치를 분명하게 말했습니다."],
    "suggestions": ["군말을 줄이고 한 문장에 한 가지 정보만 전달해보세요."]
}}
```
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn transcript_labels_each_side() {
        let turns = vec![
            ConversationTurn::new("머리가 아파요", "언제부터요?", None, None),
            ConversationTurn::new("어제부터요", "흠.", None, None),
        ];
        assert_eq!(
            transcript(&turns),
            "환자: 머리가 아파요\n의사: 언제부터요?\n\n환자: 어제부터요\n의사: 흠.\n\n"
        );
    }

    #[test]
    fn evaluation_prompt_names_every_criterion() {
        let prompt = evaluation_prompt("환자: 안녕하세요\n");
        assert!(prompt.contains("<Conversation Text>\n환자: 안녕하세요\n\n</Conversation Text>"));
        for key in EVALUATION_CRITERIA {
            assert!(prompt.contains(&format!("= \"{}\"", key)), "missing {}", key);
        }
        assert!(prompt.contains("\"grades\": {"));
    }

    #[test]
    fn quest_prompt_embeds_quests_as_json() {
        let quests = json!([{"id": "medication", "keywords": ["약"]}]);
        let prompt = quest_prompt("약 먹어요", "그래", &quests);
        assert!(prompt.contains("환자: 약 먹어요"));
        assert!(prompt.contains("\"id\": \"medication\""));
        assert!(prompt.contains("\"completed_quests\""));
    }

    #[test]
    fn cheatsheet_prompt_fills_patient_info() {
        let prompt = cheatsheet_prompt("p01", "두통", "", &json!({}), "2025년 01월 02일");
        assert!(prompt.contains("\"participant_id\": \"p01\""));
        assert!(prompt.contains("\"initial_symptoms\": \"두통\""));
        assert!(prompt.contains("\"generated_date\": \"2025년 01월 02일\""));
    }
}
