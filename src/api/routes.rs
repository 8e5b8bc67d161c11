use actix_web::{get, http::StatusCode, post, web, HttpResponse, Result as WebResult};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::analysis::{cheatsheet, evaluation, quest, voice, AnalysisError};
use crate::api::error::{json_error_handler, ApiError};
use crate::api::models::{
    is_truthy, non_empty, AnalyzeQuestRequest, AnalyzeVoiceRequest, ChatRequest, CheatsheetRequest,
    ClearRequest, EvaluateRequest, FeedbackQuery, LogsQuery, SaveUserDataRequest, TtsRequest,
    VoiceMessage,
};
use crate::analysis::evaluation::FeedbackRecord;
use crate::analysis::prompts::CHAT_APOLOGY;
use crate::analysis::quest::QuestAnalysisEntry;
use crate::chat::chat_turn;
use crate::config::AppConfig;
use crate::llm::LlmProvider;
use crate::session::SessionStore;
use crate::speech::{synthesize_to_store, SpeechProvider};
use crate::store::service::validate_component;
use crate::store::{clock, LogStore, StoreError, UserInfo, DEFAULT_PAGE_TYPE, UNKNOWN_PARTICIPANT};

fn analysis_error(err: AnalysisError, context: &str) -> ApiError {
    match err {
        AnalysisError::Llm(e) => {
            error!("{} upstream error: {}", context, e);
            ApiError::Upstream(format!("{} 중 오류가 발생했습니다.", context))
        }
        AnalysisError::Parse(_) | AnalysisError::Shape(_) => {
            error!("{} result could not be parsed: {}", context, err);
            ApiError::Parse(format!("{} 결과 파싱 중 오류가 발생했습니다.", context))
        }
    }
}

// --- Conversation ---

#[post("/chat")]
pub async fn chat(
    config: web::Data<AppConfig>,
    store: web::Data<LogStore>,
    sessions: web::Data<SessionStore>,
    llm: web::Data<Arc<dyn LlmProvider>>,
    req: web::Json<ChatRequest>,
) -> WebResult<HttpResponse> {
    let req = req.into_inner();
    if req.message.is_empty() {
        return Err(ApiError::BadRequest("메시지가 없습니다.".to_string()).into());
    }
    let participant_id = non_empty(req.participant_id);
    let page_type = non_empty(req.page_type);
    for name in participant_id.iter().chain(page_type.iter()) {
        validate_component(name).map_err(ApiError::from)?;
    }
    info!("User message: {} (participant: {:?})", req.message, participant_id);

    match chat_turn(
        &config,
        llm.get_ref().as_ref(),
        &store,
        &sessions,
        &req.message,
        participant_id.as_deref(),
        page_type.as_deref(),
    )
    .await
    {
        Ok(reply) => Ok(HttpResponse::Ok().json(json!({
            "response": reply,
            "status": "success",
        }))),
        Err(e) => {
            error!("Chat completion failed: {}", e);
            Ok(HttpResponse::InternalServerError().json(json!({
                "response": CHAT_APOLOGY,
                "status": "error",
            })))
        }
    }
}

#[post("/clear")]
pub async fn clear(
    sessions: web::Data<SessionStore>,
    req: Option<web::Json<ClearRequest>>,
) -> WebResult<HttpResponse> {
    let participant_id = req.and_then(|r| non_empty(r.into_inner().participant_id));
    sessions.clear(participant_id.as_deref());
    info!("Conversation buffer cleared ({:?})", participant_id);

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "message": "대화 기록이 초기화되었습니다.",
    })))
}

#[get("/health")]
pub async fn health() -> WebResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(json!({
        "status": "healthy",
        "message": "서버가 정상적으로 작동 중입니다.",
    })))
}

// --- Participant data ---

#[post("/save-user-data")]
pub async fn save_user_data(
    store: web::Data<LogStore>,
    req: web::Json<SaveUserDataRequest>,
) -> WebResult<HttpResponse> {
    let req = req.into_inner();
    let participant_id = match non_empty(req.participant_id) {
        Some(id) if is_truthy(&req.symptoms) && is_truthy(&req.consent) => id,
        _ => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "status": "error",
                "message": "필수 정보가 누락되었습니다.",
            })))
        }
    };

    let info = UserInfo {
        participant_id,
        symptoms: req.symptoms,
        consent: req.consent,
        login_time: req.login_time,
        created_at: clock::iso_now(),
    };

    match store.write_user_info(&info) {
        Ok(_) => Ok(HttpResponse::Ok().json(json!({
            "status": "success",
            "message": "사용자 정보가 저장되었습니다.",
        }))),
        Err(e) => {
            error!("Failed to save user info: {}", e);
            let status = match e {
                StoreError::InvalidName(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            Ok(HttpResponse::build(status).json(json!({
                "status": "error",
                "message": "서버 오류가 발생했습니다.",
            })))
        }
    }
}

#[get("/logs")]
pub async fn get_logs(
    store: web::Data<LogStore>,
    query: web::Query<LogsQuery>,
) -> WebResult<HttpResponse> {
    let query = query.into_inner();
    let date = non_empty(query.date).unwrap_or_else(clock::today);
    let participant_id = non_empty(query.participant_id);
    let page_type = non_empty(query.page_type).unwrap_or_else(|| DEFAULT_PAGE_TYPE.to_string());

    let logs = store
        .read_log(
            participant_id.as_deref().unwrap_or(UNKNOWN_PARTICIPANT),
            &page_type,
            &date,
        )
        .map_err(ApiError::from)?;
    let empty = logs.is_empty();

    let mut body = json!({
        "status": "success",
        "logs": logs,
        "date": date,
        "participant_id": participant_id,
        "page_type": page_type,
    });
    if empty {
        body["message"] = json!("해당 참여자의 로그가 없습니다.");
    }
    Ok(HttpResponse::Ok().json(body))
}

// --- Evaluation and feedback ---

#[post("/evaluate")]
pub async fn evaluate(
    config: web::Data<AppConfig>,
    store: web::Data<LogStore>,
    llm: web::Data<Arc<dyn LlmProvider>>,
    req: web::Json<EvaluateRequest>,
) -> WebResult<HttpResponse> {
    let req = req.into_inner();
    if req.logs.is_empty() {
        return Err(ApiError::BadRequest("평가할 대화 로그가 없습니다.".to_string()).into());
    }
    let participant_id = non_empty(req.participant_id);
    if let Some(id) = &participant_id {
        validate_component(id).map_err(ApiError::from)?;
    }

    let result = evaluation::evaluate(llm.get_ref().as_ref(), &config.llm.evaluation, &req.logs)
        .await
        .map_err(|e| analysis_error(e, "평가"))?;
    info!("Evaluation complete: {:?}", participant_id);

    if let Some(id) = participant_id {
        let record = FeedbackRecord {
            participant_id: id.clone(),
            evaluation_date: clock::iso_now(),
            evaluation_type: Some(req.evaluation_type),
            conversation_logs: req.logs,
            evaluation_result: serde_json::Value::Object(result.clone()),
        };
        store
            .write_singleton(&id, "feedback", &record)
            .map_err(ApiError::from)?;
    }

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "evaluation": result,
    })))
}

#[get("/feedback")]
pub async fn get_feedback(
    store: web::Data<LogStore>,
    query: web::Query<FeedbackQuery>,
) -> WebResult<HttpResponse> {
    let query = query.into_inner();
    let participant_id = non_empty(query.participant_id)
        .ok_or_else(|| ApiError::BadRequest("참여자 ID가 필요합니다.".to_string()))?;
    let date = non_empty(query.date).unwrap_or_else(clock::today);

    let feedback_data = store
        .read_singletons(&participant_id, "feedback", &date)
        .map_err(ApiError::from)?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "feedback_data": feedback_data,
        "participant_id": participant_id,
        "date": date,
    })))
}

#[post("/generate-cheatsheet")]
pub async fn generate_cheatsheet(
    config: web::Data<AppConfig>,
    store: web::Data<LogStore>,
    llm: web::Data<Arc<dyn LlmProvider>>,
    req: web::Json<CheatsheetRequest>,
) -> WebResult<HttpResponse> {
    let participant_id = non_empty(req.into_inner().participant_id)
        .ok_or_else(|| ApiError::BadRequest("참여자 ID가 필요합니다.".to_string()))?;

    store
        .ensure_participant_dir(&participant_id)
        .map_err(ApiError::from)?;
    let user_info = store.read_user_info(&participant_id).map_err(ApiError::from)?;
    let conversation = store
        .latest_conversation_log(&participant_id)
        .map_err(ApiError::from)?;
    let feedback = store
        .latest_singleton(&participant_id, "feedback")
        .map_err(ApiError::from)?;

    let inputs = cheatsheet::CheatsheetInputs {
        participant_id: &participant_id,
        user_info: user_info.as_ref(),
        conversation: &conversation,
        feedback: feedback.as_ref(),
    };
    let sheet = cheatsheet::generate(llm.get_ref().as_ref(), &config.llm.cheatsheet, &inputs)
        .await
        .map_err(|e| {
            error!("Cheatsheet generation failed: {}", e);
            ApiError::Internal("치트시트 생성 중 오류가 발생했습니다.".to_string())
        })?;

    store
        .write_singleton(&participant_id, "cheatsheet", &sheet)
        .map_err(ApiError::from)?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "cheatsheet": sheet,
    })))
}

// --- Quest and voice analysis ---

#[post("/analyze-quest")]
pub async fn analyze_quest(
    config: web::Data<AppConfig>,
    store: web::Data<LogStore>,
    llm: web::Data<Arc<dyn LlmProvider>>,
    req: web::Json<AnalyzeQuestRequest>,
) -> WebResult<HttpResponse> {
    let req = req.into_inner();
    let participant_id = non_empty(req.participant_id);

    let analysis = match quest::analyze(
        llm.get_ref().as_ref(),
        &config.llm.quest,
        &req.active_quests,
        &req.user_message,
        &req.bot_response,
    )
    .await
    {
        Ok(analysis) => analysis,
        Err(e) => {
            error!("Quest analysis failed: {}", e);
            return Ok(HttpResponse::InternalServerError().json(json!({
                "status": "error",
                "error": e.to_string(),
            })));
        }
    };

    if let (Some(id), Some(raw)) = (&participant_id, &analysis.analysis_result) {
        let entry = QuestAnalysisEntry {
            timestamp: clock::iso_now(),
            kind: "quest_analysis".to_string(),
            user_message: req.user_message.clone(),
            bot_response: req.bot_response.clone(),
            active_quests: req.active_quests.clone(),
            analysis_result: raw.clone(),
            completed_quests: analysis.completed_quests.clone(),
        };
        if let Err(e) = store.append_ndjson(id, "quest_analysis", &clock::today(), &entry) {
            error!("Failed to save quest analysis log: {}", e);
        }
    }

    let mut body = serde_json::to_value(&analysis)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    body["status"] = json!("success");
    Ok(HttpResponse::Ok().json(body))
}

#[post("/analyze-voice")]
pub async fn analyze_voice(
    config: web::Data<AppConfig>,
    store: web::Data<LogStore>,
    llm: web::Data<Arc<dyn LlmProvider>>,
    req: web::Json<AnalyzeVoiceRequest>,
) -> WebResult<HttpResponse> {
    let req = req.into_inner();
    let utterances: Vec<String> = req
        .messages
        .into_iter()
        .map(VoiceMessage::into_text)
        .filter(|t| !t.trim().is_empty())
        .collect();
    if utterances.is_empty() {
        return Err(ApiError::BadRequest("분석할 메시지가 없습니다.".to_string()).into());
    }
    let participant_id = non_empty(req.participant_id);

    let analysis = voice::analyze(llm.get_ref().as_ref(), &config.llm.voice, &utterances)
        .await
        .map_err(|e| analysis_error(e, "음성 분석"))?;

    if let Some(id) = &participant_id {
        let record = json!({
            "participant_id": id,
            "analysis_date": clock::iso_now(),
            "messages": utterances,
            "analysis": analysis,
        });
        store
            .write_singleton(id, "voice_analysis", &record)
            .map_err(ApiError::from)?;
    }

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "analysis": analysis,
        "fallback": analysis.fallback,
    })))
}

// --- Speech ---

#[post("/tts")]
pub async fn tts(
    store: web::Data<LogStore>,
    speech: web::Data<Arc<dyn SpeechProvider>>,
    req: web::Json<TtsRequest>,
) -> WebResult<HttpResponse> {
    let req = req.into_inner();
    if req.text.is_empty() {
        return Err(ApiError::BadRequest("텍스트가 없습니다.".to_string()).into());
    }
    let participant_id = non_empty(req.participant_id);
    if let Some(id) = &participant_id {
        validate_component(id).map_err(ApiError::from)?;
    }

    let path = synthesize_to_store(
        speech.get_ref().as_ref(),
        &store,
        participant_id.as_deref(),
        &req.text,
    )
    .await
    .map_err(|e| {
        error!("TTS failed: {}", e);
        ApiError::Upstream("음성 생성에 실패했습니다.".to_string())
    })?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "audio_url": format!("/api/audio/{}", file_name),
    })))
}

#[get("/audio/{filename}")]
pub async fn serve_audio(
    store: web::Data<LogStore>,
    filename: web::Path<String>,
) -> WebResult<HttpResponse> {
    let filename = filename.into_inner();
    let not_found = || ApiError::NotFound("오디오 파일을 찾을 수 없습니다.".to_string());

    let path = match store.find_audio(&filename) {
        Ok(Some(path)) => path,
        Ok(None) => return Err(not_found().into()),
        Err(e) => {
            warn!("Rejected audio lookup {:?}: {}", filename, e);
            return Err(not_found().into());
        }
    };

    let bytes = tokio::fs::read(&path).await.map_err(|e| {
        error!("Failed to read {}: {}", path.display(), e);
        ApiError::Internal("오디오 파일 제공 중 오류가 발생했습니다.".to_string())
    })?;

    Ok(HttpResponse::Ok().content_type("audio/mpeg").body(bytes))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .service(chat)
            .service(clear)
            .service(health)
            .service(save_user_data)
            .service(get_logs)
            .service(evaluate)
            .service(get_feedback)
            .service(generate_cheatsheet)
            .service(analyze_quest)
            .service(analyze_voice)
            .service(tts)
            .service(serve_audio)
            .configure(crate::api::routes_debug::configure),
    );
}
