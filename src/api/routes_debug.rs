use actix_web::{get, web, HttpResponse, Result as WebResult};
use serde_json::{json, Value};

use crate::api::error::ApiError;
use crate::api::models::{non_empty, DebugQuery};
use crate::store::LogStore;

/// Participants and their stored file names. Narrowed to one participant
/// when `participant_id` is given.
#[get("/logs")]
pub async fn list_logs(
    store: web::Data<LogStore>,
    query: web::Query<DebugQuery>,
) -> WebResult<HttpResponse> {
    let participants = match non_empty(query.into_inner().participant_id) {
        Some(id) => vec![id],
        None => store.list_participants().map_err(ApiError::from)?,
    };

    let mut listing = serde_json::Map::new();
    for id in participants {
        let files = store.list_files(&id).map_err(ApiError::from)?;
        listing.insert(id, json!(files));
    }

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "log_dir": store.root().display().to_string(),
        "participants": listing,
    })))
}

/// Raw text of one stored file, plus its parsed form when it is JSON.
#[get("/log-content")]
pub async fn log_content(
    store: web::Data<LogStore>,
    query: web::Query<DebugQuery>,
) -> WebResult<HttpResponse> {
    let query = query.into_inner();
    let (participant_id, filename) = match (non_empty(query.participant_id), non_empty(query.filename)) {
        (Some(p), Some(f)) => (p, f),
        _ => {
            return Err(ApiError::BadRequest("participant_id와 filename이 필요합니다.".to_string()).into())
        }
    };

    let content = store
        .read_raw(&participant_id, &filename)
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::NotFound("파일을 찾을 수 없습니다.".to_string()))?;
    let parsed = serde_json::from_str::<Value>(&content).ok();

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "participant_id": participant_id,
        "filename": filename,
        "content": content,
        "parsed": parsed,
    })))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/debug").service(list_logs).service(log_content));
}
