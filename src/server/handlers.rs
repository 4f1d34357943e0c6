//! Route handlers.
//!
//! Handlers lock the session for the whole action and answer with a fresh
//! [`SessionSnapshot`], so the client always re-renders from server state.
//!
//! Batch and finalize run on their own task holding an owned lock. A client
//! that disconnects mid-call does not stop them; the result is waiting in
//! the session on the next request.

use super::AppState;
use crate::config::ProcessingStyle;
use crate::error::{AssistantError, SessionError};
use crate::session::{Session, SessionSnapshot, UploadedFile};
use crate::workflow;
use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, warn};
use uuid::Uuid;

type ApiResult<T> = Result<T, (StatusCode, String)>;

const INDEX_HTML: &str = include_str!("index.html");

/// Multipart field carrying the processing style.
const STYLE_FIELD: &str = "style";
/// Multipart field(s) carrying the images.
const IMAGE_FIELD: &str = "images";

fn status_for(e: &AssistantError) -> StatusCode {
    match e {
        AssistantError::UnsupportedImage { .. } | AssistantError::InvalidConfig(_) => {
            StatusCode::BAD_REQUEST
        }
        AssistantError::Session(SessionError::EmptyBatch) => StatusCode::BAD_REQUEST,
        AssistantError::Session(SessionError::UnknownRecord(_)) => StatusCode::NOT_FOUND,
        AssistantError::Session(_) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn api_error(e: AssistantError) -> (StatusCode, String) {
    let status = status_for(&e);
    if status.is_server_error() {
        error!("Request failed: {}", e);
    }
    (status, e.to_string())
}

fn task_failed(e: tokio::task::JoinError) -> (StatusCode, String) {
    error!("Session task failed: {}", e);
    (StatusCode::INTERNAL_SERVER_ERROR, "Session task failed".to_string())
}

async fn session_handle(state: &AppState, id: Uuid) -> ApiResult<Arc<Mutex<Session>>> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("Session not found: {id}")))
}

/// Static single-page client.
pub async fn index_page() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Liveness probe.
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "sessions": state.sessions.len().await,
    }))
}

pub async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<SessionSnapshot>) {
    let handle = state.sessions.create().await;
    let snapshot = handle.lock().await.snapshot();
    (StatusCode::CREATED, Json(snapshot))
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SessionSnapshot>> {
    let handle = session_handle(&state, id).await?;
    let snapshot = handle.lock().await.snapshot();
    Ok(Json(snapshot))
}

pub async fn delete_session(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    if state.sessions.remove(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, format!("Session not found: {id}")))
    }
}

/// Upload a batch (`style` + one or more `images` fields) and process it.
pub async fn submit_batch(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> ApiResult<Json<SessionSnapshot>> {
    let handle = session_handle(&state, id).await?;

    let mut style: Option<ProcessingStyle> = None;
    let mut uploads = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some(STYLE_FIELD) => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
                style = Some(text.parse().map_err(api_error)?);
            }
            Some(IMAGE_FIELD) => {
                let file_name = field
                    .file_name()
                    .map(str::to_owned)
                    .unwrap_or_else(|| format!("upload-{}", uploads.len() + 1));
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| (StatusCode::BAD_REQUEST, format!("Failed to read '{file_name}': {e}")))?;
                uploads.push(UploadedFile::new(file_name, bytes.to_vec()).map_err(api_error)?);
            }
            other => warn!("Ignoring unexpected multipart field {:?}", other),
        }
    }

    let style = style.unwrap_or(state.assistant.config().default_style);
    let assistant = Arc::clone(&state.assistant);
    let mut session = handle.lock_owned().await;
    let (result, snapshot) = tokio::spawn(async move {
        let result = workflow::process_batch(&assistant, &mut session, uploads, style).await;
        (result, session.snapshot())
    })
    .await
    .map_err(task_failed)?;

    result.map_err(api_error)?;
    Ok(Json(snapshot))
}

/// Body of `PATCH /api/sessions/{id}/records/{record_id}`.
#[derive(Debug, Deserialize)]
pub struct RecordUpdate {
    pub included: Option<bool>,
    pub text: Option<String>,
}

pub async fn update_record(
    State(state): State<AppState>,
    Path((id, record_id)): Path<(Uuid, Uuid)>,
    Json(update): Json<RecordUpdate>,
) -> ApiResult<Json<SessionSnapshot>> {
    let handle = session_handle(&state, id).await?;
    let mut session = handle.lock().await;

    if let Some(included) = update.included {
        session
            .set_included(record_id, included)
            .map_err(|e| api_error(e.into()))?;
    }
    if let Some(text) = update.text {
        session
            .edit_text(record_id, text)
            .map_err(|e| api_error(e.into()))?;
    }
    Ok(Json(session.snapshot()))
}

/// Summarise and assemble. Answers 409 with the snapshot (carrying the
/// warning) when nothing is selected.
pub async fn finalize_session(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    let handle = match session_handle(&state, id).await {
        Ok(handle) => handle,
        Err(e) => return e.into_response(),
    };
    let assistant = Arc::clone(&state.assistant);
    let mut session = handle.lock_owned().await;
    let joined = tokio::spawn(async move {
        let result = workflow::finalize(&assistant, &mut session).await;
        (result, session.snapshot())
    })
    .await;

    match joined {
        Ok((Ok(()), snapshot)) => Json(snapshot).into_response(),
        Ok((Err(AssistantError::Session(SessionError::NothingSelected)), snapshot)) => {
            (StatusCode::CONFLICT, Json(snapshot)).into_response()
        }
        Ok((Err(e), _)) => api_error(e).into_response(),
        Err(e) => task_failed(e).into_response(),
    }
}

/// Hand out the finished document. It is not kept after this call.
pub async fn download_document(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Response> {
    let handle = session_handle(&state, id).await?;
    let document = handle
        .lock()
        .await
        .take_document()
        .ok_or_else(|| (StatusCode::NOT_FOUND, "No document is ready for download".to_string()))?;

    let headers = [
        (header::CONTENT_TYPE, document.mime_type().to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", document.file_name()),
        ),
    ];
    Ok((headers, document.bytes.to_vec()).into_response())
}
