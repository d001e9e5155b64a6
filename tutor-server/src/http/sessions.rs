//! Session REST handlers
//!
//! Enum-valued fields arrive as strings and are parsed here, so a bad value
//! is a 400 `VALIDATION_ERROR` rather than a body rejection.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tutor_core::{
    AttentionEvent, AttentionEventType, AttentionSummary, ChatMessage, NewAttentionEvent,
    PedagogyStatus, PhaseAdvance, Session, SessionPhase,
};

use crate::AppState;
use crate::error::{ErrorResponse, error_response};

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

/// POST /api/sessions body
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub student_id: String,
    #[serde(default)]
    pub tutor_id: String,
}

/// POST /api/sessions/:id/attention-event body
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AttentionEventRequest {
    #[serde(rename = "type", default)]
    pub event_type: String,
    #[serde(default)]
    pub student_id: String,
    #[serde(default)]
    pub tutor_id: String,
    #[serde(default)]
    pub metadata: Option<Value>,
}

/// POST /api/sessions/:id/phase body
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PhaseRequest {
    #[serde(default)]
    pub phase: String,
}

/// GET /api/sessions/:id/pedagogy-status response
#[derive(Debug, Serialize, Deserialize)]
pub struct PedagogyStatusResponse {
    pub session_id: String,
    pub status: PedagogyStatus,
    pub alerts: Vec<String>,
}

/// POST /api/sessions
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<Session>), (StatusCode, Json<ErrorResponse>)> {
    let session = state
        .engine
        .create_session(&body.student_id, &body.tutor_id)
        .await
        .map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// GET /api/sessions/:id
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Session> {
    let session = state.engine.get_session(&id).await.map_err(error_response)?;
    Ok(Json(session))
}

/// POST /api/sessions/:id/start
pub async fn start_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Session> {
    let session = state
        .engine
        .start_session(&id)
        .await
        .map_err(error_response)?;
    Ok(Json(session))
}

/// POST /api/sessions/:id/complete
pub async fn complete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Session> {
    let session = state
        .engine
        .complete_session(&id)
        .await
        .map_err(error_response)?;
    Ok(Json(session))
}

/// POST /api/sessions/:id/attention-event
pub async fn create_attention_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<AttentionEventRequest>,
) -> Result<(StatusCode, Json<AttentionEvent>), (StatusCode, Json<ErrorResponse>)> {
    let event_type: AttentionEventType = body.event_type.parse().map_err(error_response)?;
    let mut new = NewAttentionEvent::new(&id, &body.student_id, &body.tutor_id, event_type);
    new.metadata = body.metadata;

    let event = state.engine.create_event(new).await.map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// GET /api/sessions/:id/attention-summary
pub async fn attention_summary(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<AttentionSummary> {
    let summary = state
        .engine
        .get_attention_summary(&id)
        .await
        .map_err(error_response)?;
    Ok(Json(summary))
}

/// POST /api/sessions/:id/phase
pub async fn advance_phase(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<PhaseRequest>,
) -> ApiResult<PhaseAdvance> {
    let phase: SessionPhase = body.phase.parse().map_err(error_response)?;
    let advance = state
        .engine
        .advance_phase(&id, phase)
        .await
        .map_err(error_response)?;
    Ok(Json(advance))
}

/// GET /api/sessions/:id/pedagogy-status
pub async fn pedagogy_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<PedagogyStatusResponse> {
    let evaluation = state
        .engine
        .get_pedagogy_status(&id)
        .await
        .map_err(error_response)?;
    Ok(Json(PedagogyStatusResponse {
        session_id: evaluation.session_id,
        status: evaluation.status,
        alerts: evaluation.alerts,
    }))
}

/// GET /api/sessions/:id/messages
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Vec<ChatMessage>> {
    let messages = state
        .engine
        .list_messages(&id)
        .await
        .map_err(error_response)?;
    Ok(Json(messages))
}
