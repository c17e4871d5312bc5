//! Axum route handlers for the Session API.

use anyhow::Context;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::{AppError, AppJson};
use crate::interview::review::EvaluationReview;
use crate::models::chat::ChatMessage;
use crate::models::interview::{EvaluationReport, InterviewQuestion};
use crate::resume::UploadedFile;
use crate::session::orchestrator::{
    attach_resume, evaluate_answers, generate_questions, record_answer, record_answers,
    send_chat_message, QuestionRequest, ResumeUploadOutcome,
};
use crate::session::{InterviewSession, SessionSnapshot};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct QuestionsResponse {
    pub questions: Vec<InterviewQuestion>,
}

#[derive(Debug, Deserialize)]
pub struct AnswersRequest {
    pub answers: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub answer: String,
}

#[derive(Debug, Serialize)]
pub struct EvaluationResponse {
    pub evaluation: EvaluationReport,
    pub review: Option<EvaluationReview>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: ChatMessage,
    pub transcript_length: usize,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions
///
/// Starts a session with an empty scratch directory.
pub async fn handle_create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SessionSnapshot>), AppError> {
    let session = InterviewSession::new();

    let wipe = state
        .scratch
        .prepare_session(session.id)
        .await
        .context("Failed to prepare session scratch directory")?;
    if !wipe.failures.is_empty() {
        warn!(
            "Session {} scratch wipe left {} entries behind",
            session.id,
            wipe.failures.len()
        );
    }

    let snapshot = session.snapshot();
    state.sessions.insert(session).await;
    info!("Created session {}", snapshot.id);

    Ok((StatusCode::CREATED, Json(snapshot)))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let session = state.sessions.get(id).await?;
    let session = session.lock().await;
    Ok(Json(session.snapshot()))
}

/// DELETE /api/v1/sessions/:id
///
/// Discards the session and its uploaded files.
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.sessions.remove(id).await?;
    let wipe = state.scratch.remove_session(id).await;
    info!(
        "Discarded session {id} ({} files removed, {} failures)",
        wipe.removed,
        wipe.failures.len()
    );
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/sessions/:id/questions
///
/// Generates a fresh question set; answers are reset to empty strings.
pub async fn handle_generate_questions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(request): AppJson<QuestionRequest>,
) -> Result<Json<QuestionsResponse>, AppError> {
    let session = state.sessions.get(id).await?;
    let mut session = session.lock().await;
    let questions = generate_questions(&mut session, state.llm.as_ref(), &request).await?;
    Ok(Json(QuestionsResponse { questions }))
}

/// PUT /api/v1/sessions/:id/answers
pub async fn handle_put_answers(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(request): AppJson<AnswersRequest>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let session = state.sessions.get(id).await?;
    let mut session = session.lock().await;
    record_answers(&mut session, request.answers)?;
    Ok(Json(session.snapshot()))
}

/// PUT /api/v1/sessions/:id/answers/:index
///
/// `index` is 0-based.
pub async fn handle_put_answer(
    State(state): State<AppState>,
    Path((id, index)): Path<(Uuid, usize)>,
    AppJson(request): AppJson<AnswerRequest>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let session = state.sessions.get(id).await?;
    let mut session = session.lock().await;
    record_answer(&mut session, index, request.answer)?;
    Ok(Json(session.snapshot()))
}

/// POST /api/v1/sessions/:id/evaluation
pub async fn handle_evaluate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EvaluationResponse>, AppError> {
    let session = state.sessions.get(id).await?;
    let mut session = session.lock().await;
    let evaluation = evaluate_answers(&mut session, state.llm.as_ref()).await?;
    Ok(Json(EvaluationResponse {
        evaluation,
        review: session.review(),
    }))
}

/// POST /api/v1/sessions/:id/resume
///
/// Multipart upload; every part carrying a file name is treated as a résumé PDF.
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<ResumeUploadOutcome>, AppError> {
    let session = state.sessions.get(id).await?;

    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Upload(format!("Malformed upload: {e}")))?
    {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Upload(format!("Could not read {file_name}: {e}")))?;
        files.push(UploadedFile { file_name, data });
    }

    let mut session = session.lock().await;
    let outcome = attach_resume(&mut session, &state.scratch, &files).await?;
    Ok(Json(outcome))
}

/// GET /api/v1/sessions/:id/chat
pub async fn handle_get_transcript(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ChatMessage>>, AppError> {
    let session = state.sessions.get(id).await?;
    let session = session.lock().await;
    Ok(Json(session.transcript.clone()))
}

/// POST /api/v1/sessions/:id/chat
pub async fn handle_chat(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(request): AppJson<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let session = state.sessions.get(id).await?;
    let mut session = session.lock().await;
    let reply = send_chat_message(&mut session, state.llm.as_ref(), &request.message).await?;
    Ok(Json(ChatResponse {
        reply,
        transcript_length: session.transcript.len(),
    }))
}
