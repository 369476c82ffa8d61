use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    ai::QuestionPlan,
    auth::AuthUser,
    questions::dto::GeneratedQuestionsResponse,
    questions::repo::InterviewQuestion,
    resume,
    sessions::{InterviewSession, SessionStatus},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/generate-questions/:session_id",
        post(generate_questions).get(list_questions),
    )
}

#[instrument(skip(state))]
pub async fn generate_questions(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(session_id): Path<Uuid>,
) -> Result<Json<GeneratedQuestionsResponse>, (StatusCode, String)> {
    let session = InterviewSession::find_for_user(&state.db, session_id, user_id)
        .await
        .map_err(internal)?
        .ok_or((
            StatusCode::NOT_FOUND,
            "Interview session not found".to_string(),
        ))?;

    if session.status != SessionStatus::Setup {
        warn!(%session_id, status = ?session.status, "generation requested on a started session");
        return Err((
            StatusCode::CONFLICT,
            "Questions already generated for this session".into(),
        ));
    }

    let resume_text =
        resume::resolve_resume_text(&state.config.upload_dir, session.resume_ref.as_deref()).await;
    info!(
        %session_id,
        count = session.total_questions,
        live_coding = session.live_coding,
        resume = if resume_text.is_empty() { "not provided" } else { "provided" },
        "generating questions"
    );

    let generated = state
        .ai
        .generate_questions(QuestionPlan {
            job_role: &session.job_role,
            experience_level: session.experience_level.as_str(),
            resume_text: &resume_text,
            job_description: &session.job_description,
            count: session.total_questions as u32,
            live_coding: session.live_coding,
        })
        .await
        .map_err(|e| {
            error!(error = %e, %session_id, "question generation failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    let questions = InterviewQuestion::insert_batch(&state.db, session.id, &generated)
        .await
        .map_err(internal)?;

    InterviewSession::mark_started(&state.db, session.id)
        .await
        .map_err(internal)?;

    info!(%session_id, count = questions.len(), "questions generated");
    Ok(Json(GeneratedQuestionsResponse {
        questions,
        message: "Questions generated successfully".into(),
    }))
}

#[instrument(skip(state))]
pub async fn list_questions(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(session_id): Path<Uuid>,
) -> Result<Json<Vec<InterviewQuestion>>, (StatusCode, String)> {
    let session = InterviewSession::find_for_user(&state.db, session_id, user_id)
        .await
        .map_err(internal)?
        .ok_or((
            StatusCode::NOT_FOUND,
            "Interview session not found".to_string(),
        ))?;

    let questions = InterviewQuestion::list_for_session(&state.db, session.id)
        .await
        .map_err(internal)?;
    Ok(Json(questions))
}

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
