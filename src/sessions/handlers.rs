use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    resume,
    sessions::dto::UpdateStatusRequest,
    sessions::repo::{InterviewSession, NewSession, SessionStatus},
    sessions::services::{allowed_resume_ext, validate_new_session, NewSessionForm, ResumeUpload},
    state::AppState,
    storage,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/interview-sessions", post(create_session).get(list_sessions))
        .route("/interview-sessions/:id", get(get_session))
        .route("/interview-sessions/:id/status", patch(update_status))
        .route("/interview-sessions/:id/advance", post(advance_session))
        .route("/interview-sessions/:id/resume", get(download_resume))
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024)) // resumes
}

/// POST /interview-sessions (multipart)
/// Text fields plus an optional `resume` file or pasted `resume_text`.
#[instrument(skip(state, mp))]
pub async fn create_session(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mut mp: Multipart,
) -> Result<(StatusCode, Json<InterviewSession>), (StatusCode, String)> {
    let mut form = NewSessionForm::default();
    while let Ok(Some(field)) = mp.next_field().await {
        let Some(name) = field.name().map(|s| s.to_string()) else {
            continue;
        };
        if name == "resume" {
            let filename = field.file_name().unwrap_or("resume").to_string();
            let body = field
                .bytes()
                .await
                .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
            if !body.is_empty() {
                form.resume_file = Some(ResumeUpload { filename, body });
            }
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
            form.accept_text_field(&name, value);
        }
    }

    let draft = validate_new_session(&form, &state.config.interview).map_err(|msg| {
        warn!(%user_id, reason = %msg, "session creation rejected");
        (StatusCode::BAD_REQUEST, msg)
    })?;

    // An uploaded file wins over pasted text; the recorded reference is
    // either the stored path or the text itself.
    let resume_ref = match (form.resume_file, form.resume_text) {
        (Some(upload), _) => {
            let ext = storage::ext_from_filename(&upload.filename).ok_or((
                StatusCode::BAD_REQUEST,
                "Resume file needs a file extension".to_string(),
            ))?;
            if !allowed_resume_ext(&ext) {
                return Err((
                    StatusCode::BAD_REQUEST,
                    "Only PDF, DOC, DOCX, TXT, or MD files are allowed".into(),
                ));
            }
            let key = format!(
                "resumes/{user_id}/{}",
                storage::unique_name(None, Some(&ext))
            );
            let stored = state.storage.store(&key, upload.body).await.map_err(internal)?;
            Some(stored)
        }
        (None, Some(text)) if !text.trim().is_empty() => Some(text),
        _ => None,
    };

    let session = InterviewSession::create(
        &state.db,
        &NewSession {
            user_id,
            title: draft.title,
            job_role: draft.job_role,
            experience_level: draft.experience_level,
            job_description: draft.job_description,
            resume_ref,
            total_questions: draft.total_questions,
            live_coding: draft.live_coding,
        },
    )
    .await
    .map_err(internal)?;

    info!(
        session_id = %session.id,
        %user_id,
        total_questions = session.total_questions,
        live_coding = session.live_coding,
        "interview session created"
    );
    Ok((StatusCode::CREATED, Json(session)))
}

#[instrument(skip(state))]
pub async fn list_sessions(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<InterviewSession>>, (StatusCode, String)> {
    let sessions = InterviewSession::list_for_user(&state.db, user_id)
        .await
        .map_err(internal)?;
    Ok(Json(sessions))
}

#[instrument(skip(state))]
pub async fn get_session(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<InterviewSession>, (StatusCode, String)> {
    let session = InterviewSession::find_for_user(&state.db, id, user_id)
        .await
        .map_err(internal)?
        .ok_or((
            StatusCode::NOT_FOUND,
            "Interview session not found".to_string(),
        ))?;
    Ok(Json(session))
}

#[instrument(skip(state, body))]
pub async fn update_status(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<InterviewSession>, (StatusCode, String)> {
    let session = InterviewSession::find_for_user(&state.db, id, user_id)
        .await
        .map_err(internal)?
        .ok_or((
            StatusCode::NOT_FOUND,
            "Interview session not found".to_string(),
        ))?;

    if session.status == body.status {
        return Ok(Json(session));
    }
    if !session.status.can_transition_to(body.status) {
        warn!(
            session_id = %session.id,
            from = session.status.as_str(),
            to = body.status.as_str(),
            "rejected status transition"
        );
        return Err((
            StatusCode::CONFLICT,
            format!(
                "Cannot move session from {} to {}",
                session.status.as_str(),
                body.status.as_str()
            ),
        ));
    }

    let updated = if body.status == SessionStatus::InProgress {
        InterviewSession::mark_started(&state.db, session.id).await
    } else {
        InterviewSession::set_status(&state.db, session.id, body.status).await
    }
    .map_err(internal)?;

    info!(session_id = %updated.id, status = updated.status.as_str(), "session status updated");
    Ok(Json(updated))
}

#[instrument(skip(state))]
pub async fn advance_session(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<InterviewSession>, (StatusCode, String)> {
    let session = InterviewSession::find_for_user(&state.db, id, user_id)
        .await
        .map_err(internal)?
        .ok_or((
            StatusCode::NOT_FOUND,
            "Interview session not found".to_string(),
        ))?;

    if session.status != SessionStatus::InProgress {
        return Err((
            StatusCode::CONFLICT,
            "Session is not in progress".to_string(),
        ));
    }
    if !session.can_advance() {
        return Err((
            StatusCode::CONFLICT,
            "Already at the last question".to_string(),
        ));
    }

    // The statement re-checks the bound, so a concurrent advance still
    // cannot overshoot.
    match InterviewSession::advance(&state.db, session.id)
        .await
        .map_err(internal)?
    {
        Some(updated) => Ok(Json(updated)),
        None => Err((
            StatusCode::CONFLICT,
            "Already at the last question".to_string(),
        )),
    }
}

#[instrument(skip(state))]
pub async fn download_resume(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let session = InterviewSession::find_for_user(&state.db, id, user_id)
        .await
        .map_err(internal)?
        .ok_or((
            StatusCode::NOT_FOUND,
            "Interview session not found".to_string(),
        ))?;

    let resume_ref = session.resume_ref.ok_or((
        StatusCode::NOT_FOUND,
        "Resume not found for this session".to_string(),
    ))?;
    // Pasted resume text has no file to download.
    if !resume::is_stored_upload(&state.config.upload_dir, &resume_ref) {
        return Err((
            StatusCode::NOT_FOUND,
            "Resume not found for this session".to_string(),
        ));
    }

    let body = state.storage.read(&resume_ref).await.map_err(|e| {
        error!(error = %e, session_id = %session.id, "resume file missing on disk");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Error downloading resume file".to_string(),
        )
    })?;

    let filename = resume_ref.rsplit('/').next().unwrap_or("resume").to_string();
    let content_type = resume_content_type(&filename);
    Ok((
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    ))
}

fn resume_content_type(filename: &str) -> &'static str {
    match storage::ext_from_filename(filename).as_deref() {
        Some("pdf") => "application/pdf",
        Some("doc") => "application/msword",
        Some("docx") => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        Some("txt") | Some("md") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resume_content_types() {
        assert_eq!(resume_content_type("a.pdf"), "application/pdf");
        assert_eq!(resume_content_type("notes.TXT"), "text/plain; charset=utf-8");
        assert_eq!(resume_content_type("cv"), "application/octet-stream");
    }
}
