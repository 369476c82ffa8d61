use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{error, info, instrument};

use crate::{
    ai::SpokenExchange,
    auth::AuthUser,
    interview::dto::{
        CodeSubmission, EvaluationResponse, FollowupResponse, QuestionRef, SavedAnswerResponse,
    },
    interview::services::{read_answer_multipart, transcribe_answer},
    questions::{InterviewQuestion, QuestionKind},
    sessions::InterviewSession,
    state::AppState,
    storage,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/interview-chat/save-first-answer", post(save_first_answer))
        .route(
            "/interview-chat/save-followup-answer",
            post(save_followup_answer),
        )
        .route("/interview-chat/generate-followup", post(generate_followup))
        .route("/interview-chat/evaluate-answer", post(evaluate_answer))
        .route(
            "/interview-chat/submit-coding-answer",
            post(submit_coding_answer),
        )
        .layer(DefaultBodyLimit::max(50 * 1024 * 1024)) // recorded answers
}

/// POST /interview-chat/save-first-answer (multipart)
#[instrument(skip(state, mp))]
pub async fn save_first_answer(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mut mp: Multipart,
) -> Result<Json<SavedAnswerResponse>, (StatusCode, String)> {
    let upload = read_answer_multipart(&mut mp, &["answer"])
        .await
        .map_err(|msg| (StatusCode::BAD_REQUEST, msg))?;
    let session_id = upload.session_id.ok_or((
        StatusCode::BAD_REQUEST,
        "A valid session_id is required".to_string(),
    ))?;
    let question_id = upload.question_id.ok_or((
        StatusCode::BAD_REQUEST,
        "A valid question_id is required".to_string(),
    ))?;
    let (filename, body) = upload
        .file
        .filter(|(_, body)| !body.is_empty())
        .ok_or((StatusCode::BAD_REQUEST, "File is required".to_string()))?;

    let session = InterviewSession::find_for_user(&state.db, session_id, user_id)
        .await
        .map_err(internal)?
        .ok_or((
            StatusCode::NOT_FOUND,
            "Interview session not found".to_string(),
        ))?;
    let question = InterviewQuestion::find_in_session(&state.db, session.id, question_id)
        .await
        .map_err(internal)?
        .ok_or((
            StatusCode::NOT_FOUND,
            "Interview question not found".to_string(),
        ))?;

    if question.is_evaluated() {
        return Err((
            StatusCode::CONFLICT,
            "Question has already been evaluated".into(),
        ));
    }

    let ext = storage::ext_from_filename(&filename).unwrap_or_else(|| "webm".into());
    let key = format!(
        "interviews/{}/{}",
        session.id,
        storage::unique_name(Some("main_question_ans"), Some(&ext))
    );
    let stored = state.storage.store(&key, body).await.map_err(internal)?;

    let interview = InterviewQuestion::set_first_answer(&state.db, question.id, &stored)
        .await
        .map_err(internal)?;

    info!(question_id = %interview.id, session_id = %session.id, "first answer recorded");
    Ok(Json(SavedAnswerResponse {
        success: true,
        interview,
    }))
}

/// POST /interview-chat/save-followup-answer (multipart)
/// The recording may arrive as `followup_answer` or plain `answer`.
#[instrument(skip(state, mp))]
pub async fn save_followup_answer(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mut mp: Multipart,
) -> Result<Json<SavedAnswerResponse>, (StatusCode, String)> {
    let upload = read_answer_multipart(&mut mp, &["followup_answer", "answer"])
        .await
        .map_err(|msg| (StatusCode::BAD_REQUEST, msg))?;
    let question_id = upload.question_id.ok_or((
        StatusCode::BAD_REQUEST,
        "A valid question_id is required".to_string(),
    ))?;
    let (filename, body) = upload
        .file
        .filter(|(_, body)| !body.is_empty())
        .ok_or((StatusCode::BAD_REQUEST, "File is required".to_string()))?;

    let question = InterviewQuestion::find_by_id(&state.db, question_id)
        .await
        .map_err(internal)?
        .ok_or((
            StatusCode::NOT_FOUND,
            "Interview question not found".to_string(),
        ))?;
    // Ownership check; a foreign question reads as missing.
    let session = InterviewSession::find_for_user(&state.db, question.session_id, user_id)
        .await
        .map_err(internal)?
        .ok_or((
            StatusCode::NOT_FOUND,
            "Interview question not found".to_string(),
        ))?;

    if question.is_evaluated() {
        return Err((
            StatusCode::CONFLICT,
            "Question has already been evaluated".into(),
        ));
    }
    if question.followup_question.is_none() {
        return Err((
            StatusCode::BAD_REQUEST,
            "No follow-up question has been generated for this question".into(),
        ));
    }

    let ext = storage::ext_from_filename(&filename).unwrap_or_else(|| "webm".into());
    let key = format!(
        "interviews/{}/{}",
        session.id,
        storage::unique_name(Some("followup"), Some(&ext))
    );
    let stored = state.storage.store(&key, body).await.map_err(internal)?;

    let interview = InterviewQuestion::set_followup_answer(&state.db, question.id, &stored)
        .await
        .map_err(internal)?;

    info!(question_id = %interview.id, session_id = %session.id, "follow-up answer recorded");
    Ok(Json(SavedAnswerResponse {
        success: true,
        interview,
    }))
}

#[instrument(skip(state, body))]
pub async fn generate_followup(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<QuestionRef>,
) -> Result<Json<FollowupResponse>, (StatusCode, String)> {
    let session = InterviewSession::find_for_user(&state.db, body.session_id, user_id)
        .await
        .map_err(internal)?
        .ok_or((
            StatusCode::NOT_FOUND,
            "Interview session not found".to_string(),
        ))?;
    let question = InterviewQuestion::find_in_session(&state.db, session.id, body.question_id)
        .await
        .map_err(internal)?
        .ok_or((
            StatusCode::NOT_FOUND,
            "Interview question not found".to_string(),
        ))?;

    if question.kind == QuestionKind::LiveCoding {
        return Err((
            StatusCode::BAD_REQUEST,
            "Follow-up questions are not part of live coding questions".into(),
        ));
    }
    let first_ref = question.first_answer_ref.as_deref().ok_or((
        StatusCode::BAD_REQUEST,
        "No recorded answer to follow up on".to_string(),
    ))?;

    let transcript = transcribe_answer(state.storage.as_ref(), state.ai.as_ref(), first_ref)
        .await
        .map_err(|e| {
            error!(error = %e, question_id = %question.id, "answer transcription failed");
            internal(e)
        })?;

    let followup = state
        .ai
        .generate_follow_up(&question.question_text, &transcript)
        .await
        .map_err(|e| {
            error!(error = %e, question_id = %question.id, "follow-up generation failed");
            internal(e)
        })?;

    InterviewQuestion::set_followup_question(&state.db, question.id, &followup)
        .await
        .map_err(internal)?;

    info!(question_id = %question.id, "follow-up question generated");
    Ok(Json(FollowupResponse {
        followup_question: followup,
        message: "Follow-up question generated".into(),
    }))
}

#[instrument(skip(state, body))]
pub async fn evaluate_answer(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<QuestionRef>,
) -> Result<Json<EvaluationResponse>, (StatusCode, String)> {
    let session = InterviewSession::find_for_user(&state.db, body.session_id, user_id)
        .await
        .map_err(internal)?
        .ok_or((
            StatusCode::NOT_FOUND,
            "Interview session not found".to_string(),
        ))?;
    let question = InterviewQuestion::find_in_session(&state.db, session.id, body.question_id)
        .await
        .map_err(internal)?
        .ok_or((
            StatusCode::NOT_FOUND,
            "Interview question not found".to_string(),
        ))?;

    if question.kind == QuestionKind::LiveCoding {
        return Err((
            StatusCode::BAD_REQUEST,
            "Use submit-coding-answer for live coding questions".into(),
        ));
    }
    let first_ref = question.first_answer_ref.clone().ok_or((
        StatusCode::BAD_REQUEST,
        "No recorded answer to evaluate".to_string(),
    ))?;
    let followup_ref = question.followup_answer_ref.clone().ok_or((
        StatusCode::BAD_REQUEST,
        "No recorded follow-up answer to evaluate".to_string(),
    ))?;

    // A scored question may be re-scored; only a live claim conflicts.
    let claimed = question.can_begin_evaluation(OffsetDateTime::now_utc())
        && InterviewQuestion::try_begin_evaluation(&state.db, question.id)
            .await
            .map_err(internal)?;
    if !claimed {
        return Err((
            StatusCode::CONFLICT,
            "Evaluation already in progress for this question".into(),
        ));
    }

    match score_spoken_exchange(&state, &session, &question, &first_ref, &followup_ref).await {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            if let Err(release) = InterviewQuestion::release_evaluation(&state.db, question.id).await
            {
                error!(error = %release, question_id = %question.id, "failed to release evaluation claim");
            }
            Err(e)
        }
    }
}

async fn score_spoken_exchange(
    state: &AppState,
    session: &InterviewSession,
    question: &InterviewQuestion,
    first_ref: &str,
    followup_ref: &str,
) -> Result<EvaluationResponse, (StatusCode, String)> {
    let first_transcript = transcribe_answer(state.storage.as_ref(), state.ai.as_ref(), first_ref)
        .await
        .map_err(|e| {
            error!(error = %e, question_id = %question.id, "first answer transcription failed");
            internal(e)
        })?;
    let followup_transcript =
        transcribe_answer(state.storage.as_ref(), state.ai.as_ref(), followup_ref)
            .await
            .map_err(|e| {
                error!(error = %e, question_id = %question.id, "follow-up transcription failed");
                internal(e)
            })?;

    let evaluation = state
        .ai
        .evaluate_answer(SpokenExchange {
            question_text: &question.question_text,
            followup_question: question.followup_question.as_deref().unwrap_or(""),
            first_transcript: &first_transcript,
            followup_transcript: &followup_transcript,
            job_role: &session.job_role,
            experience_level: session.experience_level.as_str(),
        })
        .await
        .map_err(|e| {
            error!(error = %e, question_id = %question.id, "evaluation failed");
            internal(e)
        })?;

    InterviewQuestion::save_evaluation(&state.db, question.id, evaluation.score, &evaluation.feedback)
        .await
        .map_err(internal)?;

    info!(question_id = %question.id, score = evaluation.score, "answer evaluated");
    Ok(EvaluationResponse {
        feedback: evaluation.feedback,
        score: evaluation.score,
        message: "Evaluation complete".into(),
    })
}

#[instrument(skip(state, body))]
pub async fn submit_coding_answer(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<CodeSubmission>,
) -> Result<Json<EvaluationResponse>, (StatusCode, String)> {
    let code = body.code_snippet.trim().to_string();
    if code.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "code_snippet is required".into()));
    }

    let session = InterviewSession::find_for_user(&state.db, body.session_id, user_id)
        .await
        .map_err(internal)?
        .ok_or((
            StatusCode::NOT_FOUND,
            "Interview session not found".to_string(),
        ))?;
    let question = InterviewQuestion::find_in_session(&state.db, session.id, body.question_id)
        .await
        .map_err(internal)?
        .ok_or((
            StatusCode::NOT_FOUND,
            "Interview question not found".to_string(),
        ))?;

    if question.kind != QuestionKind::LiveCoding {
        return Err((
            StatusCode::BAD_REQUEST,
            "Not a live coding question".into(),
        ));
    }

    // A scored question may be re-scored; only a live claim conflicts.
    let claimed = question.can_begin_evaluation(OffsetDateTime::now_utc())
        && InterviewQuestion::try_begin_evaluation(&state.db, question.id)
            .await
            .map_err(internal)?;
    if !claimed {
        return Err((
            StatusCode::CONFLICT,
            "Evaluation already in progress for this question".into(),
        ));
    }

    match score_code_submission(&state, &session, &question, &code).await {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            if let Err(release) = InterviewQuestion::release_evaluation(&state.db, question.id).await
            {
                error!(error = %release, question_id = %question.id, "failed to release evaluation claim");
            }
            Err(e)
        }
    }
}

async fn score_code_submission(
    state: &AppState,
    session: &InterviewSession,
    question: &InterviewQuestion,
    code: &str,
) -> Result<EvaluationResponse, (StatusCode, String)> {
    InterviewQuestion::set_first_answer(&state.db, question.id, code)
        .await
        .map_err(internal)?;

    let evaluation = state
        .ai
        .evaluate_code(
            &question.question_text,
            code,
            &session.job_role,
            session.experience_level.as_str(),
        )
        .await
        .map_err(|e| {
            error!(error = %e, question_id = %question.id, "code evaluation failed");
            internal(e)
        })?;

    InterviewQuestion::save_evaluation(&state.db, question.id, evaluation.score, &evaluation.feedback)
        .await
        .map_err(internal)?;

    info!(question_id = %question.id, score = evaluation.score, "coding answer evaluated");
    Ok(EvaluationResponse {
        feedback: evaluation.feedback,
        score: evaluation.score,
        message: "Evaluation complete".into(),
    })
}

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
