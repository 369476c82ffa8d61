use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::questions::InterviewQuestion;

/// JSON body addressing one question inside one session.
#[derive(Debug, Deserialize)]
pub struct QuestionRef {
    pub session_id: Uuid,
    pub question_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct CodeSubmission {
    pub session_id: Uuid,
    pub question_id: Uuid,
    pub code_snippet: String,
}

/// Returned by both answer-upload routes: the updated question row.
#[derive(Debug, Serialize)]
pub struct SavedAnswerResponse {
    pub success: bool,
    pub interview: InterviewQuestion,
}

#[derive(Debug, Serialize)]
pub struct FollowupResponse {
    pub followup_question: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct EvaluationResponse {
    pub feedback: String,
    pub score: i32,
    pub message: String,
}
