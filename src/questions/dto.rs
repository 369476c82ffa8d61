use serde::Serialize;

use crate::questions::repo::InterviewQuestion;

/// Response for a successful generation run: the freshly persisted set.
#[derive(Debug, Serialize)]
pub struct GeneratedQuestionsResponse {
    pub questions: Vec<InterviewQuestion>,
    pub message: String,
}
