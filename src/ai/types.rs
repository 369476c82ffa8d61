use serde::{Deserialize, Serialize};

use crate::questions::QuestionKind;

/// Everything question generation needs to know about a session.
#[derive(Debug, Clone, Copy)]
pub struct QuestionPlan<'a> {
    pub job_role: &'a str,
    pub experience_level: &'a str,
    pub resume_text: &'a str,
    pub job_description: &'a str,
    pub count: u32,
    pub live_coding: bool,
}

/// A complete spoken exchange ready for scoring: both answers already
/// transcribed, plus the session context the evaluator prompt wants.
#[derive(Debug, Clone, Copy)]
pub struct SpokenExchange<'a> {
    pub question_text: &'a str,
    pub followup_question: &'a str,
    pub first_transcript: &'a str,
    pub followup_transcript: &'a str,
    pub job_role: &'a str,
    pub experience_level: &'a str,
}

/// One question as produced by the provider (or the fallback set), before it
/// is persisted. Field names follow the JSON shape the prompts demand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    #[serde(rename = "question_text")]
    pub text: String,
    #[serde(rename = "question_type")]
    pub kind: QuestionKind,
    #[serde(default)]
    pub tips: Vec<String>,
    #[serde(rename = "timeLimit", default)]
    pub time_limit_secs: Option<i32>,
    pub order_index: i32,
}

impl GeneratedQuestion {
    /// Time allotment to persist when the model omitted one: coding problems
    /// get a 15-minute slot, spoken questions two minutes.
    pub fn time_limit_or_default(&self) -> i32 {
        self.time_limit_secs.unwrap_or(match self.kind {
            QuestionKind::LiveCoding => 900,
            QuestionKind::Technical | QuestionKind::Behavioral => 120,
        })
    }
}

/// Scored feedback for one answered question slot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Evaluation {
    pub score: i32,
    pub feedback: String,
}

// -- chat-completions wire types --

#[derive(Debug, Serialize)]
pub(super) struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
pub(super) struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub(super) struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: &'static str,
}

#[derive(Debug, Deserialize)]
pub(super) struct ChatResponse {
    pub choices: Vec<ChatChoice>,
    pub usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ChatChoice {
    pub message: ChatReply,
}

#[derive(Debug, Deserialize)]
pub(super) struct ChatReply {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ChatUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Deserialize)]
pub(super) struct TranscriptionResponse {
    pub text: String,
}
