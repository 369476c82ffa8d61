use std::path::Path;
use std::time::Duration;

use axum::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use tracing::{debug, warn};

use crate::ai::error::ProviderError;
use crate::ai::prompts;
use crate::ai::types::{
    ChatMessage, ChatRequest, ChatResponse, Evaluation, GeneratedQuestion, QuestionPlan,
    ResponseFormat, SpokenExchange, TranscriptionResponse,
};
use crate::ai::AiProvider;
use crate::config::ProviderConfig;

/// Gateway to the OpenAI HTTP API: chat completions for generation and
/// scoring, Whisper for transcription, and the ephemeral realtime-session
/// endpoint. Holds no interview state.
#[derive(Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    config: ProviderConfig,
}

impl OpenAiClient {
    pub fn new(config: ProviderConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()?;
        Ok(Self { http, config })
    }

    /// One chat-completion round trip. Returns the trimmed assistant text.
    async fn chat(
        &self,
        system: &str,
        user: String,
        temperature: f64,
        json_mode: bool,
    ) -> Result<String, ProviderError> {
        let request = ChatRequest {
            model: self.config.chat_model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature,
            response_format: json_mode.then_some(ResponseFormat {
                kind: "json_object",
            }),
        };

        let response = self
            .http
            .post(format!("{}/v1/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unreadable provider error body".into());
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        if let Some(usage) = &parsed.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                "chat completion usage"
            );
        }

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(ProviderError::EmptyResponse)
    }
}

#[async_trait]
impl AiProvider for OpenAiClient {
    async fn generate_questions(
        &self,
        plan: QuestionPlan<'_>,
    ) -> Result<Vec<GeneratedQuestion>, ProviderError> {
        let prompt = if plan.live_coding {
            prompts::live_coding_prompt(
                plan.job_role,
                plan.experience_level,
                plan.resume_text,
                plan.job_description,
                plan.count,
            )
        } else {
            prompts::mixed_interview_prompt(
                plan.job_role,
                plan.experience_level,
                plan.resume_text,
                plan.job_description,
                plan.count,
            )
        };

        let raw = self.chat(prompts::QUESTION_SYSTEM, prompt, 0.7, false).await?;
        Ok(questions_or_fallback(&raw))
    }

    async fn generate_follow_up(
        &self,
        question_text: &str,
        first_transcript: &str,
    ) -> Result<String, ProviderError> {
        // No fallback here: an invented follow-up would be worse than an error.
        self.chat(
            prompts::INTERVIEWER_SYSTEM,
            prompts::follow_up_prompt(question_text, first_transcript),
            0.7,
            false,
        )
        .await
    }

    async fn evaluate_answer(
        &self,
        exchange: SpokenExchange<'_>,
    ) -> Result<Evaluation, ProviderError> {
        let raw = self
            .chat(
                prompts::EVALUATOR_SYSTEM,
                prompts::spoken_evaluation_prompt(&exchange),
                0.3,
                false,
            )
            .await?;
        Ok(evaluation_or_fallback(&raw))
    }

    async fn evaluate_code(
        &self,
        question_text: &str,
        code: &str,
        job_role: &str,
        experience_level: &str,
    ) -> Result<Evaluation, ProviderError> {
        let raw = self
            .chat(
                prompts::CODE_EVALUATOR_SYSTEM,
                prompts::code_evaluation_prompt(question_text, code, job_role, experience_level),
                0.3,
                true,
            )
            .await?;
        Ok(evaluation_or_fallback(&raw))
    }

    async fn transcribe(&self, audio: Bytes, filename: &str) -> Result<String, ProviderError> {
        let part = Part::bytes(audio.to_vec())
            .file_name(filename.to_string())
            .mime_str(audio_mime(filename))?;
        let form = Form::new()
            .part("file", part)
            .text("model", self.config.transcribe_model.clone());

        let response = self
            .http
            .post(format!("{}/v1/audio/transcriptions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unreadable provider error body".into());
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: TranscriptionResponse = response.json().await?;
        Ok(parsed.text)
    }

    async fn create_realtime_session(
        &self,
        question_text: &str,
        job_role: &str,
        experience_level: &str,
    ) -> Result<serde_json::Value, ProviderError> {
        let body = serde_json::json!({
            "model": self.config.realtime_model,
            "voice": self.config.realtime_voice,
            "instructions": prompts::realtime_instructions(question_text, job_role, experience_level),
        });

        let response = self
            .http
            .post(format!("{}/v1/realtime/sessions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unreadable provider error body".into());
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}

/// Models keep wrapping "raw JSON" in markdown fences despite the system
/// prompt. Strip a leading ```/```json and a trailing ``` before parsing.
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}

/// Parse the model's question array. Questions come back ordered by the
/// model's own `order_index`, then get renumbered 1..n so the unique
/// per-session index constraint can never trip on duplicate model output.
fn parse_questions(raw: &str) -> Result<Vec<GeneratedQuestion>, ProviderError> {
    let mut questions: Vec<GeneratedQuestion> = serde_json::from_str(strip_code_fences(raw))
        .map_err(|e| ProviderError::BadPayload(e.to_string()))?;

    questions.retain(|q| !q.text.trim().is_empty());
    if questions.is_empty() {
        return Err(ProviderError::BadPayload(
            "question array was empty".into(),
        ));
    }

    questions.sort_by_key(|q| q.order_index);
    for (i, q) in questions.iter_mut().enumerate() {
        q.order_index = (i + 1) as i32;
    }
    Ok(questions)
}

/// Degrade-not-fail: schema-violating question output is replaced by the
/// fixed five-question set instead of surfacing a parse error.
fn questions_or_fallback(raw: &str) -> Vec<GeneratedQuestion> {
    match parse_questions(raw) {
        Ok(questions) => questions,
        Err(e) => {
            warn!(error = %e, "question generation returned malformed output, using fallback set");
            prompts::fallback_questions()
        }
    }
}

#[derive(serde::Deserialize)]
struct RawEvaluation {
    score: f64,
    feedback: String,
}

fn clamp_score(raw: f64) -> i32 {
    raw.round().clamp(0.0, 10.0) as i32
}

fn parse_evaluation(raw: &str) -> Result<Evaluation, ProviderError> {
    let parsed: RawEvaluation = serde_json::from_str(strip_code_fences(raw))
        .map_err(|e| ProviderError::BadPayload(e.to_string()))?;
    let feedback = parsed.feedback.trim().to_string();
    if feedback.is_empty() {
        return Err(ProviderError::BadPayload("feedback was empty".into()));
    }
    Ok(Evaluation {
        score: clamp_score(parsed.score),
        feedback,
    })
}

/// Degrade-not-fail for scoring: a malformed evaluation becomes the neutral
/// canned one rather than a failed request.
fn evaluation_or_fallback(raw: &str) -> Evaluation {
    match parse_evaluation(raw) {
        Ok(evaluation) => evaluation,
        Err(e) => {
            warn!(error = %e, "evaluation returned malformed output, using neutral fallback");
            prompts::fallback_evaluation()
        }
    }
}

fn audio_mime(filename: &str) -> &'static str {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());
    match ext.as_deref() {
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("m4a") => "audio/mp4",
        Some("ogg") => "audio/ogg",
        // MediaRecorder's default container, and the safest guess.
        _ => "audio/webm",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::questions::QuestionKind;

    #[test]
    fn strips_json_fences() {
        assert_eq!(strip_code_fences("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fences("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("  [2]  "), "[2]");
    }

    #[test]
    fn parses_valid_question_array() {
        let raw = r#"[
            {"question_text": "What is ownership?", "question_type": "technical",
             "tips": ["Mention borrowing", "Mention moves"], "timeLimit": 120, "order_index": 1},
            {"question_text": "Tell me about a conflict.", "question_type": "behavioral",
             "tips": ["Use STAR"], "timeLimit": 180, "order_index": 2}
        ]"#;
        let qs = parse_questions(raw).unwrap();
        assert_eq!(qs.len(), 2);
        assert_eq!(qs[0].kind, QuestionKind::Technical);
        assert_eq!(qs[0].tips.len(), 2);
        assert_eq!(qs[1].time_limit_secs, Some(180));
    }

    #[test]
    fn renumbers_duplicate_and_unsorted_indexes() {
        let raw = r#"[
            {"question_text": "B", "question_type": "technical", "order_index": 7},
            {"question_text": "A", "question_type": "behavioral", "order_index": 2},
            {"question_text": "C", "question_type": "technical", "order_index": 7}
        ]"#;
        let qs = parse_questions(raw).unwrap();
        let indexes: Vec<i32> = qs.iter().map(|q| q.order_index).collect();
        assert_eq!(indexes, vec![1, 2, 3]);
        assert_eq!(qs[0].text, "A");
    }

    #[test]
    fn missing_tips_default_to_empty() {
        let raw = r#"[{"question_text": "Q", "question_type": "live_coding", "order_index": 1}]"#;
        let qs = parse_questions(raw).unwrap();
        assert!(qs[0].tips.is_empty());
        assert_eq!(qs[0].time_limit_or_default(), 900);
    }

    #[test]
    fn rejects_non_json_and_empty_arrays() {
        assert!(matches!(
            parse_questions("here are your questions: 1) ..."),
            Err(ProviderError::BadPayload(_))
        ));
        assert!(matches!(
            parse_questions("[]"),
            Err(ProviderError::BadPayload(_))
        ));
        assert!(matches!(
            parse_questions(r#"[{"question_text": "Q", "question_type": "trick", "order_index": 1}]"#),
            Err(ProviderError::BadPayload(_))
        ));
    }

    #[test]
    fn malformed_generation_falls_back_to_exactly_five() {
        let qs = questions_or_fallback("not json at all");
        assert_eq!(qs.len(), 5);
        assert!(qs
            .iter()
            .all(|q| matches!(q.kind, QuestionKind::Technical | QuestionKind::Behavioral)));
    }

    #[test]
    fn valid_generation_is_not_replaced() {
        let raw = r#"[{"question_text": "Q", "question_type": "technical", "order_index": 1}]"#;
        let qs = questions_or_fallback(raw);
        assert_eq!(qs.len(), 1);
        assert_eq!(qs[0].text, "Q");
    }

    #[test]
    fn parses_and_clamps_evaluation() {
        let e = parse_evaluation(r#"{"score": 8, "feedback": "<p>Good</p>"}"#).unwrap();
        assert_eq!(e.score, 8);

        let e = parse_evaluation(r#"{"score": 14, "feedback": "x"}"#).unwrap();
        assert_eq!(e.score, 10);

        let e = parse_evaluation(r#"{"score": -2, "feedback": "x"}"#).unwrap();
        assert_eq!(e.score, 0);

        let e = parse_evaluation(r#"{"score": 8.6, "feedback": "x"}"#).unwrap();
        assert_eq!(e.score, 9);
    }

    #[test]
    fn fenced_evaluation_still_parses() {
        let e = parse_evaluation("```json\n{\"score\": 7, \"feedback\": \"ok\"}\n```").unwrap();
        assert_eq!(e.score, 7);
    }

    #[test]
    fn empty_feedback_is_malformed() {
        assert!(parse_evaluation(r#"{"score": 5, "feedback": "   "}"#).is_err());
    }

    #[test]
    fn malformed_evaluation_falls_back_to_neutral() {
        let e = evaluation_or_fallback("I would rate this a solid 7 out of 10.");
        assert_eq!(e.score, 6);
        assert!(!e.feedback.is_empty());
    }

    #[test]
    fn audio_mime_by_extension() {
        assert_eq!(audio_mime("answer.webm"), "audio/webm");
        assert_eq!(audio_mime("answer.MP3"), "audio/mpeg");
        assert_eq!(audio_mime("answer.wav"), "audio/wav");
        assert_eq!(audio_mime("clip.m4a"), "audio/mp4");
        assert_eq!(audio_mime("no_extension"), "audio/webm");
    }
}
