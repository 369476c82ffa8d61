//! AI provider gateway: question generation, follow-ups, evaluation,
//! speech-to-text, and realtime session minting. Everything interview-aware
//! lives in the prompt builders; the client itself is a thin HTTP wrapper.

mod error;
mod openai;
mod prompts;
mod types;

use axum::async_trait;
use bytes::Bytes;

pub use error::ProviderError;
pub use openai::OpenAiClient;
pub use types::{Evaluation, GeneratedQuestion, QuestionPlan, SpokenExchange};

/// Seam between handlers and the model vendor, so tests can swap in a fake
/// without touching the network.
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Generate the interview's question set from the candidate profile.
    /// Malformed model output degrades to a fixed fallback set; transport
    /// and API failures surface as errors.
    async fn generate_questions(
        &self,
        plan: QuestionPlan<'_>,
    ) -> Result<Vec<GeneratedQuestion>, ProviderError>;

    /// One probing follow-up to a spoken answer.
    async fn generate_follow_up(
        &self,
        question_text: &str,
        first_transcript: &str,
    ) -> Result<String, ProviderError>;

    /// Score a spoken question/follow-up exchange. Malformed output degrades
    /// to a neutral evaluation.
    async fn evaluate_answer(
        &self,
        exchange: SpokenExchange<'_>,
    ) -> Result<Evaluation, ProviderError>;

    /// Score a submitted live-coding solution.
    async fn evaluate_code(
        &self,
        question_text: &str,
        code: &str,
        job_role: &str,
        experience_level: &str,
    ) -> Result<Evaluation, ProviderError>;

    /// Speech-to-text for a recorded answer.
    async fn transcribe(&self, audio: Bytes, filename: &str) -> Result<String, ProviderError>;

    /// Mint an ephemeral realtime voice session; the response is the
    /// provider's payload passed through verbatim.
    async fn create_realtime_session(
        &self,
        question_text: &str,
        job_role: &str,
        experience_level: &str,
    ) -> Result<serde_json::Value, ProviderError>;
}
