use anyhow::Context;
use axum::extract::Multipart;
use bytes::Bytes;
use uuid::Uuid;

use crate::ai::AiProvider;
use crate::storage::UploadStore;

/// Fields collected from an answer-upload request.
#[derive(Debug, Default)]
pub struct AnswerUpload {
    pub session_id: Option<Uuid>,
    pub question_id: Option<Uuid>,
    pub file: Option<(String, Bytes)>,
}

/// Drain an answer multipart body. The recording may arrive under any of the
/// given field names (clients disagree on the follow-up field); ids that fail
/// to parse are treated as absent.
pub async fn read_answer_multipart(
    mp: &mut Multipart,
    file_fields: &[&str],
) -> Result<AnswerUpload, String> {
    let mut upload = AnswerUpload::default();
    while let Some(field) = mp.next_field().await.map_err(|e| e.to_string())? {
        let Some(name) = field.name().map(|s| s.to_string()) else {
            continue;
        };
        if file_fields.contains(&name.as_str()) {
            let filename = field.file_name().unwrap_or("answer.webm").to_string();
            let body = field.bytes().await.map_err(|e| e.to_string())?;
            upload.file = Some((filename, body));
        } else {
            let value = field.text().await.map_err(|e| e.to_string())?;
            match name.as_str() {
                "session_id" => upload.session_id = Uuid::parse_str(value.trim()).ok(),
                "question_id" => upload.question_id = Uuid::parse_str(value.trim()).ok(),
                _ => {}
            }
        }
    }
    Ok(upload)
}

/// Read a recorded answer back from storage and turn it into text. An empty
/// transcript is an error: every downstream prompt needs actual words.
pub async fn transcribe_answer(
    storage: &dyn UploadStore,
    ai: &dyn AiProvider,
    answer_ref: &str,
) -> anyhow::Result<String> {
    let audio = storage
        .read(answer_ref)
        .await
        .with_context(|| format!("load recorded answer {answer_ref}"))?;
    let filename = answer_ref.rsplit('/').next().unwrap_or("answer.webm");
    let transcript = ai
        .transcribe(audio, filename)
        .await
        .context("transcribe recorded answer")?;
    let transcript = transcript.trim().to_string();
    anyhow::ensure!(!transcript.is_empty(), "transcription produced no text");
    Ok(transcript)
}
