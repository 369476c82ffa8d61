//! Direct speech-to-text endpoint: base64 audio in, transcript out.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{error, instrument};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct VoiceToTextRequest {
    pub audio: String,
}

#[derive(Debug, Serialize)]
pub struct VoiceToTextResponse {
    pub text: String,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/voice-to-text", post(voice_to_text))
}

#[instrument(skip(state, body))]
pub async fn voice_to_text(
    State(state): State<AppState>,
    Json(body): Json<VoiceToTextRequest>,
) -> Result<Json<VoiceToTextResponse>, (StatusCode, String)> {
    let audio = body.audio.trim();
    if audio.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "No audio data provided".into()));
    }
    let audio = STANDARD.decode(audio).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            "Invalid base64 audio payload".to_string(),
        )
    })?;

    let text = state
        .ai
        .transcribe(Bytes::from(audio), "audio.webm")
        .await
        .map_err(|e| {
            error!(error = %e, "transcription failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    Ok(Json(VoiceToTextResponse { text }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_missing_and_invalid_payloads() {
        let state = AppState::fake();

        let err = voice_to_text(
            State(state.clone()),
            Json(VoiceToTextRequest { audio: "  ".into() }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);

        let err = voice_to_text(
            State(state),
            Json(VoiceToTextRequest {
                audio: "!!!not base64!!!".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn transcribes_a_valid_payload() {
        let state = AppState::fake();
        let audio = STANDARD.encode(b"some recorded words");
        let response = voice_to_text(State(state), Json(VoiceToTextRequest { audio }))
            .await
            .unwrap();
        assert!(!response.0.text.is_empty());
    }
}
