//! Ephemeral realtime-session minting for the live voice interview screen.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::Deserialize;
use tracing::{error, instrument};

use crate::state::AppState;

/// Client payload naming the question about to be practiced. Field names
/// follow the web client's camelCase.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeTokenRequest {
    pub question_text: String,
    pub job_role: String,
    pub experience_level: String,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/realtime-token", post(create_realtime_token))
}

#[instrument(skip(state, body))]
pub async fn create_realtime_token(
    State(state): State<AppState>,
    Json(body): Json<RealtimeTokenRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    // Returned verbatim; the payload carries the ephemeral client secret the
    // browser connects with.
    let payload = state
        .ai
        .create_realtime_session(&body.question_text, &body.job_role, &body.experience_level)
        .await
        .map_err(|e| {
            error!(error = %e, "realtime session creation failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;
    Ok(Json(payload))
}
