use crate::error::AppError;
use crate::state::AppState;
use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use serde::Serialize;

use types::envelope::Envelope;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub processed: bool,
    pub channel: String,
    pub message_number: u64,
}

/// POST /messages
///
/// Accepts one message envelope. The body is decoded strictly (unknown
/// fields are an error) and validated before it reaches the engine; both
/// failures are 400s. A message the engine discards as a duplicate, stale,
/// or post-explosion no-op is still a 202 — just with `processed: false`.
pub async fn submit_message(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<SubmitResponse>), AppError> {
    // Decoding by hand keeps malformed payloads on the 400 path with a
    // readable message.
    let envelope: Envelope = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid request payload: {e}")))?;

    let message = envelope
        .into_message()
        .map_err(|e| AppError::BadRequest(format!("Invalid message format: {e}")))?;

    let channel = message.channel.clone();
    let message_number = message.number;

    let outcome = state.repository.submit(message).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitResponse {
            processed: outcome.is_accepted(),
            channel,
            message_number,
        }),
    ))
}
