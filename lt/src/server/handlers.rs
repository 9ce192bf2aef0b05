//! Route handlers for the three gateway endpoints

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, info};

use super::error::ApiError;
use super::router::AppState;
use crate::domain::CoachContext;
use crate::gateway::datauri;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CoachRequest {
    message: Option<String>,
    context: Option<CoachContext>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SpeechToTextRequest {
    audio_data: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TextToSpeechRequest {
    text: Option<String>,
}

/// Decode a JSON body; an empty body reads as `{}`
fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| ApiError::invalid("Invalid JSON body", e))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub async fn ai_coach(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>, ApiError> {
    debug!(body_len = body.len(), "ai_coach: called");
    let request: CoachRequest = parse_body(&body)?;
    let message = non_blank(request.message).ok_or_else(|| ApiError::required("Message"))?;

    if let Some(context) = &request.context {
        context
            .check_version()
            .map_err(|e| ApiError::invalid("Invalid context", e))?;
    }

    let response = state
        .coach
        .complete(&message, request.context.as_ref())
        .await
        .map_err(|e| ApiError::from_coach("Failed to get AI response", e))?;

    info!(response_len = response.len(), "ai_coach: answered");
    Ok(Json(json!({ "response": response })))
}

pub async fn speech_to_text(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>, ApiError> {
    debug!(body_len = body.len(), "speech_to_text: called");
    let request: SpeechToTextRequest = parse_body(&body)?;
    let audio_data = non_blank(request.audio_data).ok_or_else(|| ApiError::required("Audio data"))?;

    let audio = datauri::decode(&audio_data).map_err(|e| ApiError::invalid("Invalid audio data", e))?;
    if audio.is_empty() {
        return Err(ApiError::required("Audio data"));
    }

    let transcription = state
        .transcriber
        .transcribe(audio)
        .await
        .map_err(|e| ApiError::from_speech("Failed to transcribe audio", e))?;

    info!(text_len = transcription.len(), "speech_to_text: transcribed");
    Ok(Json(json!({ "transcription": transcription })))
}

pub async fn text_to_speech(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>, ApiError> {
    debug!(body_len = body.len(), "text_to_speech: called");
    let request: TextToSpeechRequest = parse_body(&body)?;
    let text = non_blank(request.text).ok_or_else(|| ApiError::required("Text"))?;

    let audio = state
        .synthesizer
        .synthesize(&text)
        .await
        .map_err(|e| ApiError::from_speech("Failed to generate speech", e))?;

    info!(audio_len = audio.bytes.len(), mime = %audio.mime, "text_to_speech: synthesized");
    Ok(Json(json!({ "audioUrl": audio.to_data_uri() })))
}

pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

pub async fn not_found() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" })))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
