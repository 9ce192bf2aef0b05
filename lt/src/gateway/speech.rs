//! Speech gateways: transcription and synthesis over a Hugging Face style
//! inference API

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{GatewayError, datauri};
use crate::config::ResolvedSpeechConfig;

/// Wait used when a cold-start 503 carries no estimate
pub const DEFAULT_COLD_START_ESTIMATE: Duration = Duration::from_secs(20);

const DEFAULT_AUDIO_MIME: &str = "audio/wav";

/// Audio returned by a synthesis call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedAudio {
    pub bytes: Vec<u8>,
    pub mime: String,
}

impl SynthesizedAudio {
    pub fn to_data_uri(&self) -> String {
        datauri::encode(&self.mime, &self.bytes)
    }
}

/// Speech-to-text seam
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: Vec<u8>) -> Result<String, GatewayError>;
}

/// Text-to-speech seam
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<SynthesizedAudio, GatewayError>;
}

/// Client for `{base}/models/{model}` inference endpoints
pub struct HuggingFaceClient {
    http: Client,
    api_key: String,
    base_url: String,
    transcription_model: String,
    synthesis_model: String,
    audio_content_type: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct TranscriptionBody {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoadingBody {
    #[serde(default)]
    estimated_time: Option<f64>,
}

impl HuggingFaceClient {
    /// Create a new client from resolved configuration
    pub fn from_config(config: &ResolvedSpeechConfig) -> Result<Self, GatewayError> {
        debug!(?config, "HuggingFaceClient::from_config: called");
        let timeout = config.timeout();
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            transcription_model: config.transcription_model.clone(),
            synthesis_model: config.synthesis_model.clone(),
            audio_content_type: config.audio_content_type.clone(),
            timeout,
        })
    }

    fn model_url(&self, model: &str) -> String {
        format!("{}/models/{}", self.base_url, model)
    }

    /// Map non-2xx responses onto the gateway taxonomy
    async fn check_status(response: Response) -> Result<Response, GatewayError> {
        let status = response.status().as_u16();
        if response.status().is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        if status == 503 {
            let estimated_time = serde_json::from_str::<LoadingBody>(&text)
                .ok()
                .and_then(|b| b.estimated_time);
            info!(?estimated_time, "check_status: model is loading");
            return Err(GatewayError::ServiceUnavailable { estimated_time });
        }

        debug!(status, "check_status: upstream error");
        Err(GatewayError::Upstream { status, message: text })
    }
}

#[async_trait]
impl Transcriber for HuggingFaceClient {
    async fn transcribe(&self, audio: Vec<u8>) -> Result<String, GatewayError> {
        debug!(model = %self.transcription_model, audio_len = audio.len(), "transcribe: called");
        let response = self
            .http
            .post(self.model_url(&self.transcription_model))
            .bearer_auth(&self.api_key)
            .header("content-type", &self.audio_content_type)
            .body(audio)
            .send()
            .await
            .map_err(|e| GatewayError::from_reqwest(e, self.timeout))?;

        let response = Self::check_status(response).await?;
        let text = response
            .text()
            .await
            .map_err(|e| GatewayError::from_reqwest(e, self.timeout))?;
        let body: TranscriptionBody =
            serde_json::from_str(&text).map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        let transcription = body.text.unwrap_or_default();
        debug!(text_len = transcription.len(), "transcribe: done");
        Ok(transcription)
    }
}

#[async_trait]
impl Synthesizer for HuggingFaceClient {
    async fn synthesize(&self, text: &str) -> Result<SynthesizedAudio, GatewayError> {
        debug!(model = %self.synthesis_model, text_len = text.len(), "synthesize: called");
        let response = self
            .http
            .post(self.model_url(&self.synthesis_model))
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({ "inputs": text }))
            .send()
            .await
            .map_err(|e| GatewayError::from_reqwest(e, self.timeout))?;

        let response = Self::check_status(response).await?;
        let mime = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
            .filter(|v| v.starts_with("audio/"))
            .unwrap_or_else(|| DEFAULT_AUDIO_MIME.to_string());

        let bytes = response
            .bytes()
            .await
            .map_err(|e| GatewayError::from_reqwest(e, self.timeout))?;

        debug!(audio_len = bytes.len(), %mime, "synthesize: done");
        Ok(SynthesizedAudio {
            bytes: bytes.to_vec(),
            mime,
        })
    }
}

/// Run `op`, sleeping out cold starts and retrying up to `retries` times
///
/// Each wait is the upstream estimate (or the default) capped at `max_wait`.
/// Any other error is returned immediately.
pub async fn retry_cold_start<T, F, Fut>(mut op: F, retries: u32, max_wait: Duration) -> Result<T, GatewayError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GatewayError>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Err(GatewayError::ServiceUnavailable { estimated_time }) if attempt < retries => {
                attempt += 1;
                let wait = estimated_time
                    .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
                    .unwrap_or(DEFAULT_COLD_START_ESTIMATE)
                    .min(max_wait);
                warn!(
                    attempt,
                    retries,
                    wait_ms = wait.as_millis() as u64,
                    "retry_cold_start: model loading, waiting"
                );
                tokio::time::sleep(wait).await;
            }
            other => return other,
        }
    }
}
