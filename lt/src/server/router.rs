//! Router assembly and the serve loop

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderName, HeaderValue, header};
use axum::routing::{MethodRouter, get, post};
use eyre::{Context, Result};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use super::handlers;
use crate::gateway::{CoachGateway, Synthesizer, Transcriber};

/// Shared application state passed to handlers
#[derive(Clone)]
pub struct AppState {
    pub coach: Arc<CoachGateway>,
    pub transcriber: Arc<dyn Transcriber>,
    pub synthesizer: Arc<dyn Synthesizer>,
}

/// POST handler plus the OPTIONS preflight and a JSON 405 for the rest
fn endpoint<H, T>(handler: H) -> MethodRouter<AppState>
where
    H: axum::handler::Handler<T, AppState>,
    T: 'static,
{
    post(handler)
        .options(handlers::preflight)
        .fallback(handlers::method_not_allowed)
}

fn cors_header(name: HeaderName, value: &'static str) -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::overriding(name, HeaderValue::from_static(value))
}

/// Build the router with all routes and layers
///
/// Each endpoint answers under `/api/<name>` and `/.netlify/functions/<name>`.
pub fn build_router(state: AppState, max_body_bytes: usize) -> Router {
    debug!(max_body_bytes, "build_router: called");
    let mut router = Router::new().route("/health", get(handlers::health));

    for prefix in ["/api", "/.netlify/functions"] {
        router = router
            .route(&format!("{prefix}/ai-coach"), endpoint(handlers::ai_coach))
            .route(&format!("{prefix}/speech-to-text"), endpoint(handlers::speech_to_text))
            .route(&format!("{prefix}/text-to-speech"), endpoint(handlers::text_to_speech));
    }

    router
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors_header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"))
        .layer(cors_header(header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"))
        .layer(cors_header(header::ACCESS_CONTROL_ALLOW_METHODS, "POST, OPTIONS"))
}

/// Bind and serve until Ctrl-C
pub async fn serve(addr: SocketAddr, state: AppState, max_body_bytes: usize) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context(format!("Failed to bind {}", addr))?;
    let local_addr = listener.local_addr()?;
    info!(%local_addr, "lifetrack server listening");

    axum::serve(listener, build_router(state, max_body_bytes))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("lifetrack server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{GatewayError, SynthesizedAudio};
    use crate::llm::LlmError;
    use crate::llm::client::mock::MockLlmClient;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use std::sync::Mutex;
    use tower::ServiceExt;

    /// Speech stub answering from a fixed script
    struct StubSpeech {
        cold: bool,
        received: Mutex<Vec<Vec<u8>>>,
    }

    impl StubSpeech {
        fn new(cold: bool) -> Arc<Self> {
            Arc::new(Self {
                cold,
                received: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Transcriber for StubSpeech {
        async fn transcribe(&self, audio: Vec<u8>) -> Result<String, GatewayError> {
            self.received.lock().unwrap().push(audio);
            if self.cold {
                return Err(GatewayError::ServiceUnavailable {
                    estimated_time: Some(20.0),
                });
            }
            Ok("log my run".to_string())
        }
    }

    #[async_trait]
    impl Synthesizer for StubSpeech {
        async fn synthesize(&self, _text: &str) -> Result<SynthesizedAudio, GatewayError> {
            if self.cold {
                return Err(GatewayError::ServiceUnavailable { estimated_time: None });
            }
            Ok(SynthesizedAudio {
                bytes: b"RIFF".to_vec(),
                mime: "audio/wav".to_string(),
            })
        }
    }

    fn app_with(mock: MockLlmClient, speech: Arc<StubSpeech>) -> Router {
        let state = AppState {
            coach: Arc::new(CoachGateway::new(Arc::new(mock), 0.7, 1024)),
            transcriber: speech.clone(),
            synthesizer: speech,
        };
        build_router(state, 1024)
    }

    fn app() -> Router {
        app_with(MockLlmClient::with_texts(&["You got this!"]), StubSpeech::new(false))
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .header("content-length", body.len())
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn read_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn assert_cors(response: &axum::response::Response) {
        let headers = response.headers();
        assert_eq!(headers["access-control-allow-origin"], "*");
        assert_eq!(headers["access-control-allow-headers"], "Content-Type");
        assert_eq!(headers["access-control-allow-methods"], "POST, OPTIONS");
    }

    #[tokio::test]
    async fn test_ai_coach_success() {
        let body = r#"{"message":"How am I doing?","context":{"habits":[{"name":"Run","frequency":"daily","streak":3,"completed":true}],"totalHabits":1}}"#;
        let response = app().oneshot(post_json("/api/ai-coach", body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_cors(&response);
        assert_eq!(read_json(response).await, json!({"response": "You got this!"}));
    }

    #[tokio::test]
    async fn test_ai_coach_missing_message() {
        let response = app().oneshot(post_json("/api/ai-coach", "{}")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_cors(&response);
        assert_eq!(read_json(response).await, json!({"error": "Message is required"}));
    }

    #[tokio::test]
    async fn test_empty_body_is_empty_object() {
        let response = app().oneshot(post_json("/api/text-to-speech", "")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(read_json(response).await, json!({"error": "Text is required"}));
    }

    #[tokio::test]
    async fn test_invalid_json_is_bad_request() {
        let response = app().oneshot(post_json("/api/ai-coach", "{not json")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(read_json(response).await["error"], "Invalid JSON body");
    }

    #[tokio::test]
    async fn test_ai_coach_unknown_context_version() {
        let body = r#"{"message":"hi","context":{"version":9,"habits":[],"totalHabits":0}}"#;
        let response = app().oneshot(post_json("/api/ai-coach", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(read_json(response).await["error"], "Invalid context");
    }

    #[tokio::test]
    async fn test_ai_coach_upstream_failure() {
        let mock = MockLlmClient::new(vec![Err(LlmError::ApiError {
            status: 503,
            message: "over capacity".to_string(),
        })]);
        let response = app_with(mock, StubSpeech::new(false))
            .oneshot(post_json("/api/ai-coach", r#"{"message":"hi"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = read_json(response).await;
        assert_eq!(body["error"], "Failed to get AI response");
        assert!(body["details"].is_string());
    }

    #[tokio::test]
    async fn test_speech_to_text_success() {
        let speech = StubSpeech::new(false);
        let app = app_with(MockLlmClient::with_texts(&[]), speech.clone());
        let response = app
            .oneshot(post_json(
                "/api/speech-to-text",
                r#"{"audioData":"data:audio/webm;base64,UklGRg=="}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await, json!({"transcription": "log my run"}));
        assert_eq!(speech.received.lock().unwrap()[0], b"RIFF");
    }

    #[tokio::test]
    async fn test_speech_to_text_missing_and_bad_audio() {
        let response = app().oneshot(post_json("/api/speech-to-text", "{}")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(read_json(response).await, json!({"error": "Audio data is required"}));

        let response = app()
            .oneshot(post_json("/api/speech-to-text", r#"{"audioData":"%%%"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(read_json(response).await["error"], "Invalid audio data");
    }

    #[tokio::test]
    async fn test_speech_to_text_cold_start() {
        let app = app_with(MockLlmClient::with_texts(&[]), StubSpeech::new(true));
        let response = app
            .oneshot(post_json("/api/speech-to-text", r#"{"audioData":"UklGRg=="}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_cors(&response);
        assert_eq!(
            read_json(response).await,
            json!({"error": "Model is loading, please try again in a moment", "estimated_time": 20.0})
        );
    }

    #[tokio::test]
    async fn test_text_to_speech_success_and_cold_start() {
        let response = app()
            .oneshot(post_json("/api/text-to-speech", r#"{"text":"Great work"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            read_json(response).await,
            json!({"audioUrl": "data:audio/wav;base64,UklGRg=="})
        );

        let app = app_with(MockLlmClient::with_texts(&[]), StubSpeech::new(true));
        let response = app
            .oneshot(post_json("/api/text-to-speech", r#"{"text":"Great work"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(read_json(response).await["estimated_time"], Value::Null);
    }

    #[tokio::test]
    async fn test_options_preflight() {
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/api/text-to-speech")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_cors(&response);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn test_other_methods_not_allowed() {
        for method in ["GET", "PUT", "DELETE"] {
            let request = Request::builder()
                .method(method)
                .uri("/api/ai-coach")
                .body(Body::empty())
                .unwrap();
            let response = app().oneshot(request).await.unwrap();

            assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED, "{method}");
            assert_cors(&response);
            assert_eq!(read_json(response).await, json!({"error": "Method not allowed"}));
        }
    }

    #[tokio::test]
    async fn test_netlify_alias_and_health() {
        let response = app()
            .oneshot(post_json("/.netlify/functions/ai-coach", r#"{"message":"hi"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(read_json(response).await, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_body_limit() {
        let big = format!(r#"{{"text":"{}"}}"#, "a".repeat(4096));
        let response = app().oneshot(post_json("/api/text-to-speech", &big)).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
