//! Coach gateway: habit context plus the user's message to a chat model

use std::sync::Arc;

use tracing::{debug, warn};

use super::GatewayError;
use crate::config::ResolvedCoachConfig;
use crate::domain::CoachContext;
use crate::llm::{self, CompletionRequest, LlmClient, Message};

/// Reply used when the model returns no usable content
pub const FALLBACK_REPLY: &str = "I apologize, but I could not generate a response.";

/// Build the coach system instruction around an optional context snapshot
pub fn system_prompt(context: Option<&CoachContext>) -> String {
    let context = context
        .map(CoachContext::to_prompt_json)
        .unwrap_or_else(|| "No context available".to_string());

    format!(
        "You are an AI Life Coach helping users achieve their goals and transform their lives.\n\
         You have access to the user's current data:\n\
         {context}\n\
         \n\
         Provide personalized, actionable advice based on their goals, habits, exercise, diet, and progress.\n\
         Be encouraging, specific, and data-driven. Keep responses concise but meaningful."
    )
}

/// One round-trip to the coaching model
pub struct CoachGateway {
    client: Arc<dyn LlmClient>,
    temperature: f32,
    max_tokens: u32,
}

impl CoachGateway {
    pub fn new(client: Arc<dyn LlmClient>, temperature: f32, max_tokens: u32) -> Self {
        Self {
            client,
            temperature,
            max_tokens,
        }
    }

    /// Create a gateway backed by the configured OpenAI-compatible provider
    pub fn from_config(config: &ResolvedCoachConfig) -> Result<Self, GatewayError> {
        debug!(model = %config.model, "CoachGateway::from_config: called");
        let client = llm::create_client(config)?;
        Ok(Self::new(client, config.temperature, config.max_tokens))
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }

    /// Ask the coach, returning the first choice or the fallback reply
    pub async fn complete(&self, message: &str, context: Option<&CoachContext>) -> Result<String, GatewayError> {
        debug!(
            model = %self.client.model(),
            message_len = message.len(),
            has_context = context.is_some(),
            "CoachGateway::complete: called"
        );

        let request = CompletionRequest {
            system_prompt: system_prompt(context),
            messages: vec![Message::user(message)],
            max_tokens: self.max_tokens,
            temperature: Some(self.temperature),
        };

        let response = self.client.complete(request).await?;

        match response.content.filter(|c| !c.is_empty()) {
            Some(content) => {
                debug!(
                    content_len = content.len(),
                    tokens = response.usage.total(),
                    "CoachGateway::complete: got reply"
                );
                Ok(content)
            }
            None => {
                warn!("CoachGateway::complete: empty completion, using fallback reply");
                Ok(FALLBACK_REPLY.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CoachConfig;
    use crate::domain::{Frequency, Habit, HabitId};
    use crate::llm::LlmError;
    use crate::llm::client::mock::MockLlmClient;
    use crate::llm::{CompletionResponse, StopReason, TokenUsage};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn context() -> CoachContext {
        let mut run = Habit::new(HabitId::new(1, "Morning run"), "Morning run", Frequency::Daily);
        run.toggle();
        CoachContext::from_habits(&[run])
    }

    #[test]
    fn test_system_prompt_embeds_context() {
        let prompt = system_prompt(Some(&context()));
        assert!(prompt.starts_with("You are an AI Life Coach"));
        assert!(prompt.contains("\"totalHabits\": 1"));
        assert!(prompt.contains("Morning run"));
        assert!(prompt.ends_with("Keep responses concise but meaningful."));
    }

    #[test]
    fn test_system_prompt_without_context() {
        let prompt = system_prompt(None);
        assert!(prompt.contains("No context available"));
    }

    #[tokio::test]
    async fn test_complete_sends_system_and_user() {
        let mock = Arc::new(MockLlmClient::with_texts(&["Nice streak!"]));
        let gateway = CoachGateway::new(mock.clone(), 0.7, 1024);

        let reply = gateway.complete("How am I doing?", Some(&context())).await.unwrap();
        assert_eq!(reply, "Nice streak!");

        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].system_prompt.contains("Morning run"));
        assert_eq!(requests[0].messages, vec![Message::user("How am I doing?")]);
        assert_eq!(requests[0].max_tokens, 1024);
        assert_eq!(requests[0].temperature, Some(0.7));
    }

    #[tokio::test]
    async fn test_complete_null_content_falls_back() {
        let mock = Arc::new(MockLlmClient::new(vec![Ok(CompletionResponse {
            content: None,
            stop_reason: StopReason::EndTurn,
            usage: TokenUsage::default(),
        })]));
        let gateway = CoachGateway::new(mock, 0.7, 1024);

        assert_eq!(gateway.complete("hi", None).await.unwrap(), FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn test_complete_propagates_failure() {
        let mock = Arc::new(MockLlmClient::new(vec![Err(LlmError::ApiError {
            status: 500,
            message: "boom".to_string(),
        })]));
        let gateway = CoachGateway::new(mock, 0.7, 1024);

        let err = gateway.complete("hi", None).await.unwrap_err();
        assert!(matches!(err, GatewayError::Upstream { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_upstream_without_choices_falls_back() {
        for body in [
            serde_json::json!({"id": "chatcmpl-1"}),
            serde_json::json!({"id": "chatcmpl-2", "choices": null}),
        ] {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/v1/chat/completions"))
                .respond_with(ResponseTemplate::new(200).set_body_json(body))
                .mount(&server)
                .await;

            let config = CoachConfig {
                base_url: server.uri(),
                max_retries: 0,
                ..Default::default()
            }
            .resolve_with(|_| Some("test-key".to_string()))
            .unwrap();
            let gateway = CoachGateway::from_config(&config).unwrap();

            assert_eq!(gateway.complete("hello", None).await.unwrap(), FALLBACK_REPLY);
        }
    }
}
