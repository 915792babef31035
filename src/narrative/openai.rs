//! OpenAI-compatible chat completions backend.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{NarrativeError, NarrativeService, Prompt};
use crate::config::NarrativeConfig;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Chat-completions client.
pub struct OpenAiNarrator {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAiNarrator {
    pub fn new(config: &NarrativeConfig, api_key: String) -> Result<Self, NarrativeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait::async_trait]
impl NarrativeService for OpenAiNarrator {
    async fn complete(&self, prompt: &Prompt) -> Result<String, NarrativeError> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage { role: "system", content: &prompt.system },
                ChatMessage { role: "user", content: &prompt.user },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        debug!(endpoint = %self.endpoint, model = %self.model, "requesting completion");
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NarrativeError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| NarrativeError::Malformed(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| NarrativeError::Malformed("response has no message content".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    async fn spawn(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/v1", addr)
    }

    fn narrator(base_url: String) -> OpenAiNarrator {
        let config = NarrativeConfig {
            base_url,
            timeout_secs: 5,
            ..NarrativeConfig::default()
        };
        OpenAiNarrator::new(&config, "sk-test".to_string()).unwrap()
    }

    fn prompt() -> Prompt {
        Prompt {
            system: "sys".into(),
            user: "explain".into(),
        }
    }

    #[tokio::test]
    async fn test_completion_round_trip() {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                assert_eq!(headers["authorization"], "Bearer sk-test");
                assert_eq!(body["model"], "gpt-4o-mini");
                assert_eq!(body["max_tokens"], 200);
                assert_eq!(body["messages"][0]["role"], "system");
                assert_eq!(body["messages"][1]["content"], "explain");
                Json(json!({
                    "choices": [{ "message": { "role": "assistant", "content": "  **Issue**: Bearing wear\n" } }]
                }))
            }),
        );
        let text = narrator(spawn(app).await).complete(&prompt()).await.unwrap();
        assert_eq!(text, "**Issue**: Bearing wear");
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(|| async { (StatusCode::UNAUTHORIZED, "bad key") }),
        );
        let err = narrator(spawn(app).await).complete(&prompt()).await.unwrap_err();
        assert!(matches!(err, NarrativeError::Status { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_empty_choices_are_malformed() {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(|| async { Json(json!({ "choices": [] })) }),
        );
        let err = narrator(spawn(app).await).complete(&prompt()).await.unwrap_err();
        assert!(matches!(err, NarrativeError::Malformed(_)));
    }
}
