//! OpenAI-compatible chat completions backend (LM Studio and similar local servers)

use super::{
    check_response_status, map_reqwest_error, salvage_reply_text, strip_think_tags, AiGateway,
    TEMPERATURE,
};
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

pub struct ChatCompletionsGateway {
    client: Client,
    base_url: String,
    model: String,
}

impl ChatCompletionsGateway {
    pub fn new(client: Client, base_url: String, model: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    fn reply_text(body: &str) -> Option<String> {
        let parsed: ChatResponse = serde_json::from_str(body).ok()?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
    }
}

#[async_trait]
impl AiGateway for ChatCompletionsGateway {
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        debug!(
            "Calling {} ({}) with prompt length {}",
            self.base_url,
            self.model,
            prompt.len()
        );
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: TEMPERATURE,
            max_tokens,
            stream: false,
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = check_response_status("LM Studio", response).await?;
        let body = response.text().await.map_err(map_reqwest_error)?;
        debug!("Chat completions raw reply: {}", body);

        let text = Self::reply_text(&body).unwrap_or_else(|| salvage_reply_text(&body));
        Ok(strip_think_tags(&text))
    }

    fn describe(&self) -> String {
        format!("Using LM Studio - URL: {}, Model: {}", self.base_url, self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let request = ChatRequest {
            model: "google/gemma-3-4b",
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: "hi".to_string(),
            }],
            temperature: TEMPERATURE,
            max_tokens: 500,
            stream: false,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["max_tokens"], 500);
        assert_eq!(value["stream"], false);
    }

    #[test]
    fn test_reply_text() {
        let body = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"<think>hm</think>ok"}}]}"#;
        let text = ChatCompletionsGateway::reply_text(body).unwrap();
        assert_eq!(strip_think_tags(&text), "ok");
        assert_eq!(ChatCompletionsGateway::reply_text(r#"{"error":"x"}"#), None);
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let gateway = ChatCompletionsGateway::new(
            Client::new(),
            "http://127.0.0.1:1234/".to_string(),
            "m".to_string(),
        );
        assert_eq!(gateway.endpoint(), "http://127.0.0.1:1234/v1/chat/completions");
    }
}
