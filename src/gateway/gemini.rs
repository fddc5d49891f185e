//! Google Gemini `generateContent` backend

use super::{
    check_response_status, map_reqwest_error, salvage_reply_text, strip_think_tags, AiGateway,
    TEMPERATURE,
};
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

pub struct GeminiGateway {
    client: Client,
    api_key: String,
    model: String,
}

impl GeminiGateway {
    pub fn new(client: Client, api_key: String, model: String) -> Self {
        Self {
            client,
            api_key,
            model,
        }
    }

    fn endpoint(&self) -> String {
        format!("{API_BASE}/{}:generateContent", self.model)
    }

    /// Concatenated text of the first candidate, if the body has that shape
    fn reply_text(body: &str) -> Option<String> {
        let parsed: GenerateResponse = serde_json::from_str(body).ok()?;
        let content = parsed.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().map(|part| part.text).collect();
        (!text.is_empty()).then_some(text)
    }
}

#[async_trait]
impl AiGateway for GeminiGateway {
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        debug!(
            "Calling Gemini {} with prompt length {}",
            self.model,
            prompt.len()
        );
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                max_output_tokens: max_tokens,
            },
        };

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = check_response_status("Gemini", response).await?;
        let body = response.text().await.map_err(map_reqwest_error)?;
        debug!("Gemini raw reply: {}", body);

        let text = Self::reply_text(&body).unwrap_or_else(|| salvage_reply_text(&body));
        Ok(strip_think_tags(&text))
    }

    fn describe(&self) -> String {
        format!("Using Gemini API - Model: {}", self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![RequestPart { text: "hello" }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                max_output_tokens: 300,
            },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(value["generationConfig"]["maxOutputTokens"], 300);
    }

    #[test]
    fn test_reply_text_joins_parts() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"{\"action\":"},{"text":"\"ADD\"}"}],"role":"model"}}]}"#;
        assert_eq!(
            GeminiGateway::reply_text(body).as_deref(),
            Some("{\"action\":\"ADD\"}")
        );
        assert_eq!(GeminiGateway::reply_text(r#"{"candidates":[]}"#), None);
    }

    #[test]
    fn test_endpoint() {
        let gateway = GeminiGateway::new(Client::new(), "k".into(), "gemini-2.5-flash-lite".into());
        assert_eq!(
            gateway.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash-lite:generateContent"
        );
    }
}
