//! Language-model backends
//!
//! Every backend is reduced to "send a prompt, get text back". Failures are
//! reported as `DayplanError::Transport`; nothing is retried.

mod chat_completions;
mod gemini;

pub use chat_completions::ChatCompletionsGateway;
pub use gemini::GeminiGateway;

use crate::action::scanner::string_field;
use crate::{DayplanConfig, DayplanError, Provider, Result};
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use std::sync::{Arc, LazyLock};

/// Longest error detail or raw body carried into a message
const MAX_DETAIL_CHARS: usize = 500;

/// Sampling temperature sent to every backend
pub const TEMPERATURE: f32 = 0.7;

static THINK_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<think>.*?</think>").expect("static pattern"));

#[async_trait]
pub trait AiGateway: Send + Sync {
    /// Send `prompt` and return the model's text reply
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String>;

    /// One-line summary of the active backend
    fn describe(&self) -> String;
}

/// Build the backend selected in `config`
pub fn from_config(config: &DayplanConfig) -> Result<Arc<dyn AiGateway>> {
    let client = build_client(config)?;
    match config.provider {
        Provider::Gemini => {
            let api_key = config
                .gemini_api_key
                .clone()
                .filter(|key| !key.trim().is_empty())
                .ok_or_else(|| {
                    DayplanError::Config(
                        "Gemini selected but no API key configured (set GEMINI_API_KEY)"
                            .to_string(),
                    )
                })?;
            Ok(Arc::new(GeminiGateway::new(
                client,
                api_key,
                config.gemini_model.clone(),
            )))
        }
        Provider::LmStudio => Ok(Arc::new(ChatCompletionsGateway::new(
            client,
            config.lmstudio_url.clone(),
            config.lmstudio_model.clone(),
        ))),
    }
}

fn build_client(config: &DayplanConfig) -> Result<Client> {
    Client::builder()
        .connect_timeout(config.connect_timeout)
        .timeout(config.read_timeout)
        .build()
        .map_err(|e| DayplanError::Config(format!("failed to build HTTP client: {e}")))
}

/// Remove `<think>…</think>` reasoning blocks, including an unterminated
/// one at the start of the reply
pub fn strip_think_tags(content: &str) -> String {
    let stripped = THINK_BLOCK.replace_all(content, "");
    if stripped.trim_start().starts_with("<think>") {
        return String::new();
    }
    stripped.trim().to_string()
}

/// Error bodies from both backends. Gemini sends
/// `{"error":{"code":400,"message":"…","status":"INVALID_ARGUMENT"}}`;
/// LM Studio sends either `{"error":"…"}` or `{"error":{"message":"…"}}`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    Text(String),
    Detail {
        message: Option<String>,
        status: Option<String>,
    },
}

/// Reject a non-2xx reply from `backend` as a transport error
pub(crate) async fn check_response_status(
    backend: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = match error_reason(&body) {
        Some(reason) => format!(
            "{backend} returned {status}: {}",
            truncate_detail(&reason, MAX_DETAIL_CHARS)
        ),
        None => format!("{backend} returned {status}"),
    };
    Err(DayplanError::Transport(message))
}

/// Human-readable reason from an error body, `None` when the body is blank
fn error_reason(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) else {
        return Some(body.to_string());
    };
    let reason = match envelope.error {
        Some(ErrorBody::Text(text)) => Some(text),
        Some(ErrorBody::Detail {
            message: Some(message),
            status: Some(status),
        }) => Some(format!("{status}: {message}")),
        Some(ErrorBody::Detail { message, status }) => message.or(status),
        None => envelope.message,
    };
    reason.or_else(|| Some(body.to_string()))
}

pub(crate) fn truncate_detail(detail: &str, max_chars: usize) -> String {
    match detail.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}... [truncated]", &detail[..cut]),
        None => detail.to_string(),
    }
}

/// Gemini carries its key in the query string, so URLs never reach messages
pub(crate) fn map_reqwest_error(e: reqwest::Error) -> DayplanError {
    let kind = if e.is_timeout() {
        "timeout"
    } else if e.is_connect() {
        "network"
    } else if e.is_decode() || e.is_body() {
        "unreadable reply"
    } else {
        "request failed"
    };
    DayplanError::Transport(format!("{kind}: {}", e.without_url()))
}

/// Fallback when a reply body does not have the expected shape: mine the
/// first `content` or `text` field, else hand back the (truncated) body.
pub(crate) fn salvage_reply_text(body: &str) -> String {
    string_field(body, "content")
        .or_else(|| string_field(body, "text"))
        .unwrap_or_else(|| truncate_detail(body.trim(), MAX_DETAIL_CHARS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_strip_think_tags() {
        assert_eq!(
            strip_think_tags("<think>pondering\nmore</think>\n{\"action\":\"ADD\"}"),
            "{\"action\":\"ADD\"}"
        );
        assert_eq!(strip_think_tags("<think>never finished"), "");
        assert_eq!(strip_think_tags("  plain reply "), "plain reply");
    }

    #[test]
    fn test_error_reason_per_backend() {
        assert_eq!(
            error_reason(
                r#"{"error":{"code":400,"message":"API key not valid","status":"INVALID_ARGUMENT"}}"#
            )
            .as_deref(),
            Some("INVALID_ARGUMENT: API key not valid")
        );
        assert_eq!(
            error_reason(r#"{"error":{"message":"context length exceeded"}}"#).as_deref(),
            Some("context length exceeded")
        );
        assert_eq!(
            error_reason(r#"{"error":"model not loaded"}"#).as_deref(),
            Some("model not loaded")
        );
        assert_eq!(error_reason("  Bad Gateway ").as_deref(), Some("Bad Gateway"));
        assert_eq!(
            error_reason(r#"{"detail":"odd"}"#).as_deref(),
            Some(r#"{"detail":"odd"}"#)
        );
        assert_eq!(error_reason("   "), None);
    }

    #[test]
    fn test_truncate_detail() {
        assert_eq!(truncate_detail("short", 10), "short");
        assert_eq!(truncate_detail("abc", 3), "abc");
        assert_eq!(truncate_detail("abcdef", 3), "abc... [truncated]");
        assert_eq!(truncate_detail("d\u{e9}j\u{e0} vu", 2), "d\u{e9}... [truncated]");
    }

    #[test]
    fn test_salvage_reply_text() {
        assert_eq!(
            salvage_reply_text(r#"{"weird":{"content":"hello \"there\""}}"#),
            "hello \"there\""
        );
        assert_eq!(salvage_reply_text(r#"{"parts":[{"text":"hi"}]}"#), "hi");
        assert_eq!(salvage_reply_text("plain body"), "plain body");
    }

    #[test]
    fn test_gemini_requires_key() {
        let config = DayplanConfig::new(PathBuf::from("."));
        assert!(matches!(
            from_config(&config),
            Err(DayplanError::Config(_))
        ));

        let with_key = DayplanConfig::new(PathBuf::from(".")).with_gemini_api_key("k");
        let gateway = from_config(&with_key).unwrap();
        assert!(gateway.describe().contains("Gemini"));
    }

    #[test]
    fn test_lmstudio_selected() {
        let config = DayplanConfig::new(PathBuf::from("."))
            .with_provider(Provider::LmStudio)
            .with_lmstudio("http://localhost:1234/", "local-model");
        let gateway = from_config(&config).unwrap();
        assert_eq!(
            gateway.describe(),
            "Using LM Studio - URL: http://localhost:1234, Model: local-model"
        );
    }
}
