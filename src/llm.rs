//! HTTP client for the LLM provider's chat-completion and embedding
//! endpoints.
//!
//! The client performs exactly one outbound call per invocation and never
//! retries on its own; whether a failed call is worth paying for again is a
//! decision the calling service owns.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::{Error, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Explicit provider configuration, constructed once and passed in.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: String,
    pub chat_model: String,
    pub embed_model: String,
}

impl LlmConfig {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        chat_model: impl Into<String>,
        embed_model: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            api_key: api_key.into(),
            chat_model: chat_model.into(),
            embed_model: embed_model.into(),
        }
    }
}

/// The seam the services talk through. Tests substitute a scripted
/// implementation; production uses [`LlmClient`].
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// One chat completion round trip. With `expect_json` the provider is
    /// asked for a JSON object response.
    async fn complete(&self, prompt: &str, expect_json: bool) -> Result<String>;

    /// One embedding round trip. Returns a non-empty fixed-length vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

pub struct LlmClient {
    http: reqwest::Client,
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { http, config })
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        let url = format!("{}/{path}", self.config.base_url);
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        let raw = resp.text().await?;

        if !status.is_success() {
            tracing::error!("provider returned {status} from {path}");
            return Err(Error::Provider {
                status: status.as_u16(),
                body: raw,
            });
        }

        serde_json::from_str(&raw)
            .map_err(|e| Error::ProviderMalformed(format!("non-JSON body from {path}: {e}")))
    }
}

#[async_trait]
impl LanguageModel for LlmClient {
    async fn complete(&self, prompt: &str, expect_json: bool) -> Result<String> {
        let mut body = json!({
            "model": self.config.chat_model,
            "messages": [
                {"role": "system", "content": "You are a helpful assistant."},
                {"role": "user", "content": prompt}
            ],
        });
        if expect_json {
            body["response_format"] = json!({"type": "json_object"});
        }

        let outer = self.post("chat/completions", &body).await?;
        completion_content(&outer)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let body = json!({
            "model": self.config.embed_model,
            "input": text,
        });

        let outer = self.post("embeddings", &body).await?;
        embedding_vector(&outer)
    }
}

/// Pull `choices[0].message.content` (or the `text` fallback some providers
/// use) out of a chat-completion response.
fn completion_content(outer: &Value) -> Result<String> {
    let choices = outer
        .get("choices")
        .and_then(Value::as_array)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| Error::ProviderMalformed("response contains no choices".into()))?;

    let first = &choices[0];

    let content = first
        .pointer("/message/content")
        .and_then(Value::as_str)
        .or_else(|| first.get("message").and_then(Value::as_str))
        .or_else(|| first.get("text").and_then(Value::as_str))
        .unwrap_or_default();

    if content.trim().is_empty() {
        return Err(Error::ProviderMalformed("response content is empty".into()));
    }
    Ok(content.to_owned())
}

fn embedding_vector(outer: &Value) -> Result<Vec<f32>> {
    let embedding = outer
        .pointer("/data/0/embedding")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::ProviderMalformed("response contains no embedding".into()))?;

    let floats: Vec<f32> = embedding
        .iter()
        .filter_map(Value::as_f64)
        .map(|f| f as f32)
        .collect();

    if floats.is_empty() {
        return Err(Error::ProviderMalformed("embedding array is empty".into()));
    }
    Ok(floats)
}

/// Models occasionally wrap JSON in prose or code fences; take the outermost
/// `{..}` slice before giving up on a payload.
pub(crate) fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_content_reads_message_content() {
        let outer = json!({"choices": [{"message": {"content": "hello"}}]});
        assert_eq!(completion_content(&outer).unwrap(), "hello");
    }

    #[test]
    fn completion_content_falls_back_to_text() {
        let outer = json!({"choices": [{"text": "plain"}]});
        assert_eq!(completion_content(&outer).unwrap(), "plain");
    }

    #[test]
    fn completion_content_rejects_missing_choices() {
        for outer in [json!({}), json!({"choices": []})] {
            assert!(matches!(
                completion_content(&outer),
                Err(Error::ProviderMalformed(_))
            ));
        }
    }

    #[test]
    fn completion_content_rejects_blank_content() {
        let outer = json!({"choices": [{"message": {"content": "   "}}]});
        assert!(matches!(
            completion_content(&outer),
            Err(Error::ProviderMalformed(_))
        ));
    }

    #[test]
    fn embedding_vector_requires_nonempty_floats() {
        let outer = json!({"data": [{"embedding": [0.25, -1.5]}]});
        assert_eq!(embedding_vector(&outer).unwrap(), vec![0.25, -1.5]);

        let empty = json!({"data": [{"embedding": []}]});
        assert!(matches!(
            embedding_vector(&empty),
            Err(Error::ProviderMalformed(_))
        ));
    }

    #[test]
    fn extract_json_takes_outermost_braces() {
        assert_eq!(
            extract_json("Sure! ```json\n{\"a\": 1}\n```"),
            Some("{\"a\": 1}")
        );
        assert_eq!(extract_json("no json here"), None);
    }
}
