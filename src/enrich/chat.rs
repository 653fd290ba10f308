use crate::config::EnrichmentConfig;
use crate::enrich::{EnrichmentError, Sentiment, SentimentClassifier};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    reasoning_content: Option<String>,
}

/// Sentiment classifier backed by an OpenAI-compatible chat completions API
pub struct ChatSentimentClassifier {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    prompt: String,
}

impl ChatSentimentClassifier {
    pub fn new(config: &EnrichmentConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            prompt: config.prompt.clone(),
        })
    }
}

#[async_trait]
impl SentimentClassifier for ChatSentimentClassifier {
    async fn classify(
        &self,
        comment: &str,
        post_text: &str,
    ) -> Result<Sentiment, EnrichmentError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: self.prompt.replace("{post}", post_text),
                },
                ChatMessage {
                    role: "user",
                    content: comment.to_string(),
                },
            ],
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

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
            return Err(EnrichmentError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply: ChatResponse = response.json().await?;
        let message = reply
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| EnrichmentError::MalformedReply("no choices in reply".to_string()))?;

        let content = message
            .content
            .ok_or_else(|| EnrichmentError::MalformedReply("empty message content".to_string()))?;

        Ok(Sentiment {
            value: parse_sentiment_value(&content)?,
            reasoning: message.reasoning_content,
        })
    }
}

/// Extracts the integer `value` field from a JSON verdict such as `{"Value": 1}`
///
/// Markdown code fences around the object are tolerated.
pub fn parse_sentiment_value(content: &str) -> Result<i64, EnrichmentError> {
    let trimmed = content.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    let json: serde_json::Value = serde_json::from_str(unfenced)
        .map_err(|e| EnrichmentError::MalformedReply(format!("{}: {}", e, unfenced)))?;

    json.as_object()
        .and_then(|object| {
            object
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case("value"))
                .and_then(|(_, value)| value.as_i64())
        })
        .ok_or_else(|| EnrichmentError::MalformedReply(format!("no integer value in {}", unfenced)))
}
