//! OpenAI Chat Completions API provider.
//!
//! Also serves any endpoint speaking the same wire format.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use tracing::{debug, trace};

use crate::error::ParleyError;
use crate::types::*;
use crate::util::timeout::with_timeout;

use super::http::{bearer_headers, parse_sse_data, shared_client, status_to_error};
use super::{ModelProvider, ProviderRequest, ProviderResponse};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

pub struct OpenAiProvider {
    provider_name: String,
    model_id: String,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl OpenAiProvider {
    pub fn new(model_id: String, api_key: String, base_url: Option<String>) -> Self {
        Self {
            provider_name: "openai".to_string(),
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            model_id,
            api_key,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Deadline for establishing a response, for the whole body in atomic
    /// mode, and for each read while streaming.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Report a different provider name (for OpenAI-compatible hosts).
    pub fn with_provider_name(mut self, name: impl Into<String>) -> Self {
        self.provider_name = name.into();
        self
    }

    fn build_request_body(&self, request: &ProviderRequest, stream: bool) -> serde_json::Value {
        let messages = request
            .messages
            .iter()
            .map(|turn| {
                serde_json::json!({
                    "role": turn.role().to_string(),
                    "content": turn.text(),
                })
            })
            .collect::<Vec<_>>();

        let mut body = serde_json::json!({
            "model": self.model_id,
            "messages": messages,
            "stream": stream,
        });

        if let Some(obj) = body.as_object_mut() {
            let settings = &request.settings;
            if let Some(max) = settings.max_tokens {
                obj.insert("max_tokens".into(), max.into());
            }
            if let Some(temp) = settings.temperature {
                obj.insert("temperature".into(), temp.into());
            }
            if let Some(top_p) = settings.top_p {
                obj.insert("top_p".into(), top_p.into());
            }
            if let Some(ref stops) = settings.stop_sequences {
                obj.insert("stop".into(), serde_json::json!(stops));
            }
            if let Some(ref user) = settings.user {
                obj.insert("user".into(), user.clone().into());
            }
        }

        body
    }

    async fn send(
        &self,
        request: &ProviderRequest,
        stream: bool,
    ) -> Result<reqwest::Response, ParleyError> {
        let body = self.build_request_body(request, stream);
        let url = format!("{}/chat/completions", self.base_url);

        let resp = shared_client()
            .post(&url)
            .headers(bearer_headers(&self.api_key))
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }
        Ok(resp)
    }
}

#[async_trait]
impl ModelProvider for OpenAiProvider {
    fn provider_name(&self) -> &str {
        &self.provider_name
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn generate_text(
        &self,
        request: &ProviderRequest,
    ) -> Result<ProviderResponse, ParleyError> {
        debug!(model = %self.model_id, "generate_text");

        with_timeout(self.timeout, async {
            let resp = self.send(request, false).await?;
            let data: ChatResponse = resp.json().await?;
            let choice = data
                .choices
                .into_iter()
                .next()
                .ok_or_else(|| ParleyError::api(200, "No choices in response"))?;
            Ok::<_, ParleyError>(ProviderResponse {
                text: choice.message.content.unwrap_or_default(),
            })
        })
        .await
    }

    async fn stream_text(&self, request: &ProviderRequest) -> Result<FragmentStream, ParleyError> {
        debug!(model = %self.model_id, "stream_text");

        let resp = with_timeout(self.timeout, self.send(request, true)).await?;
        let byte_stream = resp.bytes_stream();
        let idle = self.timeout;

        let stream = async_stream::stream! {
            let mut buffer: Vec<u8> = Vec::new();
            futures::pin_mut!(byte_stream);

            loop {
                let next = with_timeout(idle, async { Ok(byte_stream.next().await) }).await;
                let chunk = match next {
                    Ok(Some(Ok(c))) => c,
                    Ok(None) => break,
                    Ok(Some(Err(e))) => {
                        yield Err(ParleyError::Network(e));
                        return;
                    }
                    Err(e) => {
                        debug!(error = %e, "stream stalled");
                        yield Err(e);
                        return;
                    }
                };

                buffer.extend_from_slice(&chunk);

                // Decode whole lines only; a chunk may end inside a character.
                while let Some(line_end) = buffer.iter().position(|b| *b == b'\n') {
                    let raw: Vec<u8> = buffer.drain(..=line_end).collect();
                    let line = match std::str::from_utf8(&raw) {
                        Ok(line) => line.trim(),
                        Err(e) => {
                            let message = format!("Invalid UTF-8 in event stream: {e}");
                            yield Err(ParleyError::Stream(message));
                            return;
                        }
                    };

                    if line.is_empty() || line.starts_with(':') {
                        continue;
                    }

                    let Some(data) = parse_sse_data(line) else {
                        continue;
                    };

                    if let Some(message) = stream_error_message(data) {
                        yield Err(ParleyError::Stream(message));
                        return;
                    }

                    match serde_json::from_str::<StreamChunk>(data) {
                        Ok(chunk) => {
                            if let Some(choice) = chunk.choices.into_iter().next() {
                                let text = choice.delta.content.unwrap_or_default();
                                yield Ok(StreamFragment::new(text));
                            }
                        }
                        Err(e) => trace!(error = %e, "skipping unparseable chunk"),
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

/// Hosts report mid-stream failures as `data: {"error": {...}}`.
fn stream_error_message(data: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(data).ok()?;
    let error = value.get("error")?;
    Some(
        error
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string()),
    )
}

// Wire types (internal)

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Deserialize)]
struct StreamDelta {
    content: Option<String>,
}
