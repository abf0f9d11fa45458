use std::pin::Pin;
use std::time::Duration;

use async_stream::stream;
use futures_util::StreamExt;
use futures_util::stream::Stream;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::OpenAiError;
use super::sse::{Event, SseDecoder, parse_event};
use crate::core::AppConfig;

const COMPLETION_TIMEOUT: Duration = Duration::from_secs(60 * 10);
const STREAM_TIMEOUT: Duration = Duration::from_secs(60 * 5);

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub enum Role {
    #[serde(rename = "system")]
    System,
    #[serde(rename = "assistant")]
    Assistant,
    #[serde(rename = "user")]
    User,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: &str) -> Self {
        Message {
            role,
            content: content.to_string(),
        }
    }
}

/// Lazily evaluated reply fragments. Nothing is sent until the
/// stream is first polled and dropping it aborts the request.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, OpenAiError>> + Send>>;

/// Client for an OpenAI compatible API. Cheap to clone, the
/// underlying connection pool is shared.
#[derive(Clone, Debug)]
pub struct OpenAiClient {
    http: reqwest::Client,
    api_hostname: String,
    api_key: String,
    model: String,
    temperature: f64,
    pub(super) image_size: String,
}

impl OpenAiClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_hostname: config.openai_api_hostname.trim_end_matches('/').to_string(),
            api_key: config.openai_api_key.clone(),
            model: config.openai_model.clone(),
            temperature: config.temperature,
            image_size: config.image_size.clone(),
        }
    }

    pub(super) fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .post(format!("{}{}", self.api_hostname, path))
            .bearer_auth(&self.api_key)
    }

    /// Get the complete reply for the conversation in `messages`.
    pub async fn completion(&self, messages: &[Message]) -> Result<String, OpenAiError> {
        let payload = json!({
            "model": self.model,
            "messages": messages,
            "temperature": self.temperature,
        });
        let request = self
            .post("/v1/chat/completions")
            .timeout(COMPLETION_TIMEOUT)
            .json(&payload);
        let response: Value = send(request).await?.json().await?;

        response["choices"][0]["message"]["content"]
            .as_str()
            .map(String::from)
            .ok_or(OpenAiError::MissingContent)
    }

    /// Stream the reply for the conversation in `messages` one content
    /// delta at a time. Calling this again with the same messages
    /// starts a fresh request.
    pub fn completion_stream(&self, messages: &[Message]) -> FragmentStream {
        let payload = json!({
            "model": self.model,
            "messages": messages,
            "temperature": self.temperature,
            "stream": true,
        });
        let request = self
            .post("/v1/chat/completions")
            .timeout(STREAM_TIMEOUT)
            .json(&payload);

        Box::pin(stream! {
            let response = match send(request).await {
                Ok(response) => response,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };

            let mut body = response.bytes_stream();
            let mut decoder = SseDecoder::default();
            let mut ended = false;

            while !ended {
                let events = match body.next().await {
                    Some(chunk) => chunk
                        .map_err(OpenAiError::from)
                        .and_then(|bytes| decoder.push(&bytes)),
                    None => {
                        ended = true;
                        std::mem::take(&mut decoder).finish()
                    }
                };
                let events = match events {
                    Ok(events) => events,
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                };

                for data in events {
                    match parse_event(&data) {
                        Ok(Event::Fragment(fragment)) => {
                            yield Ok(fragment);
                        }
                        Ok(Event::Skip) => {}
                        Ok(Event::Done) => return,
                        Err(e) => {
                            yield Err(e);
                            return;
                        }
                    }
                }
            }

            tracing::debug!("Completion stream ended without [DONE]");
        })
    }
}

/// Send the request and turn non-2xx responses into an error.
pub(super) async fn send(
    request: reqwest::RequestBuilder,
) -> Result<reqwest::Response, OpenAiError> {
    let response = request.send().await?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(OpenAiError::from_body(status.as_u16(), &body))
}
