//! HTTP backend for OpenAI-compatible `/chat/completions` endpoints.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::backend::types::{ChatChunk, ChatRequest, ChatResponse};
use crate::backend::{BackendError, ChatBackend, DeltaStream};

/// Chat backend that talks to an OpenAI-compatible HTTP API.
pub struct OpenAiBackend {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

/// Request body with the streaming flag set.
#[derive(Serialize)]
struct StreamingRequest<'a> {
    #[serde(flatten)]
    request: &'a ChatRequest,
    stream: bool,
}

impl OpenAiBackend {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| BackendError::Transport(err.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        body: &B,
    ) -> Result<reqwest::Response, BackendError> {
        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|err| BackendError::Transport(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let raw = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), "backend request failed");
        Err(BackendError::Status {
            status: status.as_u16(),
            message: api_error_message(&raw),
        })
    }
}

#[async_trait]
impl ChatBackend for OpenAiBackend {
    #[instrument(skip_all, fields(model = %request.model))]
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, BackendError> {
        let response = self.post(request).await?;
        let parsed = response
            .json::<ChatResponse>()
            .await
            .map_err(|err| BackendError::Decode(err.to_string()))?;
        debug!(choices = parsed.choices.len(), "completion received");
        Ok(parsed)
    }

    #[instrument(skip_all, fields(model = %request.model))]
    async fn stream(&self, request: &ChatRequest) -> Result<DeltaStream, BackendError> {
        let response = self
            .post(&StreamingRequest {
                request,
                stream: true,
            })
            .await?;
        let mut bytes = response.bytes_stream();

        let deltas = async_stream::try_stream! {
            let mut decoder = SseDecoder::default();
            'read: while let Some(chunk) = bytes.next().await {
                let chunk = chunk.map_err(|err| BackendError::Transport(err.to_string()))?;
                for data in decoder.push(&chunk) {
                    match parse_event(&data)? {
                        StreamEvent::Done => break 'read,
                        StreamEvent::Delta(text) => yield text,
                    }
                }
            }
        };
        Ok(Box::pin(deltas))
    }
}

/// Extract `error.message` from an API error body, falling back to the raw body.
fn api_error_message(raw: &str) -> String {
    serde_json::from_str::<serde_json::Value>(raw)
        .ok()
        .and_then(|value| {
            value
                .pointer("/error/message")
                .and_then(|message| message.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| raw.trim().to_string())
}

#[derive(Debug, PartialEq, Eq)]
enum StreamEvent {
    Delta(String),
    Done,
}

fn parse_event(data: &str) -> Result<StreamEvent, BackendError> {
    if data == "[DONE]" {
        return Ok(StreamEvent::Done);
    }
    let mut chunk: ChatChunk = serde_json::from_str(data)
        .map_err(|err| BackendError::Decode(format!("stream event {data:?}: {err}")))?;
    if let Some(error) = chunk.error.take() {
        return Err(BackendError::Stream(match error.kind {
            Some(kind) => format!("{kind}: {}", error.message),
            None => error.message,
        }));
    }
    Ok(StreamEvent::Delta(chunk.into_delta()))
}

/// Splits a server-sent event byte stream into `data:` payloads.
///
/// Bytes are buffered until a full line is available so multi-byte characters
/// split across network chunks decode correctly.
#[derive(Debug, Default)]
struct SseDecoder {
    buf: Vec<u8>,
}

impl SseDecoder {
    fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);
        let mut payloads = Vec::new();
        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\r', '\n']);
            if let Some(data) = line.strip_prefix("data:") {
                let data = data.trim_start();
                if !data.is_empty() {
                    payloads.push(data.to_string());
                }
            }
        }
        payloads
    }
}
