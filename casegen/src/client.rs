//! Generation client: prompts in, generated text out.
//!
//! Every operation renders its prompt, reports it to the transcript, calls the
//! backend and reports the answer. Unary calls (and opening a stream) get a
//! single retry after a fixed pause when the backend is rate limiting or
//! failing server-side; everything else is surfaced as is.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::backend::{BackendError, ChatBackend, ChatMessage, ChatRequest};
use crate::core::types::SpecItem;
use crate::io::config::CasegenConfig;
use crate::io::prompt::PromptEngine;
use crate::io::transcript::{Phase, Transcript, TranscriptEvent};

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("render prompt")]
    Prompt(#[from] minijinja::Error),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Request settings shared by every call.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientSettings {
    pub model: String,
    pub max_tokens: u32,
    pub retry_backoff: Duration,
    /// Appended to every user prompt.
    pub extra_instructions: Option<String>,
}

impl ClientSettings {
    pub fn from_config(cfg: &CasegenConfig, extra_instructions: Option<String>) -> Self {
        Self {
            model: cfg.model.clone(),
            max_tokens: cfg.effective_max_tokens(),
            retry_backoff: cfg.retry_backoff(),
            extra_instructions,
        }
    }
}

pub struct GenerationClient {
    backend: Arc<dyn ChatBackend>,
    transcript: Arc<dyn Transcript>,
    prompts: PromptEngine,
    settings: ClientSettings,
}

impl GenerationClient {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        transcript: Arc<dyn Transcript>,
        settings: ClientSettings,
    ) -> Result<Self, GenerationError> {
        let prompts = PromptEngine::new(settings.extra_instructions.clone())?;
        Ok(Self {
            backend,
            transcript,
            prompts,
            settings,
        })
    }

    /// Free-form description of what `subject` does (streamed).
    #[instrument(skip_all, fields(subject = %subject))]
    pub async fn generate_specification(
        &self,
        subject: &str,
        code: &str,
    ) -> Result<String, GenerationError> {
        let messages = self.prompts.specification(subject, code)?;
        self.streamed(Phase::Specification, subject, messages).await
    }

    /// Candidate test names covering `subject` (streamed).
    #[instrument(skip_all, fields(subject = %subject))]
    pub async fn generate_case_list(
        &self,
        subject: &str,
        code: &str,
        description: Option<&str>,
    ) -> Result<String, GenerationError> {
        let messages = self.prompts.case_list(subject, code, description)?;
        self.streamed(Phase::CaseList, subject, messages).await
    }

    /// Refine a case list into a YAML `cases:` document (streamed).
    #[instrument(skip_all, fields(subject = %subject))]
    pub async fn generate_cases(
        &self,
        subject: &str,
        code: &str,
        list: &str,
    ) -> Result<String, GenerationError> {
        let messages = self.prompts.cases(subject, code, list)?;
        self.streamed(Phase::Cases, subject, messages).await
    }

    /// Test code for one case (unary, deterministic sampling).
    #[instrument(skip_all, fields(case = %item.name))]
    pub async fn generate_code(
        &self,
        item: &SpecItem,
        subject: &str,
        code: &str,
        package: &str,
    ) -> Result<String, GenerationError> {
        let messages = self.prompts.code(item, subject, code, package)?;
        self.record_prompt(Phase::Code, &item.name, &messages);

        let mut request = self.request(messages);
        request.temperature = Some(0.0);
        request.top_p = Some(1.0);

        let text = self
            .with_single_retry(|| self.backend.complete(&request))
            .await?
            .into_content()?;
        self.record_response(Phase::Code, &item.name, &text);
        Ok(text)
    }

    fn request(&self, messages: Vec<ChatMessage>) -> ChatRequest {
        ChatRequest {
            model: self.settings.model.clone(),
            max_tokens: self.settings.max_tokens,
            temperature: None,
            top_p: None,
            messages,
        }
    }

    async fn streamed(
        &self,
        phase: Phase,
        label: &str,
        messages: Vec<ChatMessage>,
    ) -> Result<String, GenerationError> {
        self.record_prompt(phase, label, &messages);
        let request = self.request(messages);

        let mut deltas = self
            .with_single_retry(|| self.backend.stream(&request))
            .await?;
        let mut text = String::new();
        while let Some(delta) = deltas.next().await {
            let delta = delta?;
            self.transcript
                .record(&TranscriptEvent::Delta { phase, text: &delta });
            text.push_str(&delta);
        }

        info!(bytes = text.len(), "stream completed");
        self.record_response(phase, label, &text);
        Ok(text)
    }

    /// Run `call`; on a transient failure wait the backoff once and run it again.
    ///
    /// The second outcome is returned as is, whatever it is.
    async fn with_single_retry<T, F, Fut>(&self, mut call: F) -> Result<T, BackendError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, BackendError>>,
    {
        match call().await {
            Err(err) if err.is_transient() => {
                warn!(
                    status = ?err.status(),
                    backoff_secs = self.settings.retry_backoff.as_secs(),
                    "transient backend failure, retrying once"
                );
                tokio::time::sleep(self.settings.retry_backoff).await;
                call().await
            }
            outcome => outcome,
        }
    }

    fn record_prompt(&self, phase: Phase, label: &str, messages: &[ChatMessage]) {
        self.transcript.record(&TranscriptEvent::Prompt {
            phase,
            label,
            messages,
        });
    }

    fn record_response(&self, phase: Phase, label: &str, text: &str) {
        self.transcript
            .record(&TranscriptEvent::Response { phase, label, text });
    }
}
