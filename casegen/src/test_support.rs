//! Test-only helpers: scripted backends, in-memory transcripts and temp
//! workspaces.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::stream;

use crate::backend::{BackendError, ChatBackend, ChatRequest, ChatResponse, DeltaStream};
use crate::io::transcript::{Phase, Transcript, TranscriptEvent};

/// An HTTP-status backend failure with an empty message.
pub fn status_error(status: u16) -> BackendError {
    BackendError::Status {
        status,
        message: String::new(),
    }
}

/// One scripted answer: how long the call takes and what it returns.
#[derive(Debug, Clone)]
pub struct ScriptedReply {
    pub delay: Duration,
    pub result: Result<String, BackendError>,
}

impl From<Result<String, BackendError>> for ScriptedReply {
    fn from(result: Result<String, BackendError>) -> Self {
        Self {
            delay: Duration::ZERO,
            result,
        }
    }
}

type Responder = Box<dyn Fn(&ChatRequest) -> ScriptedReply + Send + Sync>;

enum Script {
    Queue(Mutex<VecDeque<ScriptedReply>>),
    Responder(Responder),
}

/// Backend that answers from a script and records what it was asked.
///
/// Tracks the number of calls and the peak number of concurrent calls so
/// dispatch tests can check the admission gate.
pub struct ScriptedBackend {
    script: Script,
    fail_stream_after: Option<usize>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedBackend {
    /// Answer calls from `replies` in order.
    pub fn queue(replies: Vec<Result<String, BackendError>>) -> Self {
        Self::new(Script::Queue(Mutex::new(
            replies.into_iter().map(ScriptedReply::from).collect(),
        )))
    }

    /// Answer each call with `responder(request)`.
    pub fn from_fn<F>(responder: F) -> Self
    where
        F: Fn(&ChatRequest) -> ScriptedReply + Send + Sync + 'static,
    {
        Self::new(Script::Responder(Box::new(responder)))
    }

    /// Make streams fail with a transport error after `chunks` deltas.
    pub fn fail_stream_after(mut self, chunks: usize) -> Self {
        self.fail_stream_after = Some(chunks);
        self
    }

    fn new(script: Script) -> Self {
        Self {
            script,
            fail_stream_after: None,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    async fn answer(&self, request: &ChatRequest) -> Result<String, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .expect("requests lock")
            .push(request.clone());

        let reply = match &self.script {
            Script::Queue(queue) => queue
                .lock()
                .expect("queue lock")
                .pop_front()
                .unwrap_or_else(|| ScriptedReply {
                    delay: Duration::ZERO,
                    result: Err(status_error(400)),
                }),
            Script::Responder(responder) => responder(request),
        };

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !reply.delay.is_zero() {
            tokio::time::sleep(reply.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        reply.result
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, BackendError> {
        self.answer(request).await.map(ChatResponse::from_text)
    }

    async fn stream(&self, request: &ChatRequest) -> Result<DeltaStream, BackendError> {
        let text = self.answer(request).await?;
        let mut deltas: Vec<Result<String, BackendError>> = text
            .split_inclusive(char::is_whitespace)
            .map(|piece| Ok(piece.to_string()))
            .collect();
        if let Some(limit) = self.fail_stream_after {
            deltas.truncate(limit);
            deltas.push(Err(BackendError::Transport(
                "connection reset mid-stream".to_string(),
            )));
        }
        Ok(Box::pin(stream::iter(deltas)))
    }
}

/// Owned copy of a transcript event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedEvent {
    pub kind: String,
    pub phase: Phase,
    pub label: String,
    pub text: String,
}

/// Transcript that keeps every event in memory.
#[derive(Debug, Default)]
pub struct MemoryTranscript {
    events: Mutex<Vec<RecordedEvent>>,
}

impl MemoryTranscript {
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().expect("events lock").clone()
    }
}

impl Transcript for MemoryTranscript {
    fn record(&self, event: &TranscriptEvent<'_>) {
        let recorded = match event {
            TranscriptEvent::Prompt {
                phase,
                label,
                messages,
            } => RecordedEvent {
                kind: "prompt".to_string(),
                phase: *phase,
                label: label.to_string(),
                text: messages
                    .iter()
                    .map(|message| message.content.as_str())
                    .collect::<Vec<_>>()
                    .join("\n\n"),
            },
            TranscriptEvent::Delta { phase, text } => RecordedEvent {
                kind: "delta".to_string(),
                phase: *phase,
                label: String::new(),
                text: text.to_string(),
            },
            TranscriptEvent::Response { phase, label, text } => RecordedEvent {
                kind: "response".to_string(),
                phase: *phase,
                label: label.to_string(),
                text: text.to_string(),
            },
        };
        self.events.lock().expect("events lock").push(recorded);
    }
}

/// Temporary directory holding source files, spec files and outputs.
pub struct TestWorkspace {
    temp: tempfile::TempDir,
}

impl TestWorkspace {
    pub fn new() -> Result<Self> {
        let temp = tempfile::tempdir().context("create tempdir")?;
        Ok(Self { temp })
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    /// Write `contents` to `relative` inside the workspace.
    pub fn write(&self, relative: &str, contents: &str) -> Result<PathBuf> {
        let path = self.temp.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create directory {}", parent.display()))?;
        }
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
        Ok(path)
    }

    pub fn read(&self, relative: &str) -> Result<String> {
        let path = self.temp.path().join(relative);
        fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))
    }
}
