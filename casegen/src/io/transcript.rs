//! Prompt/response transcript for auditing what was sent to the backend.
//!
//! The generation client reports every prompt, streamed delta and final
//! response to an injected [`Transcript`]. The CLI appends them to a JSON-lines
//! file; tests capture them in memory.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::warn;

use crate::backend::ChatMessage;

/// Which generation step produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Specification,
    CaseList,
    Cases,
    Code,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TranscriptEvent<'a> {
    Prompt {
        phase: Phase,
        label: &'a str,
        messages: &'a [ChatMessage],
    },
    Delta {
        phase: Phase,
        text: &'a str,
    },
    Response {
        phase: Phase,
        label: &'a str,
        text: &'a str,
    },
}

/// Observer for backend traffic.
pub trait Transcript: Send + Sync {
    fn record(&self, event: &TranscriptEvent<'_>);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTranscript;

impl Transcript for NullTranscript {
    fn record(&self, _event: &TranscriptEvent<'_>) {}
}

/// Appends prompts and responses to a JSON-lines file.
///
/// Streamed deltas are not persisted (the final response is); with `echo`
/// set they are printed to stdout as they arrive.
pub struct FileTranscript {
    file: Mutex<File>,
    echo: bool,
}

impl FileTranscript {
    pub fn open(path: &Path, echo: bool) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("open transcript {}", path.display()))?;
        Ok(Self {
            file: Mutex::new(file),
            echo,
        })
    }

    fn append(&self, event: &TranscriptEvent<'_>) -> Result<()> {
        let mut line = serde_json::to_string(event).context("serialize transcript event")?;
        line.push('\n');
        let mut file = self
            .file
            .lock()
            .map_err(|_| anyhow::anyhow!("transcript lock poisoned"))?;
        file.write_all(line.as_bytes()).context("append transcript")?;
        Ok(())
    }
}

impl Transcript for FileTranscript {
    fn record(&self, event: &TranscriptEvent<'_>) {
        if let TranscriptEvent::Delta { text, .. } = event {
            if self.echo {
                let mut stdout = std::io::stdout().lock();
                let _ = stdout.write_all(text.as_bytes());
                let _ = stdout.flush();
            }
            return;
        }
        if let Err(err) = self.append(event) {
            warn!(error = %err, "failed to record transcript event");
        }
    }
}
