//! Chat-completion backend abstraction.
//!
//! The [`ChatBackend`] trait decouples generation from the HTTP API that
//! actually serves completions. Tests use scripted backends that return
//! predetermined answers without touching the network.

use async_trait::async_trait;
use futures::stream::BoxStream;

pub mod error;
pub mod openai;
pub mod types;

pub use error::BackendError;
pub use types::{ChatMessage, ChatRequest, ChatResponse, Role};

/// Incremental text deltas of a streamed completion, in arrival order.
pub type DeltaStream = BoxStream<'static, Result<String, BackendError>>;

/// Abstraction over chat-completion backends.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Run a unary completion.
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, BackendError>;

    /// Open a streamed completion. The stream ends when the backend signals
    /// completion.
    async fn stream(&self, request: &ChatRequest) -> Result<DeltaStream, BackendError>;
}
