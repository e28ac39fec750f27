//! Wire types for the chat-completion protocol.

use serde::{Deserialize, Serialize};

use crate::backend::error::BackendError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    pub messages: Vec<ChatMessage>,
}

/// Unary completion response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatResponse {
    /// Wrap `text` as a single-choice response.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            choices: vec![Choice {
                message: ChoiceMessage {
                    content: Some(text.into()),
                },
            }],
        }
    }

    /// Content of the first choice.
    pub fn into_content(self) -> Result<String, BackendError> {
        self.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or_else(|| BackendError::Decode("response has no choices".to_string()))
    }
}

/// One server-sent event of a streamed completion.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
    /// Set when the server reports a failure after the response has started.
    #[serde(default)]
    pub error: Option<ApiErrorBody>,
}

/// `error` object of an OpenAI-compatible error payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: ChunkDelta,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkDelta {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatChunk {
    pub fn into_delta(self) -> String {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_omits_unset_sampling_fields() {
        let request = ChatRequest {
            model: "gpt-4".to_string(),
            max_tokens: 16,
            temperature: None,
            top_p: None,
            messages: vec![ChatMessage::user("hi")],
        };
        let json = serde_json::to_value(&request).expect("serialize");
        assert!(json.get("temperature").is_none());
        assert_eq!(json["messages"][0]["role"], "user");
    }

    #[test]
    fn empty_choices_is_a_decode_error() {
        let err = ChatResponse::default().into_content().unwrap_err();
        assert!(matches!(err, BackendError::Decode(_)));
    }

    #[test]
    fn reads_first_choice_content() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"func A(){}"}}]}"#;
        let response: ChatResponse = serde_json::from_str(raw).expect("parse");
        assert_eq!(response.into_content().expect("content"), "func A(){}");
    }

    #[test]
    fn chunk_without_content_yields_empty_delta() {
        let chunk: ChatChunk =
            serde_json::from_str(r#"{"choices":[{"delta":{"role":"assistant"}}]}"#).expect("parse");
        assert_eq!(chunk.into_delta(), "");
    }
}
