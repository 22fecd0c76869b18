//! Mistral Chat Completions API request/response types.
//!
//! Reference: <https://docs.mistral.ai/api/#tag/chat>

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions for the model.
    System,
    /// End-user input.
    User,
    /// Model output.
    Assistant,
}

/// A single message in the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who wrote the message.
    pub role: Role,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// A system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// A user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// An assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Model identifier.
///
/// The named variants are the models the API documents; anything else
/// (newer models, fine-tunes, compatible servers) goes through [`Model::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Model {
    /// `mistral-tiny`
    MistralTiny,
    /// `mistral-small`
    MistralSmall,
    /// `mistral-medium`
    MistralMedium,
    /// Any other model identifier, sent verbatim.
    Other(String),
}

impl Model {
    /// The identifier sent on the wire.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::MistralTiny => "mistral-tiny",
            Self::MistralSmall => "mistral-small",
            Self::MistralMedium => "mistral-medium",
            Self::Other(name) => name,
        }
    }
}

impl From<&str> for Model {
    fn from(name: &str) -> Self {
        match name {
            "mistral-tiny" => Self::MistralTiny,
            "mistral-small" => Self::MistralSmall,
            "mistral-medium" => Self::MistralMedium,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for Model {
    fn from(name: String) -> Self {
        Self::from(name.as_str())
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Model {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Model {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from)
    }
}

/// Why the model stopped generating.
///
/// Open set: the API may add reasons, which land in [`FinishReason::Other`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    /// Natural end of the answer or a stop sequence.
    Stop,
    /// `max_tokens` reached.
    Length,
    /// The model's context length reached.
    ModelLength,
    /// Generation failed server-side.
    Error,
    /// The model requested tool calls.
    ToolCalls,
    /// A reason this crate does not know about.
    Other(String),
}

impl FinishReason {
    /// The raw reason string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Stop => "stop",
            Self::Length => "length",
            Self::ModelLength => "model_length",
            Self::Error => "error",
            Self::ToolCalls => "tool_calls",
            Self::Other(reason) => reason,
        }
    }
}

impl From<&str> for FinishReason {
    fn from(reason: &str) -> Self {
        match reason {
            "stop" => Self::Stop,
            "length" => Self::Length,
            "model_length" => Self::ModelLength,
            "error" => Self::Error,
            "tool_calls" => Self::ToolCalls,
            other => Self::Other(other.to_string()),
        }
    }
}

impl Serialize for FinishReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FinishReason {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(|s| Self::from(s.as_str()))
    }
}

/// Chat Completions request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    /// Model identifier.
    pub model: Model,
    /// Conversation messages.
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Maximum tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Nucleus sampling probability.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    /// Seed for deterministic sampling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub random_seed: Option<u64>,
    /// Whether the answer is streamed as `chat.completion.chunk` records.
    pub stream: bool,
    /// Whether to prepend the safety prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safe_prompt: Option<bool>,
}

/// One `data:` record of a streaming response.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatChunk {
    /// Completion identifier, shared by every chunk of one answer.
    #[serde(default)]
    pub id: String,
    /// Always `chat.completion.chunk`.
    #[serde(default)]
    pub object: String,
    /// Unix timestamp (seconds).
    #[serde(default)]
    pub created: u64,
    /// Model that produced the chunk.
    #[serde(default)]
    pub model: Option<Model>,
    /// Parallel choices; only the first one is surfaced as a token.
    pub choices: Vec<ChunkChoice>,
}

impl ChatChunk {
    /// The text carried by the first choice, or `""` when absent.
    #[must_use]
    pub fn token(&self) -> &str {
        self.choices
            .first()
            .and_then(|choice| choice.delta.content.as_deref())
            .unwrap_or_default()
    }
}

/// A choice within a streaming chunk.
#[derive(Debug, Clone, Deserialize)]
pub struct ChunkChoice {
    /// Index of this choice.
    #[serde(default)]
    pub index: u32,
    /// The partial message.
    pub delta: Delta,
    /// Set on the last chunk of the choice.
    #[serde(default)]
    pub finish_reason: Option<FinishReason>,
}

/// Partial assistant message carried by a chunk.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Delta {
    /// Present on the first chunk only.
    #[serde(default)]
    pub role: Option<Role>,
    /// Text fragment.
    #[serde(default)]
    pub content: Option<String>,
}

/// Non-streaming Chat Completions response body.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    /// Completion identifier.
    pub id: String,
    /// Always `chat.completion`.
    #[serde(default)]
    pub object: String,
    /// Unix timestamp (seconds).
    #[serde(default)]
    pub created: u64,
    /// Model that produced the answer.
    #[serde(default)]
    pub model: Option<Model>,
    /// Response choices.
    pub choices: Vec<ResponseChoice>,
    /// Token usage statistics.
    pub usage: Usage,
}

impl ChatResponse {
    /// Content of the first choice, or `""` when there is none.
    #[must_use]
    pub fn text(&self) -> &str {
        self.choices
            .first()
            .map(|choice| choice.message.content.as_str())
            .unwrap_or_default()
    }
}

/// A choice within a full response.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseChoice {
    /// Index of this choice.
    #[serde(default)]
    pub index: u32,
    /// The generated message.
    pub message: ChatMessage,
    /// Why generation stopped.
    #[serde(default)]
    pub finish_reason: Option<FinishReason>,
}

/// Token usage statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Usage {
    /// Tokens in the prompt.
    pub prompt_tokens: u64,
    /// Tokens in the completion.
    pub completion_tokens: u64,
    /// Prompt plus completion.
    pub total_tokens: u64,
}
