#![deny(missing_docs)]
#![doc = include_str!("../README.md")]

pub mod client;
pub mod config;
pub mod decoder;
pub mod error;
pub mod mapping;
pub mod streaming;
pub mod types;

pub use client::Mistral;
pub use config::{API_KEY_ENV, ChatConfig, DEFAULT_API_URL};
pub use decoder::{Decoded, RecordDecoder};
pub use error::MistralError;
pub use streaming::{TokenStream, decode_stream};
pub use types::{ChatChunk, ChatMessage, ChatResponse, FinishReason, Model, Role, Usage};

// Re-exported so callers can cancel without depending on tokio-util directly.
pub use tokio_util::sync::CancellationToken;
