//! Mapping from [`ChatConfig`] and messages to the Chat Completions request body.

use crate::config::ChatConfig;
use crate::types::{ChatMessage, ChatRequest};

/// Build the request body for `messages` under `config`.
///
/// Every config field maps verbatim to its wire field; `stream` selects
/// between the chunked and the single-document response.
#[must_use]
pub fn to_api_request(messages: &[ChatMessage], config: &ChatConfig, stream: bool) -> ChatRequest {
    ChatRequest {
        model: config.model.clone(),
        messages: messages.to_vec(),
        temperature: config.temperature,
        max_tokens: config.max_tokens,
        top_p: config.top_p,
        random_seed: config.random_seed,
        stream,
        safe_prompt: config.safe_mode,
    }
}
