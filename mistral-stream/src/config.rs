//! Per-request generation parameters and credential defaults.

use crate::types::Model;

/// Chat Completions endpoint used when no URL override is given.
pub const DEFAULT_API_URL: &str = "https://api.mistral.ai/v1/chat/completions";

/// Environment variable read by [`Mistral::from_env`](crate::Mistral::from_env).
pub const API_KEY_ENV: &str = "MISTRAL_API_KEY";

/// Generation parameters for one chat request.
///
/// Only the model is required; every other field is omitted from the request
/// body when `None`, leaving the server default in place.
///
/// ```
/// use mistral_stream::{ChatConfig, Model};
///
/// let config = ChatConfig::new(Model::MistralSmall)
///     .with_temperature(0.2)
///     .with_max_tokens(256);
/// assert_eq!(config.max_tokens, Some(256));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// Model identifier.
    pub model: Model,
    /// Sampling temperature.
    pub temperature: Option<f64>,
    /// Maximum tokens to generate.
    pub max_tokens: Option<u32>,
    /// Nucleus sampling probability.
    pub top_p: Option<f64>,
    /// Seed for deterministic sampling.
    pub random_seed: Option<u64>,
    /// Sent as `safe_prompt`.
    pub safe_mode: Option<bool>,
}

impl ChatConfig {
    /// Parameters for `model` with every option left to the server default.
    pub fn new(model: impl Into<Model>) -> Self {
        Self {
            model: model.into(),
            temperature: None,
            max_tokens: None,
            top_p: None,
            random_seed: None,
            safe_mode: None,
        }
    }

    /// Set the sampling temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the maximum number of generated tokens.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the nucleus sampling probability.
    #[must_use]
    pub fn with_top_p(mut self, top_p: f64) -> Self {
        self.top_p = Some(top_p);
        self
    }

    /// Set the random seed.
    #[must_use]
    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Enable or disable the safety prompt.
    #[must_use]
    pub fn with_safe_mode(mut self, safe_mode: bool) -> Self {
        self.safe_mode = Some(safe_mode);
        self
    }
}
