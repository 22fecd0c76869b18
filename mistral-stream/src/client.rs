//! Mistral API client struct and builder.

use tokio_util::sync::CancellationToken;

use crate::config::{API_KEY_ENV, ChatConfig, DEFAULT_API_URL};
use crate::error::{MistralError, map_http_status, map_reqwest_error};
use crate::mapping::to_api_request;
use crate::streaming::{TokenStream, stream_completion};
use crate::types::{ChatMessage, ChatRequest, ChatResponse};

/// Client for the Mistral Chat Completions API.
///
/// # Example
///
/// ```no_run
/// use futures::StreamExt;
/// use mistral_stream::{ChatConfig, ChatMessage, Mistral, Model};
///
/// # async fn run() -> Result<(), mistral_stream::MistralError> {
/// let client = Mistral::from_env()?;
/// let config = ChatConfig::new(Model::MistralTiny).with_temperature(0.3);
///
/// let mut tokens = client
///     .stream_chat(&[ChatMessage::user("Say hello")], &config)
///     .await?;
/// while let Some(token) = tokens.next().await {
///     print!("{}", token?);
/// }
/// # Ok(())
/// # }
/// ```
pub struct Mistral {
    /// Mistral API key, sent as a bearer token.
    pub(crate) api_key: String,
    /// Full Chat Completions endpoint URL.
    pub(crate) api_url: String,
    /// Shared HTTP client.
    pub(crate) client: reqwest::Client,
}

impl Mistral {
    /// Create a new client with the given API key.
    ///
    /// Default endpoint: `https://api.mistral.ai/v1/chat/completions`.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_url: DEFAULT_API_URL.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Create a client using the `MISTRAL_API_KEY` environment variable.
    pub fn from_env() -> Result<Self, MistralError> {
        Self::from_api_key(std::env::var(API_KEY_ENV).ok())
    }

    fn from_api_key(api_key: Option<String>) -> Result<Self, MistralError> {
        match api_key {
            Some(key) if !key.trim().is_empty() => Ok(Self::new(key)),
            _ => Err(MistralError::MissingApiKey),
        }
    }

    /// Override the Chat Completions endpoint.
    ///
    /// Useful for Mistral-compatible servers, proxies, or a local mock server.
    #[must_use]
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Use an existing HTTP client (connection pool, timeouts, proxies).
    #[must_use]
    pub fn client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    fn post(&self, body: &ChatRequest) -> reqwest::RequestBuilder {
        self.client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(body)
    }

    /// Send a chat request and wait for the full answer.
    pub async fn complete(
        &self,
        messages: &[ChatMessage],
        config: &ChatConfig,
    ) -> Result<ChatResponse, MistralError> {
        let body = to_api_request(messages, config, false);

        tracing::debug!(url = %self.api_url, model = %body.model, "sending completion request");

        let response = self.post(&body).send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        let response_text = response.text().await.map_err(map_reqwest_error)?;

        if !status.is_success() {
            tracing::error!(status = %status, body = %response_text, "Mistral API rejected request");
            return Err(map_http_status(status, &response_text));
        }

        serde_json::from_str(&response_text).map_err(|source| MistralError::Parse {
            source,
            record: response_text,
        })
    }

    /// Send a streaming chat request and return its tokens as they arrive.
    ///
    /// Equivalent to [`stream_chat_with_cancel`](Self::stream_chat_with_cancel)
    /// with a token that is never cancelled. Dropping the returned stream
    /// still aborts the request.
    pub async fn stream_chat(
        &self,
        messages: &[ChatMessage],
        config: &ChatConfig,
    ) -> Result<TokenStream, MistralError> {
        self.stream_chat_with_cancel(messages, config, CancellationToken::new())
            .await
    }

    /// Send a streaming chat request that `cancel` can abort at any point.
    ///
    /// A non-success status is returned as [`MistralError::Api`] before any
    /// decoding starts, carrying the response body when it can be read.
    /// Cancelling while the request is in flight returns
    /// [`MistralError::Cancelled`]; cancelling later ends the token stream
    /// with that error.
    pub async fn stream_chat_with_cancel(
        &self,
        messages: &[ChatMessage],
        config: &ChatConfig,
        cancel: CancellationToken,
    ) -> Result<TokenStream, MistralError> {
        let body = to_api_request(messages, config, true);

        tracing::debug!(url = %self.api_url, model = %body.model, "sending streaming completion request");

        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(MistralError::Cancelled),
            response = self.post(&body).send() => response.map_err(map_reqwest_error)?,
        };

        let status = response.status();
        if !status.is_success() {
            let body_text = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(MistralError::Cancelled),
                text = response.text() => text.unwrap_or_default(),
            };
            tracing::error!(status = %status, body = %body_text, "Mistral API rejected streaming request");
            return Err(map_http_status(status, &body_text));
        }

        Ok(stream_completion(response, cancel))
    }
}

impl std::fmt::Debug for Mistral {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mistral")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}
