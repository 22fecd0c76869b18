//! Token streaming over a chat completion response body.
//!
//! Drives a byte-chunk producer through a [`RecordDecoder`] and hands the
//! caller one token at a time. The producer is owned by the stream and
//! dropped on every exit path, which for an HTTP body closes the connection.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::decoder::{Decoded, RecordDecoder};
use crate::error::MistralError;

/// Wrap an HTTP response body into a [`TokenStream`].
pub(crate) fn stream_completion(
    response: reqwest::Response,
    cancel: CancellationToken,
) -> TokenStream {
    TokenStream::new(decode_stream(response.bytes_stream(), cancel))
}

/// Turn a stream of byte chunks into a stream of tokens.
///
/// The stream ends without error on the terminal marker or when the producer
/// is exhausted. It ends with exactly one `Err` on a producer failure, a
/// malformed record, or cancellation ([`MistralError::Cancelled`]).
///
/// Cancellation is observed while waiting for the next chunk and again before
/// each token, so cancelling after N tokens were received yields exactly those
/// N tokens followed by `Cancelled`.
pub fn decode_stream<S, E>(
    byte_stream: S,
    cancel: CancellationToken,
) -> impl Stream<Item = Result<String, MistralError>> + Send + 'static
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    async_stream::stream! {
        let mut decoder = RecordDecoder::new();
        let mut bytes_stream = std::pin::pin!(byte_stream);

        loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => None,
                next = bytes_stream.next() => Some(next),
            };

            let Some(next) = next else {
                tracing::debug!("token stream cancelled while waiting for data");
                yield Err(MistralError::Cancelled);
                return;
            };

            let chunk = match next {
                Some(Ok(chunk)) => chunk,
                Some(Err(e)) => {
                    yield Err(MistralError::Network(Box::new(e)));
                    return;
                }
                None => break,
            };

            for event in decoder.feed(&chunk) {
                if cancel.is_cancelled() {
                    tracing::debug!("token stream cancelled between records");
                    yield Err(MistralError::Cancelled);
                    return;
                }
                match event {
                    Decoded::Token(token) => yield Ok(token),
                    Decoded::Done => return,
                    Decoded::Error(err) => {
                        yield Err(err);
                        return;
                    }
                }
            }
        }

        if let Some(rest) = decoder.finish() {
            tracing::debug!(bytes = rest.len(), "discarding unterminated trailing record");
        }
    }
}

/// Handle to a streaming chat completion.
///
/// Yields `Ok(token)` per data record, in arrival order. Consume it with
/// [`StreamExt::next`] directly or through [`receiver`](Self::receiver).
/// Dropping the handle closes the underlying response body.
pub struct TokenStream {
    /// The stream of tokens.
    pub receiver: Pin<Box<dyn Stream<Item = Result<String, MistralError>> + Send>>,
}

impl TokenStream {
    /// Box any token stream into a handle.
    pub fn new(stream: impl Stream<Item = Result<String, MistralError>> + Send + 'static) -> Self {
        Self {
            receiver: Box::pin(stream),
        }
    }

    /// Drain the stream and concatenate every token.
    ///
    /// Returns the first error encountered; tokens received before it are lost.
    pub async fn collect_text(mut self) -> Result<String, MistralError> {
        let mut text = String::new();
        while let Some(token) = self.receiver.next().await {
            text.push_str(&token?);
        }
        Ok(text)
    }
}

impl Stream for TokenStream {
    type Item = Result<String, MistralError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.as_mut().poll_next(cx)
    }
}

impl std::fmt::Debug for TokenStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStream").finish_non_exhaustive()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
