//! Example: stream a chat completion to stdout, token by token.
//!
//! Requires MISTRAL_API_KEY environment variable. Press Ctrl-C to cancel.
//!
//! Run with: MISTRAL_API_KEY=... cargo run --example stream_chat -p mistral-stream -- "your prompt"

use std::io::Write;

use futures::StreamExt;
use mistral_stream::{CancellationToken, ChatConfig, ChatMessage, Mistral, MistralError, Model};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let prompt = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "Tell me a short story about a crab learning Rust.".to_string());

    let client = Mistral::from_env()?;
    let config = ChatConfig::new(Model::MistralTiny)
        .with_temperature(0.7)
        .with_max_tokens(512);

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_ctrl_c.cancel();
        }
    });

    let messages = [
        ChatMessage::system("You are a concise storyteller."),
        ChatMessage::user(prompt),
    ];
    let mut tokens = client
        .stream_chat_with_cancel(&messages, &config, cancel)
        .await?;

    let mut stdout = std::io::stdout();
    while let Some(token) = tokens.next().await {
        match token {
            Ok(text) => {
                write!(stdout, "{text}")?;
                stdout.flush()?;
            }
            Err(MistralError::Cancelled) => {
                writeln!(stdout, "\n[cancelled]")?;
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        }
    }
    writeln!(stdout)?;

    Ok(())
}
