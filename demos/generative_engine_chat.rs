//! Completion and streaming against the Generative Engine.
//!
//! Run with:
//! ```bash
//! export GENERATIVE_ENGINE_API_KEY="your-api-key"
//! RUST_LOG=geneng=debug cargo run --example generative_engine_chat -- openai.gpt-4o
//! ```

use std::io::Write;

use futures::StreamExt;
use geneng::{CallOptions, Client, GenerativeEngineClient, Message, StreamingClient};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let model = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "openai.gpt-4o".to_string());

    // Fails here, not per call, when no API key is configured
    let client = GenerativeEngineClient::from_env()?;

    let messages = vec![Message::user("What is the capital of France?")];
    let response = client
        .complete(&model, &messages, &CallOptions::default())
        .await?;

    println!("=== Completion ===");
    println!("{}", response.content);
    println!(
        "Usage: {} prompt + {} completion = {} tokens",
        response.usage.prompt_tokens, response.usage.completion_tokens, response.usage.total_tokens
    );

    // Keep the backend conversation going if it handed us a session
    let mut options = CallOptions::default().with_max_tokens(256);
    if let Some(session_id) = response.session_id {
        options = options.with_session_id(session_id);
    }

    println!("\n=== Streaming ===");
    let messages = vec![Message::user("Count from 1 to 5.")];
    let mut stream = client.stream(&model, &messages, &options).await?;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if chunk.is_final {
            println!("\n\nFinish reason: {:?}", chunk.finish_reason);
        } else {
            print!("{}", chunk.text);
            std::io::stdout().flush()?;
        }
    }

    Ok(())
}
