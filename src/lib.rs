//! # geneng - Generative Engine provider adapter
//!
//! Translates a uniform chat-completion call into requests against the Generative Engine invoke
//! endpoint, and normalizes its JSON and Server-Sent Events responses.
//!
//! ## Features
//! - Async-first, tokio compatible
//! - `complete` for one normalized result, `stream` for a lazy sequence of chunks
//! - Configuration from a YAML file and `GENERATIVE_ENGINE_*` environment variables
//! - Error taxonomy separating configuration, transport and backend failures
//!
//! ## Architecture
//!
//! - **`config`**: resolves global and per-model settings (section, then environment, then
//!   default)
//! - **`providers::generative_engine`**: request payload, response and stream decoding, and the
//!   [`GenerativeEngineClient`] tying them to an HTTP transport
//! - **`client`**: the [`Client`] and [`StreamingClient`] traits orchestration code depends on
//!
//! ## Example
//! ```no_run
//! use futures::StreamExt;
//! use geneng::{CallOptions, Client, GenerativeEngineClient, Message, StreamingClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads generative_engine_config.yaml and GENERATIVE_ENGINE_* variables
//!     let client = GenerativeEngineClient::from_env()?;
//!     let messages = vec![Message::user("What is the capital of France?")];
//!
//!     let response = client
//!         .complete("openai.gpt-4o", &messages, &CallOptions::default())
//!         .await?;
//!     println!("{}", response.content);
//!
//!     let mut stream = client
//!         .stream("openai.gpt-4o", &messages, &CallOptions::default())
//!         .await?;
//!     while let Some(chunk) = stream.next().await {
//!         let chunk = chunk?;
//!         if !chunk.is_final {
//!             print!("{}", chunk.text);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod http;
pub mod model;
pub mod options;
pub mod providers;
pub mod sse;

// Re-exports for convenience
pub use client::{ChunkStream, Client, ClientError, StreamingClient};
pub use config::{ConfigResolver, ConfigSource, ModelConfig};
pub use model::{FinishReason, Message, Response, Role, StreamChunk, Usage};
pub use options::{CallOptions, OptionalParams, TransportOptions};
pub use providers::GenerativeEngineClient;
