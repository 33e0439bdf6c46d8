//! Core client traits and error types.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use thiserror::Error;

use crate::model::{Message, Response, StreamChunk};
use crate::options::CallOptions;

/// Boxed error carried by [`ClientError::Transport`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Lazy sequence of chunks produced by [`StreamingClient::stream`].
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<StreamChunk, ClientError>> + Send>>;

/// Errors that can occur during client operations.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Missing or invalid setting. Raised while building a client, never per call.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Network failure, timeout or a connection that dropped mid-response.
    #[error("Transport error: {0}")]
    Transport(#[source] BoxError),

    /// Non-2xx status, malformed body, or an error reported inside a successful body.
    #[error("Backend error: {0}")]
    Backend(String),

    /// A single streamed event that could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),
}

impl ClientError {
    /// Whether this is a transport fault caused by an elapsed timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            ClientError::Transport(source) => source
                .downcast_ref::<reqwest::Error>()
                .is_some_and(reqwest::Error::is_timeout),
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Transport(Box::new(e))
    }
}

impl From<std::io::Error> for ClientError {
    fn from(e: std::io::Error) -> Self {
        ClientError::Transport(Box::new(e))
    }
}

/// Chat-completion contract consumed by orchestration code.
///
/// Callers hold a client by reference or `Arc` and pass it to whatever needs to talk to a model;
/// there is no global provider registry.
///
/// # Example
/// ```rust,ignore
/// async fn ask(client: &dyn Client) -> Result<String, ClientError> {
///     let messages = vec![Message::user("What is the capital of France?")];
///     let response = client.complete("openai.gpt-4o", &messages, &CallOptions::default()).await?;
///     Ok(response.content)
/// }
/// ```
#[async_trait]
pub trait Client: Send + Sync {
    /// Send one non-streaming request and return the normalized result.
    ///
    /// # Arguments
    /// - `model`: Backend model name, e.g. `openai.gpt-4o`
    /// - `messages`: Conversation messages, in order
    /// - `options`: Per-call overrides
    async fn complete(
        &self,
        model: &str,
        messages: &[Message],
        options: &CallOptions,
    ) -> Result<Response, ClientError>;
}

/// Extension trait for streaming support.
#[async_trait]
pub trait StreamingClient: Client {
    /// Send one streaming request.
    ///
    /// The outer error covers failures before the first byte (non-2xx status, connect errors).
    /// The returned stream yields token chunks, then exactly one final chunk, and ends. A fault
    /// during the body ends it with a single error after any chunks already yielded.
    async fn stream(
        &self,
        model: &str,
        messages: &[Message],
        options: &CallOptions,
    ) -> Result<ChunkStream, ClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_maps_to_transport() {
        let err: ClientError =
            std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by peer").into();
        assert!(matches!(err, ClientError::Transport(_)));
        assert_eq!(err.to_string(), "Transport error: reset by peer");
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_configuration_error_message() {
        let err = ClientError::Configuration("GENERATIVE_ENGINE_API_KEY is required".to_string());
        assert!(err.to_string().contains("GENERATIVE_ENGINE_API_KEY"));
    }
}
