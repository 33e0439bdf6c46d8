//! Streaming event decoding.

use futures::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::client::{ChunkStream, ClientError};
use crate::model::StreamChunk;

const TOKEN_ACTION: &str = "token";
const FINAL_RESPONSE_ACTION: &str = "final_response";

/// One decoded `data: ` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum EngineEvent {
    /// Partial output
    Token(String),
    /// Full output; nothing follows
    FinalResponse(String),
    /// Any other action, carried for logging
    Other(String),
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    action: String,
    #[serde(default)]
    data: Value,
}

/// Parse the JSON payload of one `data: ` line.
pub(crate) fn parse_event(payload: &str) -> Result<EngineEvent, ClientError> {
    let raw: RawEvent = serde_json::from_str(payload)
        .map_err(|e| ClientError::Decode(format!("{} | Input: {}", e, payload)))?;

    let field = |name: &str| {
        raw.data
            .get(name)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                ClientError::Decode(format!(
                    "'{}' event without data.{} | Input: {}",
                    raw.action, name, payload
                ))
            })
    };

    match raw.action.as_str() {
        TOKEN_ACTION => field("token").map(EngineEvent::Token),
        FINAL_RESPONSE_ACTION => field("content").map(EngineEvent::FinalResponse),
        _ => Ok(EngineEvent::Other(raw.action.clone())),
    }
}

/// Decode SSE data payloads into chunks.
///
/// Yields one chunk per `token` event and one final chunk for `final_response`, after which the
/// stream ends and the underlying line stream (and its connection) is dropped. Undecodable
/// events are logged and skipped. A transport error is yielded and ends the stream, as does a
/// line stream that finishes without a `final_response`.
pub fn decode_stream<S>(lines: S) -> ChunkStream
where
    S: Stream<Item = Result<String, ClientError>> + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut lines = Box::pin(lines);

        loop {
            let payload = match lines.next().await {
                Some(Ok(payload)) => payload,
                Some(Err(e)) => {
                    yield Err(e);
                    break;
                }
                None => {
                    warn!("Stream ended before final_response");
                    yield Err(ClientError::Transport(
                        "stream ended before final_response event".into(),
                    ));
                    break;
                }
            };

            match parse_event(&payload) {
                Ok(EngineEvent::Token(token)) => yield Ok(StreamChunk::token(token)),
                Ok(EngineEvent::FinalResponse(content)) => {
                    yield Ok(StreamChunk::finish(content));
                    break;
                }
                Ok(EngineEvent::Other(action)) => {
                    debug!("Ignoring stream event with action '{}'", action);
                }
                Err(e) => warn!("Skipping malformed stream event: {}", e),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn lines(items: Vec<&str>) -> impl Stream<Item = Result<String, ClientError>> + Send {
        stream::iter(
            items
                .into_iter()
                .map(|line| Ok(line.to_string()))
                .collect::<Vec<_>>(),
        )
    }

    const TOKEN: &str = r#"{"action":"token","data":{"token":"Hi"}}"#;
    const FINAL: &str = r#"{"action":"final_response","data":{"content":"Hi there"}}"#;

    #[test]
    fn test_parse_event_variants() {
        assert_eq!(parse_event(TOKEN).unwrap(), EngineEvent::Token("Hi".into()));
        assert_eq!(
            parse_event(FINAL).unwrap(),
            EngineEvent::FinalResponse("Hi there".into())
        );
        assert_eq!(
            parse_event(r#"{"action":"heartbeat"}"#).unwrap(),
            EngineEvent::Other("heartbeat".into())
        );
    }

    #[test]
    fn test_parse_event_errors_are_decode_errors() {
        assert!(matches!(parse_event("{not json"), Err(ClientError::Decode(_))));
        assert!(matches!(
            parse_event(r#"{"action":"token","data":{}}"#),
            Err(ClientError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_token_then_final() {
        let chunks: Vec<_> = decode_stream(lines(vec![TOKEN, FINAL])).collect().await;
        let chunks: Vec<StreamChunk> = chunks.into_iter().map(Result::unwrap).collect();
        assert_eq!(
            chunks,
            vec![StreamChunk::token("Hi"), StreamChunk::finish("Hi there")]
        );
    }

    #[tokio::test]
    async fn test_malformed_event_is_skipped() {
        let source = lines(vec![TOKEN, "{oops", r#"{"action":"token"}"#, FINAL]);
        let chunks: Vec<_> = decode_stream(source).collect().await;
        let chunks: Vec<StreamChunk> = chunks.into_iter().map(Result::unwrap).collect();
        assert_eq!(
            chunks,
            vec![StreamChunk::token("Hi"), StreamChunk::finish("Hi there")]
        );
    }

    #[tokio::test]
    async fn test_nothing_is_read_after_final() {
        let pulled = Arc::new(AtomicUsize::new(0));
        let counter = pulled.clone();
        let source = lines(vec![TOKEN, FINAL, TOKEN, TOKEN]).inspect(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let chunks: Vec<_> = decode_stream(source).collect().await;
        assert_eq!(chunks.len(), 2);
        assert_eq!(pulled.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_transport_error_after_yielded_token() {
        let source = stream::iter(vec![
            Ok(TOKEN.to_string()),
            Err(ClientError::from(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection dropped",
            ))),
            Ok(FINAL.to_string()),
        ]);

        let chunks: Vec<_> = decode_stream(source).collect().await;
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].as_ref().unwrap(), &StreamChunk::token("Hi"));
        assert!(matches!(chunks[1], Err(ClientError::Transport(_))));
    }

    #[tokio::test]
    async fn test_missing_final_is_transport_error() {
        let chunks: Vec<_> = decode_stream(lines(vec![TOKEN])).collect().await;
        assert_eq!(chunks.len(), 2);
        assert!(matches!(chunks[1], Err(ClientError::Transport(_))));
    }
}
