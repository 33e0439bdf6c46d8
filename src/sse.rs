//! Server-Sent Events (SSE) line framing.
//!
//! Turns a byte stream into the payloads of its `data: ` lines:
//! ```text
//! data: {"action": "token", "data": {"token": "Hi"}}
//!
//! data: {"action": "final_response", "data": {"content": "Hi there"}}
//! ```
//! Every other line (blank keep-alives, comments, `event:` fields) is dropped here.

use bytes::{Bytes, BytesMut};
use futures::stream::{self, Stream, StreamExt};

use crate::client::ClientError;

/// Prefix marking an event line.
pub const DATA_PREFIX: &str = "data: ";

/// Extension trait for `reqwest::Response` to enable SSE streaming.
///
/// # Example
/// ```ignore
/// use geneng::sse::SSEResponseExt;
///
/// let response = client.post(url).send().await?;
/// let mut lines = response.sse();
/// while let Some(line) = lines.next().await {
///     println!("SSE data: {}", line?);
/// }
/// ```
pub trait SSEResponseExt {
    /// Convert the response into a stream of raw SSE data payloads.
    fn sse(self) -> impl Stream<Item = Result<String, ClientError>> + Send;
}

impl SSEResponseExt for reqwest::Response {
    fn sse(self) -> impl Stream<Item = Result<String, ClientError>> + Send {
        sse_lines(self.bytes_stream())
    }
}

/// Frame any byte stream into SSE data payloads.
///
/// Lines are split on `\n` over raw bytes, so a line or a UTF-8 sequence split across chunks is
/// reassembled before decoding. An unterminated last line is still delivered at end of stream.
/// A byte stream error is yielded once and ends the stream.
pub fn sse_lines<S, E>(byte_stream: S) -> impl Stream<Item = Result<String, ClientError>> + Send
where
    S: Stream<Item = Result<Bytes, E>> + Send,
    E: Into<ClientError> + Send,
{
    stream::unfold(
        (Box::pin(byte_stream), BytesMut::new(), 0, false),
        |(mut byte_stream, mut buffer, mut scanned, mut stream_ended)| async move {
            loop {
                // Process complete lines from buffer
                while let Some(line) = next_line(&mut buffer, &mut scanned) {
                    if let Some(data) = data_payload(&line) {
                        return Some((Ok(data), (byte_stream, buffer, scanned, stream_ended)));
                    }
                }

                if stream_ended {
                    if buffer.is_empty() {
                        return None;
                    }
                    let line = buffer.split();
                    return data_payload(&line)
                        .map(|data| (Ok(data), (byte_stream, buffer, 0, stream_ended)));
                }

                match byte_stream.next().await {
                    Some(Ok(chunk)) => buffer.extend_from_slice(&chunk),
                    Some(Err(e)) => {
                        buffer.clear();
                        return Some((Err(e.into()), (byte_stream, buffer, 0, true)));
                    }
                    None => stream_ended = true,
                }
            }
        },
    )
}

/// Split the next `\n`-terminated line off `buffer`.
///
/// `scanned` counts leading bytes already known to hold no newline, so each byte is searched once
/// however many chunks a long line arrives in.
fn next_line(buffer: &mut BytesMut, scanned: &mut usize) -> Option<BytesMut> {
    match buffer[*scanned..].iter().position(|b| *b == b'\n') {
        Some(pos) => {
            let line = buffer.split_to(*scanned + pos + 1);
            *scanned = 0;
            Some(line)
        }
        None => {
            *scanned = buffer.len();
            None
        }
    }
}

fn data_payload(line: &[u8]) -> Option<String> {
    let line = String::from_utf8_lossy(line);
    let line = line.trim_end_matches(['\n', '\r']);
    parse_sse_line(line).map(str::to_string)
}

/// Parse an SSE line to extract the data portion.
///
/// # Example
/// ```
/// use geneng::sse::parse_sse_line;
///
/// let line = "data: {\"key\": \"value\"}";
/// assert_eq!(parse_sse_line(line), Some("{\"key\": \"value\"}"));
///
/// let line = "invalid";
/// assert_eq!(parse_sse_line(line), None);
/// ```
pub fn parse_sse_line(line: &str) -> Option<&str> {
    line.strip_prefix(DATA_PREFIX).map(|s| s.trim())
}
