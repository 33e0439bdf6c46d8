//! Non-streaming response decoding.

use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, error};

use super::stream::{parse_event, EngineEvent};
use crate::client::ClientError;
use crate::model::{FinishReason, Response, Role, Usage};
use crate::sse::parse_sse_line;

/// Prefixes the backend puts on an otherwise successful body when the model call failed.
///
/// Only a leading marker counts, so answers that merely mention one of these phrases decode.
pub const ERROR_MARKERS: &[&str] = &[
    "An error occurred",
    "Exception:",
    "Traceback (most recent call last)",
];

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EngineResponse {
    content: Option<String>,
    session_id: Option<String>,
    metadata: Option<EngineMetadata>,
}

#[derive(Debug, Default, Deserialize)]
struct EngineMetadata {
    usage: Option<EngineUsage>,
}

#[derive(Debug, Default, Deserialize)]
struct EngineUsage {
    input_tokens: Option<u32>,
    output_tokens: Option<u32>,
    total_tokens: Option<u32>,
}

impl From<EngineUsage> for Usage {
    fn from(u: EngineUsage) -> Self {
        Usage {
            prompt_tokens: u.input_tokens.unwrap_or_default(),
            completion_tokens: u.output_tokens.unwrap_or_default(),
            total_tokens: u.total_tokens.unwrap_or_default(),
        }
    }
}

/// Normalize one invoke response.
///
/// Missing `content`, `sessionId` or usage fields default to empty or zero. A body that is not a
/// JSON object is scanned for an SSE-framed `final_response` event, which older backend revisions
/// sent to non-streaming calls.
pub fn decode_response(
    model: &str,
    status: StatusCode,
    body: &str,
) -> Result<Response, ClientError> {
    if !status.is_success() {
        return Err(handle_error_response(status, body));
    }
    debug!("Received response: {}", body);

    let engine_response = match serde_json::from_str::<EngineResponse>(body) {
        Ok(parsed) => parsed,
        Err(e) => match final_response_from_sse(body) {
            Some(content) => EngineResponse {
                content: Some(content),
                ..EngineResponse::default()
            },
            None => {
                return Err(ClientError::Backend(format!(
                    "Malformed response body: {}",
                    e
                )))
            }
        },
    };

    let content = engine_response
        .content
        .unwrap_or_default()
        .trim()
        .to_string();

    if let Some(marker) = ERROR_MARKERS.iter().find(|marker| content.starts_with(*marker)) {
        error!("Backend reported an error ({}): {}", marker, content);
        return Err(ClientError::Backend(format!(
            "Backend reported an error: {}",
            content
        )));
    }

    let session_id = engine_response.session_id.filter(|id| !id.is_empty());
    if let Some(id) = &session_id {
        debug!("Session ID: {}", id);
    }

    Ok(Response {
        id: format!("geneng-{}", uuid::Uuid::new_v4().simple()),
        created: chrono::Utc::now().timestamp(),
        model: model.to_string(),
        role: Role::Assistant,
        content,
        finish_reason: FinishReason::Stop,
        usage: engine_response
            .metadata
            .and_then(|m| m.usage)
            .map(Usage::from)
            .unwrap_or_default(),
        session_id,
    })
}

/// Error for a non-2xx invoke response.
pub fn handle_error_response(status: StatusCode, body: &str) -> ClientError {
    error!("Invoke request failed with status {}: {}", status, body);
    ClientError::Backend(format!("HTTP {}: {}", status, body))
}

fn final_response_from_sse(body: &str) -> Option<String> {
    body.lines()
        .filter_map(parse_sse_line)
        .find_map(|payload| match parse_event(payload) {
            Ok(EngineEvent::FinalResponse(content)) => Some(content),
            _ => None,
        })
}
