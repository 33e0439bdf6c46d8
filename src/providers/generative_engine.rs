//! Generative Engine invoke API client implementation.
//!
//! One endpoint serves both call styles: the `streaming` kwarg in the body selects a single JSON
//! object or an SSE body of `token` events closed by one `final_response` event.

pub mod request;
pub mod response;
pub mod stream;

use std::path::Path;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use tracing::{debug, info};

use crate::client::{ChunkStream, Client, ClientError, StreamingClient};
use crate::config::{ConfigResolver, ModelConfig, ModelConfigs};
use crate::http::{add_extra_headers, build_http_client, engine_headers};
use crate::model::{Message, Response};
use crate::options::{CallOptions, TransportOptions};
use crate::sse::SSEResponseExt;

use request::RequestPayload;
use response::{decode_response, handle_error_response};
use stream::decode_stream;

/// Generative Engine client using HTTP transport.
///
/// Configuration is resolved once at construction and only read afterwards, so one instance can
/// serve concurrent calls; each call opens its own connection.
#[derive(Debug)]
pub struct GenerativeEngineClient {
    transport_options: TransportOptions,
    headers: HeaderMap,
    models: ModelConfigs,
}

impl GenerativeEngineClient {
    /// Create a client from already resolved settings.
    pub fn new(
        transport_options: TransportOptions,
        models: ModelConfigs,
    ) -> Result<Self, ClientError> {
        let headers = engine_headers(&transport_options.api_key)?;
        info!(
            "Initialized GenerativeEngineClient with API base: {}",
            transport_options.base_url
        );
        Ok(Self {
            transport_options,
            headers,
            models,
        })
    }

    /// Create a client from a resolver. Fails when the API key is missing or a value is invalid.
    pub fn from_resolver(resolver: &ConfigResolver) -> Result<Self, ClientError> {
        Self::new(resolver.transport_options()?, resolver.resolve_all()?)
    }

    /// Create a client from the process environment and the default config file location.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_resolver(&ConfigResolver::from_env(None))
    }

    /// Create a client from the process environment and the given config file.
    pub fn from_config_path(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        Self::from_resolver(&ConfigResolver::from_env(Some(path.as_ref())))
    }

    pub fn transport_options(&self) -> &TransportOptions {
        &self.transport_options
    }

    /// Settings used for `model`.
    pub fn model_config(&self, model: &str) -> &ModelConfig {
        self.models.resolve(model)
    }

    /// Build and send one invoke request.
    async fn send(
        &self,
        model: &str,
        messages: &[Message],
        options: &CallOptions,
        streaming: bool,
    ) -> Result<reqwest::Response, ClientError> {
        let config = self.models.resolve(model);
        let payload = RequestPayload::build(model, messages, options, config, streaming);

        let default_timeout = if streaming {
            self.transport_options.stream_timeout
        } else {
            self.transport_options.timeout
        };
        let http_client =
            build_http_client(&self.transport_options, options.timeout.unwrap_or(default_timeout))?;

        let url = self.transport_options.url();
        info!("Sending request to {}", url);
        if let Some(session_id) = &options.session_id {
            info!("Using session ID: {}", session_id);
        }
        if let Ok(body) = serde_json::to_string(&payload) {
            debug!("Payload: {}", body);
        }

        let mut req = http_client.post(&url).headers(self.headers.clone());
        req = add_extra_headers(req, &self.transport_options.extra_headers);

        Ok(req.json(&payload).send().await?)
    }
}

#[async_trait]
impl Client for GenerativeEngineClient {
    async fn complete(
        &self,
        model: &str,
        messages: &[Message],
        options: &CallOptions,
    ) -> Result<Response, ClientError> {
        let response = self.send(model, messages, options, false).await?;
        let status = response.status();
        let body = response.text().await?;

        decode_response(model, status, &body)
    }
}

#[async_trait]
impl StreamingClient for GenerativeEngineClient {
    async fn stream(
        &self,
        model: &str,
        messages: &[Message],
        options: &CallOptions,
    ) -> Result<ChunkStream, ClientError> {
        let response = self.send(model, messages, options, true).await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(handle_error_response(status, &body));
        }

        Ok(decode_stream(response.sse()))
    }
}
