//! HTTP client utilities for calling the backend.
//!
//! Every call builds its own `reqwest::Client`, so concurrent calls never share a connection.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder};
use std::collections::HashMap;
use std::time::Duration;
use tracing::warn;

use crate::client::ClientError;
use crate::options::{SecretString, TransportOptions};

/// Header carrying the API key.
pub const API_KEY_HEADER: HeaderName = HeaderName::from_static("x-api-key");

/// Build a configured HTTP client with the given timeout.
///
/// The proxy from the transport options is applied when it parses; an unusable proxy URL is
/// logged and skipped.
pub fn build_http_client(
    transport_options: &TransportOptions,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder().timeout(timeout);

    if let Some(proxy_url) = &transport_options.proxy {
        match reqwest::Proxy::all(proxy_url) {
            Ok(proxy) => builder = builder.proxy(proxy),
            Err(e) => warn!("Ignoring invalid proxy URL {}: {}", proxy_url, e),
        }
    }

    builder.build()
}

/// The fixed header set sent with every request.
pub fn engine_headers(api_key: &SecretString) -> Result<HeaderMap, ClientError> {
    let mut key = HeaderValue::from_str(api_key.expose_secret()).map_err(|_| {
        ClientError::Configuration("API key is not a valid header value".to_string())
    })?;
    key.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(API_KEY_HEADER, key);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    Ok(headers)
}

/// Add extra headers to a request if specified in transport options.
pub fn add_extra_headers(
    mut request: RequestBuilder,
    extra_headers: &Option<HashMap<String, String>>,
) -> RequestBuilder {
    if let Some(headers) = extra_headers {
        for (key, value) in headers {
            request = request.header(key, value);
        }
    }
    request
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_http_client() {
        let transport_options = TransportOptions::new("test");
        let client = build_http_client(&transport_options, Duration::from_secs(30));
        assert!(client.is_ok());
    }

    #[test]
    fn test_build_http_client_with_proxy() {
        let transport_options =
            TransportOptions::new("test").with_proxy("http://proxy.example.com:8080");
        let client = build_http_client(&transport_options, Duration::from_secs(30));
        assert!(client.is_ok());
    }

    #[test]
    fn test_engine_headers() {
        let headers = engine_headers(&SecretString::from("abc123")).unwrap();
        assert_eq!(headers.get("x-api-key").unwrap(), "abc123");
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
        assert_eq!(headers.get(ACCEPT).unwrap(), "application/json");
        assert!(headers.get("x-api-key").unwrap().is_sensitive());
    }

    #[test]
    fn test_engine_headers_rejects_newline() {
        let err = engine_headers(&SecretString::from("bad\nkey")).unwrap_err();
        assert!(matches!(err, ClientError::Configuration(_)));
    }
}
