//! Stateless request builder and response parser for the LaunchDarkly REST API.
//!
//! # Design
//! `ApiClient` holds only validated `Credentials` and carries no mutable
//! state between calls. A call is split into `build_request`, which produces
//! an `HttpRequest`, a `Transport` round-trip, and `parse_response`, which
//! consumes the `HttpResponse`. Both halves are pure, so everything except
//! the round-trip is deterministic.

use serde_json::{Map, Value};

use crate::config::Credentials;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::params::encode_query;
use crate::transport::{Transport, UreqTransport};
use crate::types::RequestOptions;

const USER_AGENT: &str = concat!("ldapi-blocks/", env!("CARGO_PKG_VERSION"));

/// Synchronous, stateless client for the LaunchDarkly REST API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    credentials: Credentials,
}

impl ApiClient {
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }

    /// Join the base URL with `path`, append the query string, and attach
    /// authentication and JSON headers.
    ///
    /// `path` must already have its identifiers substituted; it is used verbatim.
    pub fn build_request(
        &self,
        path: &str,
        options: &RequestOptions,
    ) -> Result<HttpRequest, ApiError> {
        if !path.starts_with('/') {
            return Err(ApiError::Configuration(format!(
                "path `{path}` must start with `/`"
            )));
        }

        let mut url = format!("{}{path}", self.credentials.base_url());
        if let Some(query) = encode_query(&options.query) {
            url.push(if path.contains('?') { '&' } else { '?' });
            url.push_str(&query);
        }

        let mut headers = vec![
            (
                "Authorization".to_string(),
                self.credentials.api_key().to_string(),
            ),
            ("Accept".to_string(), "application/json".to_string()),
            ("User-Agent".to_string(), USER_AGENT.to_string()),
        ];

        let body = match &options.body {
            Some(value) => {
                let body = serde_json::to_string(value)
                    .map_err(|e| ApiError::Serialization(e.to_string()))?;
                headers.push(("Content-Type".to_string(), "application/json".to_string()));
                Some(body)
            }
            None => None,
        };

        Ok(HttpRequest {
            method: options.method,
            url,
            headers,
            body,
        })
    }

    /// Turn a response into the JSON value a block emits.
    ///
    /// 2xx with an empty body yields `{}`; any other 2xx body is parsed and
    /// returned untouched.
    pub fn parse_response(&self, response: HttpResponse) -> Result<Value, ApiError> {
        if !response.is_success() {
            tracing::warn!(status = response.status, "LaunchDarkly API returned an error");
            return Err(ApiError::Request {
                status: response.status,
                body: response.body,
            });
        }
        if response.body.trim().is_empty() {
            return Ok(Value::Object(Map::new()));
        }
        serde_json::from_str(&response.body).map_err(|e| ApiError::Decode {
            status: response.status,
            message: e.to_string(),
            body: response.body,
        })
    }

    /// Build, send through `transport`, and parse.
    pub fn execute<T: Transport + ?Sized>(
        &self,
        transport: &T,
        path: &str,
        options: &RequestOptions,
    ) -> Result<Value, ApiError> {
        let request = self.build_request(path, options)?;
        tracing::debug!(
            method = %request.method,
            url = %request.url,
            "sending LaunchDarkly API request"
        );

        let response = transport.send(&request).inspect_err(|e| {
            tracing::warn!(
                method = %request.method,
                url = %request.url,
                error = %e,
                "LaunchDarkly API request failed"
            );
        })?;
        tracing::debug!(
            status = response.status,
            bytes = response.body.len(),
            "received LaunchDarkly API response"
        );

        self.parse_response(response)
    }
}

/// One-shot request helper used by blocks.
///
/// Validates the credentials, then performs a single request with a
/// request-scoped client and transport. `base_url` falls back to
/// [`crate::config::DEFAULT_BASE_URL`].
pub fn execute(
    api_key: &str,
    base_url: Option<&str>,
    path: &str,
    options: &RequestOptions,
) -> Result<Value, ApiError> {
    let client = ApiClient::new(Credentials::new(api_key, base_url)?);
    client.execute(&UreqTransport::new(), path, options)
}
