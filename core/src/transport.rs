//! The network seam.
//!
//! # Design
//! `ApiClient` never performs I/O itself: it hands a fully built
//! `HttpRequest` to a `Transport` and parses whatever `HttpResponse` comes
//! back. Tests substitute fabricated transports; production uses
//! `UreqTransport`, which builds a fresh agent for every request so no
//! connection state is shared between invocations.

use std::time::Duration;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Executes one HTTP round-trip.
///
/// Implementations return non-2xx responses as data; only failures that
/// produce no response at all become `ApiError::Transport`. A body that is
/// not UTF-8 is a `Decode` error on 2xx and is relayed lossily otherwise,
/// so the status is never lost.
pub trait Transport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// Blocking transport backed by `ureq`.
#[derive(Debug, Clone, Default)]
pub struct UreqTransport {
    timeout: Option<Duration>,
}

impl UreqTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound the whole round-trip. Without this, ureq's defaults apply.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }

    fn agent(&self) -> ureq::Agent {
        // Status interpretation belongs to the client, so 4xx/5xx come back as data.
        ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(self.timeout)
            .build()
            .new_agent()
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let agent = self.agent();
        let url = request.url.as_str();
        let body = request.body.as_deref();

        let result = match (request.method, body) {
            (HttpMethod::Get, _) => with_headers(agent.get(url), &request.headers).call(),
            (HttpMethod::Delete, _) => with_headers(agent.delete(url), &request.headers).call(),
            (HttpMethod::Post, Some(b)) => {
                with_headers(agent.post(url), &request.headers).send(b.as_bytes())
            }
            (HttpMethod::Post, None) => {
                with_headers(agent.post(url), &request.headers).send_empty()
            }
            (HttpMethod::Put, Some(b)) => {
                with_headers(agent.put(url), &request.headers).send(b.as_bytes())
            }
            (HttpMethod::Put, None) => {
                with_headers(agent.put(url), &request.headers).send_empty()
            }
            (HttpMethod::Patch, Some(b)) => {
                with_headers(agent.patch(url), &request.headers).send(b.as_bytes())
            }
            (HttpMethod::Patch, None) => {
                with_headers(agent.patch(url), &request.headers).send_empty()
            }
        };

        let mut response = result.map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        // Bodies are relayed whole, so ureq's default 10 MiB read cap is lifted.
        let bytes = response
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_vec()
            .map_err(|e| ApiError::Transport(format!("failed to read response body: {e}")))?;
        let body = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) if (200..300).contains(&status) => {
                return Err(ApiError::Decode {
                    status,
                    message: e.utf8_error().to_string(),
                    body: String::from_utf8_lossy(e.as_bytes()).into_owned(),
                })
            }
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        };

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}
