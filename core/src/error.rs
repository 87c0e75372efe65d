//! Error types for the LaunchDarkly API client.
//!
//! # Design
//! Every failure is surfaced to the caller as-is; nothing here is retried or
//! recovered. `Configuration` problems are caught before any I/O happens,
//! all other variants describe what went wrong on the wire.

/// Errors returned by `ApiClient` and the `execute` helper.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or invalid credentials, base URL, path, or path parameter.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Request { status: u16, body: String },

    /// The request never produced an HTTP response.
    #[error("transport error: {0}")]
    Transport(String),

    /// A 2xx response carried a body that is not valid JSON.
    #[error("could not decode HTTP {status} response: {message}")]
    Decode {
        status: u16,
        body: String,
        message: String,
    },

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl ApiError {
    /// HTTP status of the response that caused the error, when there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Request { status, .. } | ApiError::Decode { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw response body, when there was one.
    pub fn body(&self) -> Option<&str> {
        match self {
            ApiError::Request { body, .. } | ApiError::Decode { body, .. } => Some(body),
            _ => None,
        }
    }
}
