//! Credentials resolved by the host platform.

use std::fmt;

use crate::error::ApiError;

/// Base URL used when the caller's configuration does not provide one.
pub const DEFAULT_BASE_URL: &str = "https://app.launchdarkly.com";

pub const API_KEY_ENV: &str = "LAUNCHDARKLY_API_KEY";
pub const BASE_URL_ENV: &str = "LAUNCHDARKLY_BASE_URL";

/// Validated API key and base URL for one invocation.
///
/// The key is treated as an opaque secret: it is never logged and `Debug`
/// redacts it.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    api_key: String,
    base_url: String,
}

impl Credentials {
    /// Validate `api_key` and `base_url`, falling back to [`DEFAULT_BASE_URL`].
    ///
    /// The stored base URL has any trailing `/` trimmed so paths can be
    /// appended directly.
    pub fn new(api_key: &str, base_url: Option<&str>) -> Result<Self, ApiError> {
        if api_key.trim().is_empty() {
            return Err(ApiError::Configuration("API key is empty".to_string()));
        }
        let base_url = match base_url.map(str::trim) {
            Some(url) if !url.is_empty() => url,
            _ => DEFAULT_BASE_URL,
        };
        let parsed = url::Url::parse(base_url)
            .map_err(|e| ApiError::Configuration(format!("invalid base URL `{base_url}`: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.cannot_be_a_base() {
            return Err(ApiError::Configuration(format!(
                "base URL `{base_url}` is not an absolute http(s) URL"
            )));
        }
        Ok(Self {
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Read `LAUNCHDARKLY_API_KEY` and the optional `LAUNCHDARKLY_BASE_URL`.
    pub fn from_env() -> Result<Self, ApiError> {
        let api_key = std::env::var(API_KEY_ENV)
            .map_err(|_| ApiError::Configuration(format!("{API_KEY_ENV} is not set")))?;
        let base_url = std::env::var(BASE_URL_ENV).ok();
        Self::new(&api_key, base_url.as_deref())
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}
