//! Client error types

use serde::Deserialize;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, B2Error>;

/// Client errors
#[derive(Error, Debug)]
pub enum B2Error {
    /// No authorization token or base URL is available; call `authorize` first
    #[error("Authentication details are missing")]
    Unauthenticated,

    /// The request could not be built from the given parameters
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// The server answered with a body that does not decode into the expected shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// A request URL could not be assembled
    #[error("URL construction failed: {0}")]
    UrlConstruction(String),

    /// A URL or header value could not be percent-encoded
    #[error("URL encoding failed: {0}")]
    UrlEncoding(String),

    /// Upload failed
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// B2 API error
    #[error("B2 error ({status} {code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Error body returned by every B2 endpoint on a non-2xx status.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    status: Option<u16>,
    code: String,
    #[serde(default)]
    message: String,
}

impl B2Error {
    /// Build an API error from a non-success response body
    pub fn from_api_body(body: &[u8], status: u16) -> Self {
        match serde_json::from_slice::<ApiErrorBody>(body) {
            Ok(parsed) => Self::Api {
                status: parsed.status.unwrap_or(status),
                code: parsed.code,
                message: parsed.message,
            },
            Err(_) => Self::Api {
                status,
                code: format!("http_{}", status),
                message: String::from_utf8_lossy(body).into_owned(),
            },
        }
    }

    /// Wrap a serde error raised while decoding a response body
    pub(crate) fn malformed(err: serde_json::Error) -> Self {
        Self::MalformedResponse(err.to_string())
    }

    /// Check if this error means the session has no usable credentials
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, Self::Unauthenticated)
            || matches!(self, Self::Api { code, .. } if code == "unauthorized" || code == "bad_auth_token")
    }

    /// Check if the server rejected the token because it expired
    pub fn is_expired_token(&self) -> bool {
        matches!(self, Self::Api { code, .. } if code == "expired_auth_token")
    }
}
