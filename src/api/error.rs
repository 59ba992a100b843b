//! Error type for platform API calls

use reqwest::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

use super::problem::{Problem, StatusError};
use crate::auth::LoginError;
use crate::config::ConfigError;

/// Longest slice of a response body quoted in a decode error
pub const DECODE_EXCERPT_LIMIT: usize = 256;

/// Errors returned by platform API calls
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request could not be assembled (URL, serialization, header values)
    #[error("failed to create a request for {target:?}: {message}")]
    Construction { target: String, message: String },

    /// The caller broke the calling contract; this is a bug in the calling code
    #[error("(bug) {0}")]
    ContractViolation(String),

    /// The profile is unusable (e.g. its base URL does not parse)
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Connection, DNS or TLS failure
    #[error("{method} request to {url:?} failed: {source}")]
    Transport {
        method: String,
        url: String,
        source: reqwest::Error,
    },

    #[error("{method} request to {url:?} was cancelled")]
    Cancelled { method: String, url: String },

    #[error("{method} request to {url:?} exceeded its deadline")]
    DeadlineExceeded { method: String, url: String },

    #[error("failed reading response to {method} to {url:?} (status {status}): {source}")]
    ReadBody {
        method: String,
        url: String,
        status: StatusCode,
        source: reqwest::Error,
    },

    /// No credential was cached and logging in failed
    #[error(transparent)]
    Login(LoginError),

    /// The platform rejected the credential and logging in again failed
    #[error("failed to login: {0}")]
    Refresh(#[source] LoginError),

    #[error(transparent)]
    Status(#[from] StatusError),

    #[error("failed to JSON-parse the response: {source} ({excerpt:?})")]
    Decode {
        source: serde_json::Error,
        excerpt: String,
    },

    #[error("failed to save the response payload as {path:?}: {source}")]
    SaveFile {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Result type for API calls
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn construction(target: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Construction {
            target: target.into(),
            message: message.to_string(),
        }
    }

    pub fn contract(message: impl Into<String>) -> Self {
        Self::ContractViolation(message.into())
    }

    pub fn decode(source: serde_json::Error, body: &[u8]) -> Self {
        let cut = body.len().min(DECODE_EXCERPT_LIMIT);
        Self::Decode {
            source,
            excerpt: String::from_utf8_lossy(&body[..cut]).into_owned(),
        }
    }

    /// HTTP status of a [`StatusError`], if this is one
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            Self::Status(err) => Some(err.status_code),
            _ => None,
        }
    }

    /// Structured problem carried by a [`StatusError`], if any
    pub fn problem(&self) -> Option<&Problem> {
        match self {
            Self::Status(err) => err.problem.as_ref(),
            _ => None,
        }
    }

    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Login(_) | Self::Refresh(_))
            || matches!(
                self.status_code(),
                Some(StatusCode::UNAUTHORIZED) | Some(StatusCode::FORBIDDEN)
            )
    }
}
