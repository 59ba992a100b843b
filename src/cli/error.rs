use reqwest::StatusCode;
use thiserror::Error;

use crate::api::ApiError;

// Exit codes for CLI automation
pub const SUCCESS: i32 = 0;
pub const ERROR: i32 = 1;
pub const NOT_FOUND: i32 = 2;
pub const INVALID_INPUT: i32 = 3;
pub const AUTH_FAILED: i32 = 4;

/// Command-line input that cannot be turned into a call
#[derive(Error, Debug)]
pub enum InputError {
    #[error("invalid header {0:?}, expected NAME=VALUE")]
    Header(String),

    #[error("invalid HTTP method {0:?}")]
    Method(String),

    #[error("invalid expected status {0}")]
    Status(u16),

    #[error("request body is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read request body from {path:?}: {source}")]
    DataFile {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
}

/// Map a failed command to its process exit code
pub fn exit_code(err: &anyhow::Error) -> i32 {
    if err.downcast_ref::<InputError>().is_some() {
        return INVALID_INPUT;
    }

    match err.downcast_ref::<ApiError>() {
        Some(api) if api.is_auth_failure() => AUTH_FAILED,
        Some(api) if api.status_code() == Some(StatusCode::NOT_FOUND) => NOT_FOUND,
        Some(ApiError::Construction { .. }) => INVALID_INPUT,
        _ => ERROR,
    }
}
