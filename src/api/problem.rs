//! Error payload types returned by the platform
//!
//! [`Problem`] mirrors the `application/problem+json` shape; [`StatusError`]
//! is what every non-success response is normalized into.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// RFC 7807 style error body.
///
/// Every field is optional so that any JSON object decodes; fields the
/// platform adds beyond the standard ones are kept in `extensions`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Problem {
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub problem_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub detail: String,
    #[serde(skip_serializing_if = "is_zero")]
    pub status: u16,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub instance: String,
    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

fn is_zero(status: &u16) -> bool {
    *status == 0
}

impl std::fmt::Display for Problem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let title = if !self.title.is_empty() {
            self.title.as_str()
        } else if !self.problem_type.is_empty() {
            self.problem_type.as_str()
        } else {
            "unspecified problem"
        };
        write!(f, "{}", title)?;
        if !self.detail.is_empty() {
            write!(f, ": {}", self.detail)?;
        }
        Ok(())
    }
}

/// Normalized error for any non-success HTTP status
#[derive(Debug, Clone, PartialEq)]
pub struct StatusError {
    pub message: String,
    pub status_code: StatusCode,
    pub problem: Option<Problem>,
}

impl StatusError {
    pub fn new(status_code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code,
            problem: None,
        }
    }

    pub fn with_problem(status_code: StatusCode, message: impl Into<String>, problem: Problem) -> Self {
        Self {
            message: message.into(),
            status_code,
            problem: Some(problem),
        }
    }
}

impl std::fmt::Display for StatusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.problem {
            Some(problem) => write!(f, "{}: {}", self.message, problem),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for StatusError {}

/// Standard reason phrase for a status, empty for unregistered codes
pub fn status_text(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("")
}
