//! Turns error responses into a [`StatusError`]
//!
//! Interpretations are tried from the most specific to the most generic and
//! the first one that applies wins. The last one always applies, so
//! classification itself never fails.

use reqwest::StatusCode;
use serde_json::Value;

use super::problem::{status_text, Problem, StatusError};

/// One interpretation of an error body
type Classifier = fn(StatusCode, &[u8]) -> Option<StatusError>;

const CLASSIFIERS: &[Classifier] = &[as_problem, as_json_value, as_text];

/// Classify a non-success response body
pub fn classify(status: StatusCode, body: &[u8]) -> StatusError {
    CLASSIFIERS
        .iter()
        .find_map(|classifier| classifier(status, body))
        .unwrap_or_else(|| StatusError::new(status, format!("status: {}", status.as_u16())))
}

/// `application/problem+json`, even when the content type says otherwise
fn as_problem(status: StatusCode, body: &[u8]) -> Option<StatusError> {
    // `null` decodes to an empty problem
    let decoded: Option<Problem> = serde_json::from_slice(body).ok()?;
    let mut problem = decoded.unwrap_or_default();
    if problem.status == 0 {
        problem.status = status.as_u16();
    }
    Some(StatusError::with_problem(status, status_text(status), problem))
}

/// Any other JSON document
fn as_json_value(status: StatusCode, body: &[u8]) -> Option<StatusError> {
    let value: Value = serde_json::from_slice(body).ok()?;
    Some(StatusError::new(
        status,
        format!("status {}, error response: {}", status.as_u16(), value),
    ))
}

/// Raw text, or the reason phrase when there is no body
fn as_text(status: StatusCode, body: &[u8]) -> Option<StatusError> {
    let text = String::from_utf8_lossy(body);
    let text = if text.is_empty() {
        status_text(status).into()
    } else {
        text
    };
    Some(StatusError::new(
        status,
        format!("status: {} {}", status.as_u16(), text),
    ))
}
