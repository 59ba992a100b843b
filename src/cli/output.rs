use serde_json::Value;

use crate::api::{ApiError, ResponsePayload};

/// Pretty-print a JSON document, falling back to the raw text if it is not JSON
pub fn format_json_bytes(body: &[u8]) -> String {
    match serde_json::from_slice::<Value>(body) {
        Ok(value) => format_value(&value),
        Err(_) => String::from_utf8_lossy(body).into_owned(),
    }
}

pub fn format_value(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Text printed to stdout for a successful call, if any
pub fn format_payload(payload: &ResponsePayload) -> Option<String> {
    match payload {
        ResponsePayload::Json(body) => Some(format_json_bytes(body)),
        ResponsePayload::Empty => None,
        ResponsePayload::Saved(path) => Some(format!("Saved response to {}", path.display())),
    }
}

/// Error report for stderr; includes the structured problem when the platform sent one
pub fn format_error(err: &anyhow::Error) -> String {
    let mut output = format!("Error: {}", err);

    if let Some(problem) = err.downcast_ref::<ApiError>().and_then(ApiError::problem) {
        if !problem.problem_type.is_empty() {
            output.push_str(&format!("\n  type: {}", problem.problem_type));
        }
        if !problem.instance.is_empty() {
            output.push_str(&format!("\n  instance: {}", problem.instance));
        }
        for (key, value) in &problem.extensions {
            output.push_str(&format!("\n  {}: {}", key, value));
        }
    }

    output
}
