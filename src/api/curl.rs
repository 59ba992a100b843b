//! Shell-reproducible rendering of outbound requests for diagnostics

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};

use super::request::PreparedRequest;

const REDACTED_AUTHORIZATION: &str = "Bearer REDACTED";
const REDACTED_UPLOAD: &str = "@/file/path/REDACTED";

/// Receives the curl equivalent of each outbound request
pub trait CommandLogger: Send + Sync {
    fn log_command(&self, command: &str);
}

/// Logs curl commands as structured `tracing` events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingCommandLogger;

impl CommandLogger for TracingCommandLogger {
    fn log_command(&self, command: &str) {
        tracing::info!(command, "curl command equivalent");
    }
}

/// Render `request` as a curl command line.
///
/// The bearer token is never included, and multipart uploads are replaced by
/// a placeholder file reference. The request itself is only read.
pub fn curl_command(request: &PreparedRequest) -> String {
    let mut parts = vec![
        "curl".to_string(),
        "-X".to_string(),
        shell_quote(request.method.as_str()),
    ];

    let is_multipart = request
        .headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"));
    if is_multipart {
        parts.push("-d".to_string());
        parts.push(shell_quote(REDACTED_UPLOAD));
    } else if let Some(body) = &request.body {
        parts.push("-d".to_string());
        parts.push(shell_quote(&String::from_utf8_lossy(body)));
    }

    let mut headers: Vec<(String, String)> = request
        .headers
        .iter()
        .filter(|(name, _)| *name != AUTHORIZATION)
        .map(|(name, value)| {
            (
                canonical_header_name(name.as_str()),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();
    headers.push(("Authorization".to_string(), REDACTED_AUTHORIZATION.to_string()));
    headers.sort();

    for (name, value) in headers {
        parts.push("-H".to_string());
        parts.push(shell_quote(&format!("{}: {}", name, value)));
    }

    parts.push(shell_quote(request.url.as_str()));
    parts.join(" ")
}

/// Single-quote `s` for POSIX shells
fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// `content-type` -> `Content-Type`
fn canonical_header_name(name: &str) -> String {
    name.split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}
