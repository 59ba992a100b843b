//! Request construction: URL composition, body encoding and header precedence

use reqwest::Method;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use url::Url;

use super::curl::{curl_command, CommandLogger};
use super::error::{ApiError, ApiResult};
use crate::auth::add_local_auth_headers;
use crate::config::{AuthMethod, LocalAuthOptions, Profile};

const JSON: &str = "application/json";
const MERGE_PATCH_JSON: &str = "application/merge-patch+json";

/// Body supplied by the caller
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Sent as JSON; the builder provides the Content-Type
    Json(Value),
    /// Sent verbatim; the caller must provide the Content-Type
    Raw(Vec<u8>),
}

/// Everything one call needs to know about where and as whom to send
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub base_url: Url,
    pub token: String,
    pub auth_method: AuthMethod,
    pub local_auth: LocalAuthOptions,
}

impl RequestContext {
    /// Snapshot a profile whose base URL has already been parsed
    pub fn from_profile(profile: &Profile, base_url: Url) -> Self {
        Self {
            base_url,
            token: profile.token.clone(),
            auth_method: profile.auth_method,
            local_auth: profile.local_auth.clone(),
        }
    }
}

/// Fully addressed request, ready to hand to the HTTP client
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl PreparedRequest {
    pub fn into_reqwest(self, client: &reqwest::Client) -> reqwest::RequestBuilder {
        let builder = client.request(self.method, self.url).headers(self.headers);
        match self.body {
            Some(body) => builder.body(body),
            None => builder,
        }
    }
}

/// Builds requests and, when curlify is on, reports their curl equivalent
#[derive(Clone, Default)]
pub struct RequestBuilder {
    command_logger: Option<Arc<dyn CommandLogger>>,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report every built request to `logger`
    pub fn with_command_logger(logger: Arc<dyn CommandLogger>) -> Self {
        Self {
            command_logger: Some(logger),
        }
    }

    pub fn build(
        &self,
        ctx: &RequestContext,
        method: &Method,
        path: &str,
        body: Option<&RequestBody>,
        headers: &HashMap<String, String>,
    ) -> ApiResult<PreparedRequest> {
        // header names compare case-insensitively
        let explicit = |key: &str| {
            headers
                .iter()
                .any(|(k, v)| k.eq_ignore_ascii_case(key) && !v.is_empty())
        };

        // JSON-encode unless the caller states the content type themselves.
        // Raw bytes are never JSON-encoded: without an explicit Content-Type
        // they are rejected rather than re-encoded as a JSON byte array.
        let (body, jsonify) = match (body, explicit("Content-Type")) {
            (None, _) => (None, false),
            (Some(RequestBody::Json(value)), false) => {
                let bytes = serde_json::to_vec(value).map_err(|e| {
                    ApiError::construction(path, format!("failed to marshal body data: {}", e))
                })?;
                (Some(bytes), true)
            }
            (Some(RequestBody::Raw(bytes)), true) => (Some(bytes.clone()), false),
            (Some(RequestBody::Json(_)), true) => {
                return Err(ApiError::contract(
                    "HTTP request body must be raw bytes if Content-Type is provided, found a JSON value instead",
                ));
            }
            (Some(RequestBody::Raw(_)), false) => {
                return Err(ApiError::contract(
                    "raw HTTP request body requires an explicit Content-Type header",
                ));
            }
        };

        let url = join_url(&ctx.base_url, path)?;

        let mut header_map = HeaderMap::new();
        if jsonify {
            let content_type = if *method == Method::PATCH { MERGE_PATCH_JSON } else { JSON };
            header_map.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
        if !explicit("Accept") {
            header_map.insert(ACCEPT, HeaderValue::from_static(JSON));
        }
        if !explicit("Authorization") {
            let mut bearer = HeaderValue::from_str(&format!("Bearer {}", ctx.token))
                .map_err(|e| ApiError::construction(url.as_str(), format!("invalid token: {}", e)))?;
            bearer.set_sensitive(true);
            header_map.insert(AUTHORIZATION, bearer);
        }
        if ctx.auth_method == AuthMethod::Local {
            add_local_auth_headers(&mut header_map, &ctx.local_auth).map_err(|e| {
                ApiError::construction(url.as_str(), format!("invalid local auth options: {}", e))
            })?;
        }

        // explicit headers win over everything synthesized above
        for (key, value) in headers.iter().filter(|(_, v)| !v.is_empty()) {
            let name = HeaderName::from_bytes(key.as_bytes()).map_err(|e| {
                ApiError::construction(url.as_str(), format!("invalid header name {:?}: {}", key, e))
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                ApiError::construction(url.as_str(), format!("invalid value for header {:?}: {}", key, e))
            })?;
            header_map.insert(name, value);
        }

        let request = PreparedRequest {
            method: method.clone(),
            url,
            headers: header_map,
            body,
        };

        if let Some(logger) = &self.command_logger {
            logger.log_command(&curl_command(&request));
        }

        Ok(request)
    }
}

/// Append `path` (optionally carrying `?query`) to `base`.
///
/// Path and query are attached separately and as given, so escapes already
/// present in object identifiers are not escaped a second time.
pub fn join_url(base: &Url, path: &str) -> ApiResult<Url> {
    if base.cannot_be_a_base() {
        return Err(ApiError::construction(base.as_str(), "base URL cannot carry a path"));
    }

    let (path, query) = match path.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (path, None),
    };

    let mut url = base.clone();
    let relative = path.trim_start_matches('/');
    if !relative.is_empty() {
        let joined = format!("{}/{}", base.path().trim_end_matches('/'), relative);
        url.set_path(&joined);
    }
    url.set_query(query.filter(|q| !q.is_empty()));
    url.set_fragment(None);
    Ok(url)
}
