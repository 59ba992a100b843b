//! Platform API client
//!
//! Every call runs the same small state machine:
//!
//! ```text
//! Idle -> Sending(first) -> Success
//!                        -> AuthRetry -> Sending(after refresh) -> Success | Failure
//!                        -> Failure
//! ```
//!
//! Only a 403 on the first attempt leads to `AuthRetry`; the attempt after a
//! refresh has no such transition, so a call is retried at most once.

use reqwest::header::{CONTENT_TYPE, HeaderMap};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::classify::classify;
use super::curl::{CommandLogger, TracingCommandLogger};
use super::display::url_display_path;
use super::error::{ApiError, ApiResult};
use super::gate::AuthGate;
use super::progress::{NoProgress, ProgressFactory, ProgressIndicator, ProgressSession, SpinnerFactory};
use super::request::{PreparedRequest, RequestBody, RequestBuilder};
use crate::auth::{Login, ProfileLogin};
use crate::config::{ClientSettings, SharedProfile};

/// Caller header naming the file that downloaded archives are written to
pub const SOLUTION_FILE_NAME_HEADER: &str = "solutionFileName";

const FILE_CONTENT_TYPES: &[&str] = &["application/octet-stream", "application/zip"];

/// Optional per-call settings
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// Extra request headers; these override anything the client would set
    pub headers: HashMap<String, String>,
    /// Filled with the response headers when the call succeeds
    pub response_headers: Option<HeaderMap>,
    /// Statuses the caller anticipates; their failures are logged as info, not error
    pub expected_errors: Vec<StatusCode>,
    /// Suppress the progress indicator
    pub quiet: bool,
    /// Cancels the call, including a retry in progress
    pub cancellation: Option<CancellationToken>,
    /// Deadline shared by all attempts of the call
    pub deadline: Option<Instant>,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn expect_error(mut self, status: StatusCode) -> Self {
        self.expected_errors.push(status);
        self
    }

    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }

    pub fn save_to(self, file_name: impl Into<String>) -> Self {
        self.header(SOLUTION_FILE_NAME_HEADER, file_name)
    }
}

/// What a successful call produced
#[derive(Debug, Clone, PartialEq)]
pub enum ResponsePayload {
    /// Body to be decoded as JSON
    Json(Vec<u8>),
    /// Nothing to decode: empty body, 303, or DELETE
    Empty,
    /// Body was written to this file
    Saved(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    First,
    AfterRefresh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transition {
    Succeed,
    RefreshAndRetry,
    Fail,
}

/// 2xx and 303 succeed; 303 answers updates that changed the object's identity
fn next_transition(attempt: Attempt, status: StatusCode) -> Transition {
    match (attempt, status) {
        (_, status) if status.is_success() || status == StatusCode::SEE_OTHER => Transition::Succeed,
        (Attempt::First, StatusCode::FORBIDDEN) => Transition::RefreshAndRetry,
        _ => Transition::Fail,
    }
}

/// Fully buffered response
struct Received {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

/// Cancellation and deadline of one call
struct CallScope {
    cancellation: CancellationToken,
    deadline: Option<Instant>,
}

impl CallScope {
    fn new(options: &CallOptions) -> Self {
        Self {
            cancellation: options.cancellation.clone().unwrap_or_default(),
            deadline: options.deadline,
        }
    }

    async fn run<T>(
        &self,
        method: &str,
        url: &str,
        work: impl Future<Output = ApiResult<T>>,
    ) -> ApiResult<T> {
        let cancellable = async {
            tokio::select! {
                result = work => result,
                _ = self.cancellation.cancelled() => Err(ApiError::Cancelled {
                    method: method.to_string(),
                    url: url.to_string(),
                }),
            }
        };

        match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, cancellable)
                .await
                .unwrap_or_else(|_| {
                    Err(ApiError::DeadlineExceeded {
                        method: method.to_string(),
                        url: url.to_string(),
                    })
                }),
            None => cancellable.await,
        }
    }
}

/// Client for the platform API
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    gate: AuthGate,
    builder: RequestBuilder,
    progress: Arc<dyn ProgressFactory>,
}

impl ApiClient {
    /// Client for `profile` with default login, spinner and settings
    pub fn new(profile: SharedProfile) -> ApiResult<Self> {
        Self::builder(profile).build()
    }

    pub fn builder(profile: SharedProfile) -> ApiClientBuilder {
        ApiClientBuilder::new(profile)
    }

    /// The credential cache this client reads and refreshes
    pub fn profile(&self) -> &SharedProfile {
        self.gate.profile()
    }

    /// Log in now, regardless of whether a token is cached
    pub async fn login(&self) -> ApiResult<()> {
        self.gate.login().await
    }

    /// GET and decode the response as JSON
    pub async fn json_get<T: DeserializeOwned>(
        &self,
        path: &str,
        options: &mut CallOptions,
    ) -> ApiResult<Option<T>> {
        self.json_request::<(), T>(Method::GET, path, None, options).await
    }

    /// DELETE; the response body is never decoded
    pub async fn json_delete(&self, path: &str, options: &mut CallOptions) -> ApiResult<()> {
        self.execute(Method::DELETE, path, None, options).await.map(|_| ())
    }

    pub async fn json_post<B, T>(&self, path: &str, body: &B, options: &mut CallOptions) -> ApiResult<Option<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.json_request(Method::POST, path, Some(body), options).await
    }

    pub async fn json_put<B, T>(&self, path: &str, body: &B, options: &mut CallOptions) -> ApiResult<Option<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.json_request(Method::PUT, path, Some(body), options).await
    }

    /// PATCH with a JSON merge-patch body
    pub async fn json_patch<B, T>(&self, path: &str, body: &B, options: &mut CallOptions) -> ApiResult<Option<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.json_request(Method::PATCH, path, Some(body), options).await
    }

    /// Any method with a JSON body and response.
    ///
    /// Returns `Ok(None)` when the call succeeded without a body to decode.
    pub async fn json_request<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        options: &mut CallOptions,
    ) -> ApiResult<Option<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = body
            .map(|b| {
                serde_json::to_value(b).map(RequestBody::Json).map_err(|e| {
                    ApiError::construction(path, format!("failed to marshal body data: {}", e))
                })
            })
            .transpose()?;
        let payload = self.execute(method, path, body, options).await?;
        decode_payload(payload)
    }

    /// GET where the caller sets `Accept` through `options.headers`
    pub async fn http_get<T: DeserializeOwned>(
        &self,
        path: &str,
        options: &mut CallOptions,
    ) -> ApiResult<Option<T>> {
        let payload = self.execute(Method::GET, path, None, options).await?;
        decode_payload(payload)
    }

    /// POST of raw bytes; `options.headers` must carry the `Content-Type`
    pub async fn http_post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Vec<u8>,
        options: &mut CallOptions,
    ) -> ApiResult<Option<T>> {
        let payload = self
            .execute(Method::POST, path, Some(RequestBody::Raw(body)), options)
            .await?;
        decode_payload(payload)
    }

    /// Run one call: credential check, send, at most one refresh-and-retry,
    /// then classification and payload handling.
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<RequestBody>,
        options: &mut CallOptions,
    ) -> ApiResult<ResponsePayload> {
        tracing::info!(method = %method, path, "Calling the observability platform API");

        let scope = CallScope::new(options);
        let mut indicator: Box<dyn ProgressIndicator> = if options.quiet {
            Box::new(NoProgress)
        } else {
            self.progress.create()
        };

        // login runs under the call's cancellation and deadline like the sends
        scope
            .run(method.as_str(), path, self.gate.ensure_credential())
            .await?;

        let mut attempt = Attempt::First;
        let received = loop {
            let ctx = self.gate.context().await?;
            let request = self
                .builder
                .build(&ctx, &method, path, body.as_ref(), &options.headers)?;

            let label = match attempt {
                Attempt::First => format!(
                    "Platform API call ({} {})",
                    request.method,
                    url_display_path(&request.url)
                ),
                Attempt::AfterRefresh => format!(
                    "Platform API call, retry after login ({} {})",
                    request.method,
                    url_display_path(&request.url)
                ),
            };
            let session = ProgressSession::start(indicator.as_mut(), &label);
            let received = self.send(&scope, request).await?;

            match next_transition(attempt, received.status) {
                Transition::Succeed => {
                    session.finish(true);
                    break received;
                }
                Transition::RefreshAndRetry => {
                    session.hide();
                    scope.run(method.as_str(), path, self.gate.refresh()).await?;
                    tracing::info!("Retrying the request with the refreshed token");
                    attempt = Attempt::AfterRefresh;
                }
                Transition::Fail => {
                    session.finish(false);
                    let status = received.status.as_u16();
                    if options.expected_errors.contains(&received.status) {
                        tracing::info!(status, "Platform API call failed with expected error");
                    } else {
                        tracing::error!(status, "Platform API call failed");
                    }
                    return Err(classify(received.status, &received.body).into());
                }
            }
        };

        options.response_headers = Some(received.headers.clone());
        process_body(&method, received, options).await
    }

    async fn send(&self, scope: &CallScope, request: PreparedRequest) -> ApiResult<Received> {
        let method = request.method.to_string();
        let url = request.url.to_string();
        let pending = request.into_reqwest(&self.http);

        let exchange = async {
            let response = pending.send().await.map_err(|source| ApiError::Transport {
                method: method.clone(),
                url: url.clone(),
                source,
            })?;

            // buffer the whole body; both the success and the error path read it
            let status = response.status();
            let headers = response.headers().clone();
            let body = response.bytes().await.map_err(|source| ApiError::ReadBody {
                method: method.clone(),
                url: url.clone(),
                status,
                source,
            })?
            .to_vec();
            tracing::debug!(status = status.as_u16(), bytes = body.len(), "Received response");

            Ok::<_, ApiError>(Received {
                status,
                headers,
                body,
            })
        };

        scope.run(&method, &url, exchange).await
    }
}

/// Decide what to do with a successful response body.
///
/// The declared content type decides, not the request method, except that
/// DELETE responses are never looked at.
async fn process_body(
    method: &Method,
    received: Received,
    options: &CallOptions,
) -> ApiResult<ResponsePayload> {
    if *method == Method::DELETE {
        return Ok(ResponsePayload::Empty);
    }

    let content_type = received
        .headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::trim)
        .unwrap_or_default();

    if FILE_CONTENT_TYPES.contains(&content_type) {
        let file_name = options
            .headers
            .get(SOLUTION_FILE_NAME_HEADER)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                ApiError::contract(format!(
                    "filename not provided for response type {:?}",
                    content_type
                ))
            })?;
        let path = PathBuf::from(file_name);
        tokio::fs::write(&path, &received.body)
            .await
            .map_err(|source| ApiError::SaveFile {
                path: path.clone(),
                source,
            })?;
        tracing::info!(path = ?path, bytes = received.body.len(), "Saved response payload");
        return Ok(ResponsePayload::Saved(path));
    }

    // a 303 body is never JSON
    if received.body.is_empty() || received.status == StatusCode::SEE_OTHER {
        return Ok(ResponsePayload::Empty);
    }

    Ok(ResponsePayload::Json(received.body))
}

fn decode_payload<T: DeserializeOwned>(payload: ResponsePayload) -> ApiResult<Option<T>> {
    match payload {
        ResponsePayload::Json(bytes) => serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| ApiError::decode(e, &bytes)),
        ResponsePayload::Empty | ResponsePayload::Saved(_) => Ok(None),
    }
}

/// Builder for [`ApiClient`]
pub struct ApiClientBuilder {
    profile: SharedProfile,
    settings: ClientSettings,
    login: Option<Arc<dyn Login>>,
    progress: Option<Arc<dyn ProgressFactory>>,
    command_logger: Option<Arc<dyn CommandLogger>>,
}

impl ApiClientBuilder {
    fn new(profile: SharedProfile) -> Self {
        Self {
            profile,
            settings: ClientSettings::default(),
            login: None,
            progress: None,
            command_logger: None,
        }
    }

    pub fn settings(mut self, settings: ClientSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Replace the login procedure (defaults to [`ProfileLogin`])
    pub fn login(mut self, login: Arc<dyn Login>) -> Self {
        self.login = Some(login);
        self
    }

    /// Replace the progress indicator (defaults to a terminal spinner)
    pub fn progress(mut self, progress: Arc<dyn ProgressFactory>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Where curl equivalents go when curlify is enabled (defaults to `tracing`)
    pub fn command_logger(mut self, logger: Arc<dyn CommandLogger>) -> Self {
        self.command_logger = Some(logger);
        self
    }

    pub fn build(self) -> ApiResult<ApiClient> {
        // redirects are surfaced, not followed: a 303 is a result in itself
        let http = reqwest::Client::builder()
            .user_agent(&self.settings.user_agent)
            .connect_timeout(self.settings.connect_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| ApiError::construction("http client", e))?;

        let login = self
            .login
            .unwrap_or_else(|| Arc::new(ProfileLogin::new(http.clone())));
        let progress = self.progress.unwrap_or_else(|| Arc::new(SpinnerFactory));
        let builder = if self.settings.curlify {
            RequestBuilder::with_command_logger(
                self.command_logger
                    .unwrap_or_else(|| Arc::new(TracingCommandLogger)),
            )
        } else {
            RequestBuilder::new()
        };

        Ok(ApiClient {
            http,
            gate: AuthGate::new(self.profile, login),
            builder,
            progress,
        })
    }
}
