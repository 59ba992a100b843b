use super::error::{self, InputError};
use super::output;
use super::{BodyArgs, CallArgs, Commands};
use crate::api::{ApiClient, CallOptions, RequestBody};
use anyhow::Result;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Handle a CLI command and return exit code
pub async fn handle_command(command: Commands, client: &ApiClient, quiet: bool) -> i32 {
    let cancellation = CancellationToken::new();
    let watcher = tokio::spawn(cancel_on_ctrl_c(cancellation.clone()));

    let result = match command {
        Commands::Get { path, accept, call } => {
            handle_get(client, &path, accept, &call, quiet, &cancellation).await
        }
        Commands::Delete { path, call } => {
            handle_delete(client, &path, &call, quiet, &cancellation).await
        }
        Commands::Post { path, body, call } => {
            handle_with_body(client, Method::POST, &path, &body, &call, quiet, &cancellation).await
        }
        Commands::Put { path, body, call } => {
            handle_with_body(client, Method::PUT, &path, &body, &call, quiet, &cancellation).await
        }
        Commands::Patch { path, body, call } => {
            handle_with_body(client, Method::PATCH, &path, &body, &call, quiet, &cancellation).await
        }
        Commands::Request {
            method,
            path,
            body,
            call,
        } => match parse_method(&method) {
            Ok(method) => {
                handle_with_body(client, method, &path, &body, &call, quiet, &cancellation).await
            }
            Err(e) => Err(e.into()),
        },
        Commands::Login => handle_login(client, &cancellation).await,
    };

    watcher.abort();

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", output::format_error(&e));
            error::exit_code(&e)
        }
    }
}

async fn cancel_on_ctrl_c(token: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::warn!("Interrupted, cancelling the call in flight");
        token.cancel();
    }
}

/// GET a resource; JSON unless an explicit Accept asks for something else
async fn handle_get(
    client: &ApiClient,
    path: &str,
    accept: Option<String>,
    call: &CallArgs,
    quiet: bool,
    cancellation: &CancellationToken,
) -> Result<i32> {
    let mut options = call_options(call, quiet, cancellation)?;

    match accept {
        Some(accept) => {
            options.headers.insert(ACCEPT.to_string(), accept);
            let payload = client.execute(Method::GET, path, None, &mut options).await?;
            print_if_some(output::format_payload(&payload));
        }
        None => {
            let value: Option<Value> = client.json_get(path, &mut options).await?;
            print_value(value);
        }
    }

    Ok(error::SUCCESS)
}

async fn handle_delete(
    client: &ApiClient,
    path: &str,
    call: &CallArgs,
    quiet: bool,
    cancellation: &CancellationToken,
) -> Result<i32> {
    let mut options = call_options(call, quiet, cancellation)?;
    client.json_delete(path, &mut options).await?;
    Ok(error::SUCCESS)
}

/// Send a request carrying an optional body.
///
/// Without `--content-type` the body is JSON and goes through the JSON verbs;
/// with it the bytes are sent untouched.
async fn handle_with_body(
    client: &ApiClient,
    method: Method,
    path: &str,
    body: &BodyArgs,
    call: &CallArgs,
    quiet: bool,
    cancellation: &CancellationToken,
) -> Result<i32> {
    let mut options = call_options(call, quiet, cancellation)?;

    match read_body(body).await? {
        Some(RequestBody::Raw(bytes)) => {
            if let Some(content_type) = &body.content_type {
                options
                    .headers
                    .insert(CONTENT_TYPE.to_string(), content_type.clone());
            }
            let payload = if method == Method::POST {
                client.http_post::<Value>(path, bytes, &mut options).await?.map(|v| output::format_value(&v))
            } else {
                let payload = client
                    .execute(method, path, Some(RequestBody::Raw(bytes)), &mut options)
                    .await?;
                output::format_payload(&payload)
            };
            print_if_some(payload);
        }
        Some(RequestBody::Json(value)) => {
            let response: Option<Value> = match method {
                Method::POST => client.json_post(path, &value, &mut options).await?,
                Method::PUT => client.json_put(path, &value, &mut options).await?,
                Method::PATCH => client.json_patch(path, &value, &mut options).await?,
                other => client.json_request(other, path, Some(&value), &mut options).await?,
            };
            print_value(response);
        }
        None => {
            let response: Option<Value> = client
                .json_request::<Value, Value>(method, path, None, &mut options)
                .await?;
            print_value(response);
        }
    }

    Ok(error::SUCCESS)
}

async fn handle_login(client: &ApiClient, cancellation: &CancellationToken) -> Result<i32> {
    tokio::select! {
        result = client.login() => result?,
        _ = cancellation.cancelled() => anyhow::bail!("login cancelled"),
    }
    let method = client.profile().read().await.auth_method;
    println!("Logged in ({})", method);
    Ok(error::SUCCESS)
}

/// Translate call flags into per-call options
pub fn call_options(
    call: &CallArgs,
    quiet: bool,
    cancellation: &CancellationToken,
) -> Result<CallOptions, InputError> {
    let mut options = CallOptions::new();

    for header in &call.headers {
        let (name, value) = header
            .split_once('=')
            .filter(|(name, _)| !name.trim().is_empty())
            .ok_or_else(|| InputError::Header(header.clone()))?;
        options = options.header(name.trim(), value.trim());
    }

    for &status in &call.expected {
        let status = StatusCode::from_u16(status).map_err(|_| InputError::Status(status))?;
        options = options.expect_error(status);
    }

    if let Some(file_name) = &call.output {
        options = options.save_to(file_name.clone());
    }

    if let Some(seconds) = call.timeout {
        options.deadline = Some(tokio::time::Instant::now() + Duration::from_secs(seconds));
    }

    if quiet {
        options = options.quiet();
    }

    options.cancellation = Some(cancellation.clone());
    Ok(options)
}

/// Load the request body named by the flags, if any
pub async fn read_body(body: &BodyArgs) -> Result<Option<RequestBody>, InputError> {
    let bytes = match (&body.data, &body.data_file) {
        (Some(data), _) => data.clone().into_bytes(),
        (None, Some(path)) => tokio::fs::read(path)
            .await
            .map_err(|source| InputError::DataFile {
                path: path.clone(),
                source,
            })?,
        (None, None) => return Ok(None),
    };

    if body.content_type.is_some() {
        return Ok(Some(RequestBody::Raw(bytes)));
    }

    let value = serde_json::from_slice(&bytes)?;
    Ok(Some(RequestBody::Json(value)))
}

fn parse_method(method: &str) -> Result<Method, InputError> {
    Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .map_err(|_| InputError::Method(method.to_string()))
}

fn print_value(value: Option<Value>) {
    print_if_some(value.map(|v| output::format_value(&v)));
}

fn print_if_some(text: Option<String>) {
    if let Some(text) = text {
        println!("{}", text);
    }
}
