//! Platform API access: request building, auth refresh, error normalization

pub mod classify;
pub mod client;
pub mod curl;
pub mod display;
pub mod error;
pub mod gate;
pub mod problem;
pub mod progress;
pub mod request;

pub use client::{ApiClient, ApiClientBuilder, CallOptions, ResponsePayload, SOLUTION_FILE_NAME_HEADER};
pub use curl::{CommandLogger, TracingCommandLogger};
pub use display::abbreviate_string;
pub use error::{ApiError, ApiResult};
pub use problem::{Problem, StatusError};
pub use progress::{NoProgress, ProgressFactory, ProgressIndicator, Spinner, SpinnerFactory};
pub use request::RequestBody;
