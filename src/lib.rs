pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod util;

pub use api::{ApiClient, ApiError, CallOptions};
pub use config::{Config, Profile};
