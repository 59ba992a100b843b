//! Login procedures and auth-method specific request decoration
//!
//! The API client only needs a [`Login`] implementation: something that can
//! put a fresh token into the shared profile. [`ProfileLogin`] picks the
//! procedure from the profile's configured auth method.

pub mod local;
pub mod service_principal;

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

use crate::config::{AuthMethod, ConfigError, SharedProfile};

pub use local::add_local_auth_headers;
pub use service_principal::ServicePrincipalLogin;

/// Errors raised while obtaining a credential
#[derive(Error, Debug)]
pub enum LoginError {
    #[error("no authentication method is configured for this profile")]
    NotConfigured,

    #[error("auth method {0} cannot obtain a new token; update the profile with a valid token")]
    NotRefreshable(AuthMethod),

    #[error("profile is missing {0} required for {1} login")]
    MissingCredential(&'static str, AuthMethod),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("token request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("token request rejected with status {status}: {body}")]
    Rejected { status: StatusCode, body: String },

    #[error("unexpected token response: {0}")]
    InvalidResponse(String),
}

/// Obtains or refreshes the credential held in a profile, in place
#[async_trait]
pub trait Login: Send + Sync {
    async fn login(&self, profile: &SharedProfile) -> Result<(), LoginError>;
}

/// Login dispatching on the profile's auth method
pub struct ProfileLogin {
    service_principal: ServicePrincipalLogin,
}

impl ProfileLogin {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            service_principal: ServicePrincipalLogin::new(http),
        }
    }
}

#[async_trait]
impl Login for ProfileLogin {
    async fn login(&self, profile: &SharedProfile) -> Result<(), LoginError> {
        let method = profile.read().await.auth_method;
        tracing::info!(auth_method = %method, "Logging in");

        match method {
            AuthMethod::None => Err(LoginError::NotConfigured),
            AuthMethod::Jwt => Err(LoginError::NotRefreshable(method)),
            AuthMethod::ServicePrincipal => self.service_principal.login(profile).await,
            // the local stack trusts the identity headers, there is no token to obtain
            AuthMethod::Local => Ok(()),
        }
    }
}
