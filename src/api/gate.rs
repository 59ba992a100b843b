//! Credential acquisition and refresh in front of every call

use std::sync::Arc;

use super::error::{ApiError, ApiResult};
use super::request::RequestContext;
use crate::auth::Login;
use crate::config::SharedProfile;

/// Makes sure a call has a credential, and re-acquires it when the platform
/// stops accepting it.
///
/// Concurrent calls racing on an expired token each log in on their own;
/// nothing here de-duplicates logins.
#[derive(Clone)]
pub struct AuthGate {
    profile: SharedProfile,
    login: Arc<dyn Login>,
}

impl AuthGate {
    pub fn new(profile: SharedProfile, login: Arc<dyn Login>) -> Self {
        Self { profile, login }
    }

    pub fn profile(&self) -> &SharedProfile {
        &self.profile
    }

    /// Log in first if no token is cached
    pub async fn ensure_credential(&self) -> ApiResult<()> {
        if self.profile.read().await.has_token() {
            return Ok(());
        }

        tracing::info!("No auth token available, trying to log in");
        self.login().await
    }

    pub async fn login(&self) -> ApiResult<()> {
        self.login.login(&self.profile).await.map_err(ApiError::Login)
    }

    /// Log in again after the platform rejected the current token
    pub async fn refresh(&self) -> ApiResult<()> {
        tracing::warn!("Current token is no longer valid; trying to refresh");
        self.login.login(&self.profile).await.map_err(ApiError::Refresh)
    }

    /// Snapshot of the profile as it is right now, for building one request
    pub async fn context(&self) -> ApiResult<RequestContext> {
        let profile = self.profile.read().await;
        let base_url = profile.base_url()?;
        Ok(RequestContext::from_profile(&profile, base_url))
    }
}
