use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Deserialize;

use super::{Login, LoginError};
use crate::config::{AuthMethod, SharedProfile};

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Client-credentials token exchange for service principals
pub struct ServicePrincipalLogin {
    http: reqwest::Client,
}

impl ServicePrincipalLogin {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Login for ServicePrincipalLogin {
    async fn login(&self, profile: &SharedProfile) -> Result<(), LoginError> {
        // snapshot what we need; the lock must not be held across the request
        let (base_url, tenant_id, client_id, client_secret) = {
            let profile = profile.read().await;
            (
                profile.base_url()?,
                profile.tenant_id.clone(),
                profile.client_id.clone(),
                profile.client_secret.clone(),
            )
        };
        if tenant_id.is_empty() {
            return Err(LoginError::MissingCredential("tenant_id", AuthMethod::ServicePrincipal));
        }
        if client_id.is_empty() || client_secret.is_empty() {
            return Err(LoginError::MissingCredential(
                "client_id/client_secret",
                AuthMethod::ServicePrincipal,
            ));
        }

        let token_url = format!(
            "{}/auth/{}/default/oauth2/token",
            base_url.as_str().trim_end_matches('/'),
            tenant_id
        );
        let form = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("grant_type", "client_credentials")
            .finish();

        tracing::debug!(url = %token_url, "Requesting service principal token");
        let response = self
            .http
            .post(&token_url)
            .basic_auth(&client_id, Some(&client_secret))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(ACCEPT, "application/json")
            .body(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            return Err(LoginError::Rejected {
                status,
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        let token: TokenResponse = serde_json::from_slice(&body)
            .map_err(|e| LoginError::InvalidResponse(e.to_string()))?;
        if token.access_token.is_empty() {
            return Err(LoginError::InvalidResponse("empty access_token".to_string()));
        }

        profile.write().await.token = token.access_token;
        tracing::info!("Service principal login successful");
        Ok(())
    }
}
