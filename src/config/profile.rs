use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use url::Url;

/// Credential cache shared between the API client and the login procedure.
///
/// Login overwrites the token in place; every request reads it fresh.
pub type SharedProfile = Arc<RwLock<Profile>>;

/// How requests made with a profile are authenticated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthMethod {
    #[default]
    None,
    Jwt,
    ServicePrincipal,
    Local,
}

impl std::fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AuthMethod::None => "none",
            AuthMethod::Jwt => "jwt",
            AuthMethod::ServicePrincipal => "service-principal",
            AuthMethod::Local => "local",
        };
        f.write_str(name)
    }
}

/// Identity asserted to a locally running platform stack
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalAuthOptions {
    #[serde(default)]
    pub principal_type: String,
    #[serde(default)]
    pub principal_id: String,
    #[serde(default)]
    pub tenant_id: String,
}

/// Access profile: where the platform lives and how to authenticate against it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub url: String,
    #[serde(default)]
    pub auth_method: AuthMethod,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tenant_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub client_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub client_secret: String,
    #[serde(default)]
    pub local_auth: LocalAuthOptions,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    /// The profile's URL cannot be parsed; the installation is broken rather than the call
    #[error("Failed to parse the url provided in profile ({url:?}): {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },

    #[error("Profile {0:?} not found")]
    ProfileNotFound(String),
}

impl Profile {
    pub fn new(url: impl Into<String>, auth_method: AuthMethod) -> Self {
        Self {
            url: url.into(),
            auth_method,
            ..Self::default()
        }
    }

    /// Parse the configured base URL
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.url).map_err(|source| ConfigError::InvalidUrl {
            url: self.url.clone(),
            source,
        })
    }

    pub fn has_token(&self) -> bool {
        !self.token.is_empty()
    }

    pub fn into_shared(self) -> SharedProfile {
        Arc::new(RwLock::new(self))
    }
}

/// Per-client settings that used to be process-wide switches
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Log a redacted, copy-paste-runnable curl command for every outbound request
    pub curlify: bool,
    pub user_agent: String,
    pub connect_timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            curlify: false,
            user_agent: format!("obsctl/{}", env!("CARGO_PKG_VERSION")),
            connect_timeout: Duration::from_secs(30),
        }
    }
}
