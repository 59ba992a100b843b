pub mod profile;

pub use profile::{AuthMethod, ClientSettings, ConfigError, LocalAuthOptions, Profile, SharedProfile};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const DEFAULT_PROFILE: &str = "default";

/// Complete configuration (saved to config.toml)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_profile_name")]
    pub current_profile: String,
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

fn default_profile_name() -> String {
    DEFAULT_PROFILE.to_string()
}

impl Config {
    /// Load configuration from the config directory
    pub fn load() -> anyhow::Result<Self> {
        let config_path = crate::util::paths::get_config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit file; a missing file yields an empty config
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::info!("Config not found at {:?}, using defaults", path);
            return Ok(Self {
                current_profile: default_profile_name(),
                profiles: BTreeMap::new(),
            });
        }

        let content =
            std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse {:?}", path))
    }

    /// Save configuration to the config directory
    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = crate::util::paths::get_config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;

        // Atomic write using temp file + rename
        let temp_path = path.with_extension("toml.tmp");
        std::fs::write(&temp_path, &content).context("Failed to write temp config file")?;
        std::fs::rename(&temp_path, path).context("Failed to rename temp config file")?;

        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::ProfileNotFound(name.to_string()))
    }

    pub fn active_profile(&self) -> Result<&Profile, ConfigError> {
        self.profile(&self.current_profile)
    }

    /// Replace (or add) a profile, typically after login refreshed its token
    pub fn upsert_profile(&mut self, name: &str, profile: Profile) {
        self.profiles.insert(name.to_string(), profile);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_config_load_missing_file_uses_default() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&temp_dir.path().join("missing.toml")).unwrap();
        assert_eq!(config.current_profile, "default");
        assert!(config.profiles.is_empty());
    }

    #[test]
    fn test_config_load_valid_toml() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
current_profile = "prod"

[profiles.prod]
url = "https://prod.example.com"
auth_method = "local"

[profiles.prod.local_auth]
principal_type = "user"
principal_id = "dev@example.com"
tenant_id = "t-1"
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        let profile = config.active_profile().unwrap();
        assert_eq!(profile.auth_method, AuthMethod::Local);
        assert_eq!(profile.local_auth.principal_id, "dev@example.com");
    }

    #[test]
    fn test_active_profile_missing_is_reported() {
        let config = Config {
            current_profile: "staging".to_string(),
            profiles: BTreeMap::new(),
        };
        match config.active_profile() {
            Err(ConfigError::ProfileNotFound(name)) => assert_eq!(name, "staging"),
            other => panic!("Expected ProfileNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_config_load_invalid_toml_fails() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "profiles = [[[").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_config_save_load_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");

        let mut config = Config::default();
        config.current_profile = "default".to_string();
        let mut profile = Profile::new("https://a.example.com", AuthMethod::Jwt);
        profile.token = "secret".to_string();
        config.upsert_profile("default", profile);

        config.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_profile_is_reported() {
        let config = Config::default();
        let err = config.profile("nope").unwrap_err();
        assert_eq!(err.to_string(), "Profile \"nope\" not found");
    }
}
