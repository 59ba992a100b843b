use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::RwLock;

// Global config directory override (for --config flag and tests)
static CONFIG_DIR_OVERRIDE: RwLock<Option<PathBuf>> = RwLock::new(None);

/// Environment variable naming an alternative config directory
pub const CONFIG_DIR_ENV: &str = "OBSCTL_CONFIG_DIR";

/// Set config directory override (used by --config flag and tests)
pub fn set_config_dir_override(path: Option<PathBuf>) {
    match CONFIG_DIR_OVERRIDE.write() {
        Ok(mut guard) => *guard = path,
        Err(poisoned) => *poisoned.into_inner() = path,
    }
}

/// Get current config directory override
pub fn get_config_dir_override() -> Option<PathBuf> {
    match CONFIG_DIR_OVERRIDE.read() {
        Ok(guard) => guard.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

/// Find config directory by searching in priority order:
/// 1. Override from --config flag or set_config_dir_override() (highest priority)
/// 2. Environment variable OBSCTL_CONFIG_DIR
/// 3. User config directory (`~/.config/obsctl/` on Unix, `%APPDATA%\obsctl\` on Windows)
///
/// The directory is created if it does not exist yet.
pub fn find_config_directory() -> Result<PathBuf> {
    // Priority 1: Override from --config flag or tests
    if let Some(override_path) = get_config_dir_override() {
        tracing::debug!("Using config directory override: {:?}", override_path);
        return ensure_dir(override_path);
    }

    // Priority 2: Environment variable
    if let Ok(env_path) = std::env::var(CONFIG_DIR_ENV) {
        if !env_path.is_empty() {
            tracing::debug!("Using config directory from {}: {:?}", CONFIG_DIR_ENV, env_path);
            return ensure_dir(PathBuf::from(env_path));
        }
    }

    // Priority 3: User config directory (platform standard location)
    ensure_dir(get_user_config_dir()?)
}

fn ensure_dir(dir: PathBuf) -> Result<PathBuf> {
    if !dir.exists() {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory {:?}", dir))?;
        tracing::info!("Created config directory at: {:?}", dir);
    }
    Ok(dir)
}

/// Get platform-specific user config directory
/// - Windows: `%APPDATA%\obsctl`
/// - Unix: `~/.config/obsctl`
fn get_user_config_dir() -> Result<PathBuf> {
    let base_dir = dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine user config directory"))?;
    Ok(base_dir.join("obsctl"))
}

/// Get absolute path to config.toml
pub fn get_config_path() -> Result<PathBuf> {
    Ok(find_config_directory()?.join("config.toml"))
}

/// Get absolute path to the logs directory
pub fn get_logs_dir() -> Result<PathBuf> {
    let logs_dir = find_config_directory()?.join("logs");
    std::fs::create_dir_all(&logs_dir).context("Failed to create logs directory")?;
    Ok(logs_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_override_takes_priority() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = temp_dir.path().join("nested");
        set_config_dir_override(Some(dir.clone()));

        let found = find_config_directory().unwrap();
        set_config_dir_override(None);

        assert_eq!(found, dir);
        assert!(dir.exists());
    }

    #[test]
    #[serial]
    fn test_config_path_is_inside_config_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        set_config_dir_override(Some(temp_dir.path().to_path_buf()));

        let path = get_config_path().unwrap();
        let logs = get_logs_dir().unwrap();
        set_config_dir_override(None);

        assert_eq!(path, temp_dir.path().join("config.toml"));
        assert!(logs.ends_with("logs"));
        assert!(logs.exists());
    }
}
