//! Configuration loading for toolchat.
//!
//! Reads `config.toml` from the data directory (`~/.toolchat/` unless
//! `TOOLCHAT_DATA_DIR` is set) into [`AppConfig`]. A missing or malformed
//! file falls back to defaults. API keys are never stored in the file; the
//! config names the environment variables that hold them.

use std::path::{Path, PathBuf};

use secrecy::SecretString;
use toolchat_types::config::AppConfig;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "TOOLCHAT_DATA_DIR";

/// Resolve the data directory: `TOOLCHAT_DATA_DIR`, else `~/.toolchat`.
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".toolchat")
}

/// Load configuration from `{data_dir}/config.toml`.
///
/// - Missing file: [`AppConfig::default()`].
/// - Unreadable or unparseable file: warning, then the default.
pub async fn load_app_config(data_dir: &Path) -> AppConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return AppConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return AppConfig::default();
        }
    };

    match toml::from_str::<AppConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            AppConfig::default()
        }
    }
}

/// Read an API key from the named environment variable.
///
/// Empty values count as unset.
pub fn api_key_from_env(var: &str) -> Option<SecretString> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => Some(SecretString::from(value)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_app_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_app_config(tmp.path()).await;
        assert_eq!(config.owner_id, "local");
        assert_eq!(config.max_tool_steps, 3);
    }

    #[tokio::test]
    async fn load_app_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            r#"
owner_id = "alice"
max_tool_steps = 5

[model]
model = "gpt-4o-mini"
"#,
        )
        .await
        .unwrap();

        let config = load_app_config(tmp.path()).await;
        assert_eq!(config.owner_id, "alice");
        assert_eq!(config.max_tool_steps, 5);
        assert_eq!(config.model.model, "gpt-4o-mini");
        assert_eq!(config.model.api_key_env, "GEMINI_API_KEY");
    }

    #[tokio::test]
    async fn load_app_config_malformed_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "owner_id = [unclosed")
            .await
            .unwrap();

        let config = load_app_config(tmp.path()).await;
        assert_eq!(config.owner_id, "local");
    }

    #[test]
    fn api_key_from_env_ignores_missing_and_blank() {
        assert!(api_key_from_env("TOOLCHAT_TEST_KEY_THAT_IS_NEVER_SET").is_none());
        // PATH is always set and non-empty.
        let key = api_key_from_env("PATH").unwrap();
        assert!(!key.expose_secret().is_empty());
    }
}
