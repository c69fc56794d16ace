//! Configuration loading and credential resolution
//!
//! Provides two-tier credential resolution with ENV → TOML priority.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, warn};

/// TOML configuration file contents (`~/.config/spinlog/spinlog.toml`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Discogs API consumer key
    pub discogs_key: Option<String>,
    /// Discogs API consumer secret
    pub discogs_secret: Option<String>,
}

/// Remote catalog credentials resolved from configuration
#[derive(Debug, Clone)]
pub struct CatalogCredentials {
    pub key: String,
    pub secret: String,
}

/// Get the platform configuration file path
///
/// Linux checks `~/.config/spinlog/spinlog.toml` then
/// `/etc/spinlog/spinlog.toml`; other platforms use the user config dir.
pub fn config_file_path() -> Result<PathBuf> {
    if cfg!(target_os = "linux") {
        if let Some(path) = dirs::config_dir().map(|d| d.join("spinlog").join("spinlog.toml")) {
            if path.exists() {
                return Ok(path);
            }
        }
        let system_config = PathBuf::from("/etc/spinlog/spinlog.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
        Err(Error::Config("No config file found".to_string()))
    } else {
        let path = dirs::config_dir()
            .map(|d| d.join("spinlog").join("spinlog.toml"))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;
        if path.exists() {
            Ok(path)
        } else {
            Err(Error::Config(format!("Config file not found: {:?}", path)))
        }
    }
}

/// Load the TOML configuration file, returning defaults if absent
pub fn load_toml_config() -> TomlConfig {
    match config_file_path() {
        Ok(path) => match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
                warn!("Failed to parse {}: {}", path.display(), e);
                TomlConfig::default()
            }),
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                TomlConfig::default()
            }
        },
        Err(_) => TomlConfig::default(),
    }
}

/// Resolve Discogs credentials from 2-tier configuration
///
/// **Priority:** ENV → TOML
///
/// Environment variables: `SPINLOG_DISCOGS_KEY`, `SPINLOG_DISCOGS_SECRET`.
pub fn resolve_catalog_credentials(toml_config: &TomlConfig) -> Result<CatalogCredentials> {
    let env_key = std::env::var("SPINLOG_DISCOGS_KEY").ok();
    let env_secret = std::env::var("SPINLOG_DISCOGS_SECRET").ok();

    let mut sources = Vec::new();
    if matches!(&env_key, Some(k) if is_valid_key(k)) {
        sources.push("environment");
    }
    if matches!(&toml_config.discogs_key, Some(k) if is_valid_key(k)) {
        sources.push("TOML");
    }

    // Warn if multiple sources (potential misconfiguration)
    if sources.len() > 1 {
        warn!(
            "Discogs key found in multiple sources: {}. Using environment (highest priority).",
            sources.join(", ")
        );
    }

    // Resolution priority
    if let (Some(key), Some(secret)) = (&env_key, &env_secret) {
        if is_valid_key(key) && is_valid_key(secret) {
            info!("Discogs credentials loaded from environment variables");
            return Ok(CatalogCredentials {
                key: key.clone(),
                secret: secret.clone(),
            });
        }
    }

    if let (Some(key), Some(secret)) = (&toml_config.discogs_key, &toml_config.discogs_secret) {
        if is_valid_key(key) && is_valid_key(secret) {
            info!("Discogs credentials loaded from TOML config");
            return Ok(CatalogCredentials {
                key: key.clone(),
                secret: secret.clone(),
            });
        }
    }

    Err(Error::Config(
        "Discogs credentials not configured. Please configure using one of:\n\
         1. Environment: SPINLOG_DISCOGS_KEY / SPINLOG_DISCOGS_SECRET\n\
         2. TOML config: ~/.config/spinlog/spinlog.toml (discogs_key, discogs_secret)\n\
         \n\
         Obtain credentials at: https://www.discogs.com/settings/developers"
            .to_string(),
    ))
}

/// Validate a credential value (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_key() {
        assert!(is_valid_key("abc123"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("   "));
    }

    #[test]
    fn test_toml_config_parse() {
        let config: TomlConfig = toml::from_str(
            r#"
            discogs_key = "key-value"
            discogs_secret = "secret-value"
            "#,
        )
        .unwrap();
        assert_eq!(config.discogs_key.as_deref(), Some("key-value"));
        assert_eq!(config.discogs_secret.as_deref(), Some("secret-value"));
    }

    #[test]
    fn test_toml_config_empty() {
        let config: TomlConfig = toml::from_str("").unwrap();
        assert!(config.discogs_key.is_none());
        assert!(config.discogs_secret.is_none());
    }

    #[test]
    fn test_resolve_from_toml() {
        let config = TomlConfig {
            discogs_key: Some("k".to_string()),
            discogs_secret: Some("s".to_string()),
        };
        // ENV vars may leak between tests in this process; only assert the
        // TOML path when they are unset.
        if std::env::var("SPINLOG_DISCOGS_KEY").is_err() {
            let creds = resolve_catalog_credentials(&config).unwrap();
            assert_eq!(creds.key, "k");
            assert_eq!(creds.secret, "s");
        }
    }

    #[test]
    fn test_resolve_missing_fails() {
        if std::env::var("SPINLOG_DISCOGS_KEY").is_err() {
            let result = resolve_catalog_credentials(&TomlConfig::default());
            assert!(result.is_err());
        }
    }
}
