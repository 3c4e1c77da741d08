use crate::config::types::Config;
use crate::config::validation::validate;
use crate::{ConfigError, ConfigResult};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// Environment overrides (`BASIC_AUTH_USERNAME`, `BASIC_AUTH_PASSWORD`,
/// `PORT`, `DB_PATH`) are applied on top of the file before validation.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content, |key| std::env::var(key).ok())
}

/// Parses configuration text, applies overrides from `lookup`, and validates
pub fn parse_config<F>(content: &str, lookup: F) -> ConfigResult<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config: Config = toml::from_str(content)?;
    apply_env_overrides(&mut config, lookup)?;
    validate(&config)?;
    Ok(config)
}

/// Overrides credentials, port and database path from environment-style lookups
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> ConfigResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(username) = lookup("BASIC_AUTH_USERNAME") {
        config.api.username = username;
    }

    if let Some(password) = lookup("BASIC_AUTH_PASSWORD") {
        config.api.password = password;
    }

    if let Some(port) = lookup("PORT") {
        config.api.port = port
            .trim()
            .parse()
            .map_err(|_| ConfigError::Validation(format!("PORT must be a port number, got '{}'", port)))?;
    }

    if let Some(path) = lookup("DB_PATH") {
        config.storage.database_path = path;
    }

    Ok(())
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Each crawl run records this hash so stored runs can be traced back to
/// the configuration that produced them.
pub fn compute_config_hash(path: &Path) -> ConfigResult<String> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> ConfigResult<(Config, String)> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}
