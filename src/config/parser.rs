use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Environment variable overriding `output.database-path`
pub const ENV_DATABASE_PATH: &str = "CINECRAWL_DATABASE_PATH";

/// Environment variable overriding `relays.enabled`
pub const ENV_USE_RELAYS: &str = "CINECRAWL_USE_RELAYS";

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use cinecrawl::config::load_config;
///
/// let config = load_config(Path::new("cinecrawl.toml")).unwrap();
/// println!("Workers: {}", config.pool.worker_count);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

/// Applies environment overrides on top of a loaded configuration
///
/// `lookup` resolves a variable name to its value, which keeps this function
/// independent of the process environment.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = lookup(ENV_DATABASE_PATH).filter(|p| !p.trim().is_empty()) {
        config.output.database_path = path.trim().to_string();
    }

    if let Some(value) = lookup(ENV_USE_RELAYS) {
        config.relays.enabled = parse_flag(ENV_USE_RELAYS, &value)?;
    }

    Ok(())
}

/// Builds the effective configuration for a process run
///
/// Reads the optional TOML file, loads `.env` if present, applies the
/// environment overrides and validates the result.
///
/// # Returns
///
/// The configuration and, when a file was given, its content hash
pub fn resolve_config(path: Option<&Path>) -> Result<(Config, Option<String>), ConfigError> {
    let (mut config, hash) = match path {
        Some(path) => {
            let (config, hash) = load_config_with_hash(path)?;
            (config, Some(hash))
        }
        None => (Config::default(), None),
    };

    dotenvy::dotenv().ok();
    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
    validate(&config)?;

    Ok((config, hash))
}

fn parse_flag(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::Env {
            name: name.to_string(),
            value: value.to_string(),
        }),
    }
}
