use crate::config::types::{Config, FetchConfig, OutputConfig, PoolConfig, RelayConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetch_config(&config.fetch)?;
    validate_relay_config(&config.relays)?;
    validate_pool_config(&config.pool)?;
    validate_http_url("listing_url", &config.harvest.listing_url)?;
    validate_output_config(&config.output)?;
    Ok(())
}

fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.max_retries < 1 || config.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be between 1 and 10, got {}",
            config.max_retries
        )));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    Ok(())
}

fn validate_relay_config(config: &RelayConfig) -> Result<(), ConfigError> {
    if config.fanout < 1 || config.fanout > 500 {
        return Err(ConfigError::Validation(format!(
            "relay fanout must be between 1 and 500, got {}",
            config.fanout
        )));
    }

    if config.probe_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "probe_timeout_secs must be >= 1, got {}",
            config.probe_timeout_secs
        )));
    }

    validate_http_url("probe_url", &config.probe_url)?;

    if config.enabled && config.candidates_path.is_empty() {
        return Err(ConfigError::Validation(
            "candidates_path cannot be empty when relays are enabled".to_string(),
        ));
    }

    Ok(())
}

fn validate_pool_config(config: &PoolConfig) -> Result<(), ConfigError> {
    if config.worker_count < 1 || config.worker_count > 100 {
        return Err(ConfigError::Validation(format!(
            "worker_count must be between 1 and 100, got {}",
            config.worker_count
        )));
    }

    if config.max_items < 1 {
        return Err(ConfigError::Validation(format!(
            "max_items must be >= 1, got {}",
            config.max_items
        )));
    }

    if config.deadline_secs == Some(0) {
        return Err(ConfigError::Validation(
            "deadline_secs must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("database_path", &config.database_path),
        ("relays_path", &config.relays_path),
        ("links_path", &config.links_path),
        ("movies_path", &config.movies_path),
        ("listing_snapshot_path", &config.listing_snapshot_path),
    ] {
        if value.is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }
    }

    Ok(())
}

/// Validates that a configured URL parses and uses an HTTP(S) scheme
fn validate_http_url(name: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", name, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            name, value
        )));
    }

    Ok(())
}
