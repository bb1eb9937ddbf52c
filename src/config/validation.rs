use crate::config::types::{Config, FetchConfig, IoConfig};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetch_config(&config.fetch)?;
    validate_io_config(&config.io)?;
    Ok(())
}

/// Validates fetch configuration
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.timeout_secs < 1 || config.timeout_secs > 300 {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be between 1 and 300, got {}",
            config.timeout_secs
        )));
    }

    if config.max_concurrent_requests < 1 || config.max_concurrent_requests > 1000 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_requests must be between 1 and 1000, got {}",
            config.max_concurrent_requests
        )));
    }

    if config.chunk_size < 1 {
        return Err(ConfigError::Validation(format!(
            "chunk_size must be >= 1, got {}",
            config.chunk_size
        )));
    }

    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates input/output configuration
fn validate_io_config(config: &IoConfig) -> Result<(), ConfigError> {
    if config.input_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "input_dir cannot be empty".to_string(),
        ));
    }

    if config.output_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output_dir cannot be empty".to_string(),
        ));
    }

    if config.max_write_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max_write_attempts must be >= 1, got {}",
            config.max_write_attempts
        )));
    }

    Ok(())
}
