use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Backend URL uses http or https
/// - Polling interval, chunk size and file size ceiling are not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let base_url = config.backend.base_url.trim();
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(ConfigError::ValidationError(format!(
            "backend.base_url must start with http:// or https://, got '{}'",
            config.backend.base_url
        )));
    }

    if config.polling.interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "polling.interval_ms cannot be 0".to_string(),
        ));
    }

    if config.upload.chunk_size_bytes == 0 {
        return Err(ConfigError::ValidationError(
            "upload.chunk_size_bytes cannot be 0".to_string(),
        ));
    }

    if config.upload.max_file_size_bytes == 0 {
        return Err(ConfigError::ValidationError(
            "upload.max_file_size_bytes cannot be 0".to_string(),
        ));
    }

    Ok(())
}
