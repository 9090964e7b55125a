use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Concurrent job cap is not 0
/// - Executable paths are not empty
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.extractor.max_concurrent_jobs == 0 {
        return Err(ConfigError::ValidationError(
            "extractor.max_concurrent_jobs cannot be 0".to_string(),
        ));
    }

    if config.extractor.yt_dlp_path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "extractor.yt_dlp_path cannot be empty".to_string(),
        ));
    }

    if config.extractor.ffmpeg_path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "extractor.ffmpeg_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = Config::default();
        config.server.port = 0;
        let result = validate_config(&config);
        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::ValidationError(_)
        ));
    }

    #[test]
    fn test_validate_zero_job_cap_fails() {
        let mut config = Config::default();
        config.extractor.max_concurrent_jobs = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_empty_yt_dlp_path_fails() {
        let mut config = Config::default();
        config.extractor.yt_dlp_path = "".into();
        assert!(validate_config(&config).is_err());
    }
}
