use crate::config::types::{Config, CrawlerConfig, HttpConfig, OutputConfig};
use crate::url::parse_start_url;
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_http_config(&config.http)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawl scope and scheduling settings
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.start_url.trim().is_empty() {
        return Err(ConfigError::Validation(
            "start_url cannot be empty".to_string(),
        ));
    }

    parse_start_url(&config.start_url).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid start URL '{}': {}", config.start_url, e))
    })?;

    if let Some(origin) = &config.origin {
        parse_start_url(origin)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid origin '{}': {}", origin, e)))?;
    }

    if config.concurrency < 1 || config.concurrency > 100 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 100, got {}",
            config.concurrency
        )));
    }

    if config.max_duration_secs == Some(0) {
        return Err(ConfigError::Validation(
            "max_duration_secs must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates HTTP client settings
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates output settings
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    if config.sitemap_file.is_empty() {
        return Err(ConfigError::Validation(
            "sitemap_file cannot be empty".to_string(),
        ));
    }

    // The manifest lives directly at the output root
    if config.sitemap_file.contains('/') || config.sitemap_file.contains('\\') {
        return Err(ConfigError::Validation(format!(
            "sitemap_file must be a plain file name, got '{}'",
            config.sitemap_file
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.crawler.start_url = "https://example.com/".to_string();
        config
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_start_url_without_scheme_is_accepted() {
        let mut config = valid_config();
        config.crawler.start_url = "example.com/docs/".to_string();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_empty_start_url() {
        let mut config = valid_config();
        config.crawler.start_url = String::new();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_non_http_start_url() {
        let mut config = valid_config();
        config.crawler.start_url = "ftp://example.com/".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_invalid_origin() {
        let mut config = valid_config();
        config.crawler.origin = Some("ftp://example.com/pub/".to_string());
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_concurrency_bounds() {
        let mut config = valid_config();
        config.crawler.concurrency = 0;
        assert!(validate(&config).is_err());

        config.crawler.concurrency = 101;
        assert!(validate(&config).is_err());

        config.crawler.concurrency = 1;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_zero_delay_is_allowed() {
        let mut config = valid_config();
        config.crawler.delay_ms = 0;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_zero_timeout() {
        let mut config = valid_config();
        config.http.timeout_secs = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_max_duration() {
        let mut config = valid_config();
        config.crawler.max_duration_secs = Some(0);
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_sitemap_file_must_be_plain_name() {
        let mut config = valid_config();
        config.output.sitemap_file = "nested/sitemap.json".to_string();
        assert!(validate(&config).is_err());
    }
}
