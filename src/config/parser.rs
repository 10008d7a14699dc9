use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// The file is parsed but not validated: the start URL usually arrives from the
/// command line afterwards, so callers run [`validate`] once all overrides are
/// applied. Use [`load_validated_config`] when the file is self-contained.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully parsed configuration
/// * `Err(ConfigError)` - Failed to read or parse the file
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses configuration from a TOML string
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    Ok(config)
}

/// Loads a configuration file and validates it
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use site_mirror::config::load_validated_config;
///
/// let config = load_validated_config(Path::new("mirror.toml")).unwrap();
/// println!("Workers: {}", config.crawler.concurrency);
/// ```
pub fn load_validated_config(path: &Path) -> Result<Config, ConfigError> {
    let config = load_config(path)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 fingerprint of the effective configuration
///
/// The hash covers the configuration after command-line overrides, so two
/// runs with the same fingerprint crawled with identical settings.
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 of the serialized configuration
/// * `Err(ConfigError)` - The configuration could not be serialized
pub fn config_fingerprint(config: &Config) -> Result<String, ConfigError> {
    let serialized = toml::to_string(config)?;
    let mut hasher = Sha256::new();
    hasher.update(serialized.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[crawler]
start-url = "https://example.com/"
concurrency = 3
delay-ms = 250
max-duration-secs = 60

[http]
timeout-secs = 10
tls-compat = true

[output]
directory = "./mirror"
rewrite-links = false
"#;

        let file = create_temp_config(config_content);
        let config = load_validated_config(file.path()).unwrap();

        assert_eq!(config.crawler.start_url, "https://example.com/");
        assert_eq!(config.crawler.concurrency, 3);
        assert_eq!(config.crawler.delay_ms, 250);
        assert_eq!(config.crawler.max_duration_secs, Some(60));
        assert_eq!(config.http.timeout_secs, 10);
        assert!(config.http.tls_compat);
        assert_eq!(config.output.directory, "./mirror");
        assert!(!config.output.rewrite_links);
        // Unspecified keys keep their defaults
        assert_eq!(config.output.sitemap_file, "sitemap.json");
        assert!(config.crawler.skip_existing_assets);
    }

    #[test]
    fn test_empty_file_yields_defaults() {
        let file = create_temp_config("");
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.crawler.concurrency, 5);
        assert_eq!(config.crawler.delay_ms, 1000);
        assert_eq!(config.http.timeout_secs, 30);
        assert!(!config.http.tls_compat);
        assert_eq!(config.output.directory, "site_output");
        assert!(config.output.rewrite_links);
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/mirror.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let config_content = r#"
[crawler]
start-url = "https://example.com/"
concurrency = 0
"#;

        let file = create_temp_config(config_content);
        let result = load_validated_config(file.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_config_fingerprint() {
        let config = Config::default();
        let hash1 = config_fingerprint(&config).unwrap();
        let hash2 = config_fingerprint(&config.clone()).unwrap();

        // Same settings should produce same hash
        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64); // SHA-256 produces 64 hex characters

        let mut changed = config;
        changed.crawler.concurrency = 9;
        assert_ne!(config_fingerprint(&changed).unwrap(), hash1);
    }
}
