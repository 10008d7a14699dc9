//! Configuration module for Site-Mirror
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Command-line flags are merged on top of the file before validation.
//!
//! # Example
//!
//! ```no_run
//! use site_mirror::config::{load_config, validate};
//! use std::path::Path;
//!
//! let mut config = load_config(Path::new("mirror.toml")).unwrap();
//! config.crawler.start_url = "https://example.com/".to_string();
//! validate(&config).unwrap();
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, HttpConfig, OutputConfig, DEFAULT_ACCEPT, DEFAULT_USER_AGENT,
};

pub use parser::{config_fingerprint, load_config, load_validated_config, parse_config};
pub use validation::validate;
