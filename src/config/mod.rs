//! Configuration module for Listing-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files,
//! with credentials, port and database path overridable from the environment.
//!
//! # Example
//!
//! ```no_run
//! use listing_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Crawler will fetch {} pages", config.crawler.total_pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    ApiConfig, Config, CrawlerConfig, SelectorConfig, StorageConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{
    apply_env_overrides, compute_config_hash, load_config, load_config_with_hash, parse_config,
};
pub use validation::validate;
