//! Configuration module for Titlescan
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every setting has a default, so running without a file is the common case.
//!
//! # Example
//!
//! ```no_run
//! use titlescan::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("titlescan.toml")).unwrap();
//! println!("Concurrency ceiling: {}", config.fetch.max_concurrent_requests);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, FetchConfig, IoConfig, DEFAULT_USER_AGENT};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
