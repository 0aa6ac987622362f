//! Configuration module for Chainwalk
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! A configuration names one or more sites; each site carries everything the
//! coordinator needs for one chain (initial URL, output directory, page layout).
//!
//! # Example
//!
//! ```no_run
//! use chainwalk::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("First site: {}", config.sites[0].name);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, FetcherConfig, SiteConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{load_config, parse_config};
