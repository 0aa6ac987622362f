//! Chainwalk: a resumable page-chain archiver
//!
//! This crate walks a linked chain of pages (a webcomic archive, typically),
//! downloads the one image each page carries and follows the page's "next"
//! link until the chain ends. Progress is checkpointed after every page so an
//! interrupted run picks up where it stopped.

pub mod config;
pub mod crawler;
pub mod source;
pub mod state;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for a chain walk
///
/// Every variant terminates the current session. Rerunning resumes from the
/// last checkpoint written.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Transport(crawler::FetchError),

    #[error("Page {url} did not match the expected layout: {source}")]
    Parse {
        url: String,
        source: source::ParseError,
    },

    #[error("Could not re-fetch checkpointed page on resume: {0}")]
    ResumeFetch(crawler::FetchError),

    #[error("Checkpoint {path} is malformed: {source}")]
    MalformedCheckpoint {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ChainError {
    /// Returns true if simply rerunning the session may make progress
    ///
    /// Parse failures mean the site layout changed; a malformed checkpoint
    /// needs a human to look at it. Neither goes away on its own.
    pub fn is_resumable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::ResumeFetch(_) | Self::Io { .. }
        )
    }
}

impl From<state::CheckpointError> for ChainError {
    fn from(err: state::CheckpointError) -> Self {
        match err {
            state::CheckpointError::Malformed { path, source } => {
                Self::MalformedCheckpoint { path, source }
            }
            state::CheckpointError::Io { path, source } => Self::Io { path, source },
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for chain walk operations
pub type Result<T> = std::result::Result<T, ChainError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::{Config, SiteConfig};
pub use crawler::{run_chain, Coordinator, Fetcher, RunSummary, Termination};
pub use source::{NextPage, PageResult, PageSource, ParseError};
pub use state::Checkpoint;
