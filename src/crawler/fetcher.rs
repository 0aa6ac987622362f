//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the walk:
//! - Building HTTP clients with proper user agent strings and timeouts
//! - GET requests returning the page body
//! - GET requests streamed straight to a file on disk
//!
//! Every non-success status and every network failure becomes
//! [`FetchError::Transport`]. Nothing is retried here; a failed walk is
//! resumed by running it again.

use crate::config::{FetcherConfig, UserAgentConfig};
use reqwest::{Client, Response};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use url::Url;

/// Failure of a single fetch
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error for {url}: {source}")]
    Transport { url: String, source: reqwest::Error },

    #[error("IO error writing {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl FetchError {
    /// The URL or local path the failure concerns
    pub fn target(&self) -> String {
        match self {
            Self::Transport { url, .. } => url.clone(),
            Self::Io { path, .. } => path.display().to_string(),
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The user agent configuration
/// * `config` - Timeouts
///
/// # Example
///
/// ```no_run
/// use chainwalk::config::{FetcherConfig, UserAgentConfig};
/// use chainwalk::crawler::build_http_client;
///
/// let user_agent = UserAgentConfig {
///     crawler_name: "chainwalk".to_string(),
///     crawler_version: "0.1".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&user_agent, &FetcherConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    config: &FetcherConfig,
) -> Result<Client, reqwest::Error> {
    // Request deadlines are per request kind, see `Fetcher`
    Client::builder()
        .user_agent(user_agent.header_value())
        .connect_timeout(config.connect_timeout())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Blocking-in-sequence retrieval of pages and assets
///
/// Pages and assets get separate deadlines: an image streaming for longer
/// than a page should take is not a failure.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    page_timeout: Duration,
    asset_timeout: Duration,
}

impl Fetcher {
    /// Wraps a client, using the default deadlines
    pub fn new(client: Client) -> Self {
        let defaults = FetcherConfig::default();
        Self {
            client,
            page_timeout: defaults.timeout(),
            asset_timeout: defaults.asset_timeout(),
        }
    }

    /// Builds a fetcher from user agent and timeout settings
    pub fn from_config(
        user_agent: &UserAgentConfig,
        config: &FetcherConfig,
    ) -> Result<Self, reqwest::Error> {
        let client = build_http_client(user_agent, config)?;
        Ok(Self {
            client,
            page_timeout: config.timeout(),
            asset_timeout: config.asset_timeout(),
        })
    }

    /// Fetches `url` and returns the raw body
    pub async fn fetch_text(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        let response = self.get(url, self.page_timeout).await?;
        let body = response
            .bytes()
            .await
            .map_err(|source| transport(url, source))?;

        tracing::trace!("Fetched {} ({} bytes)", url, body.len());
        Ok(body.to_vec())
    }

    /// Streams the body of `url` into `path`, replacing any existing file
    ///
    /// The body is written chunk by chunk as it arrives. On failure the file
    /// may be left partially written; callers must not treat it as complete.
    ///
    /// # Returns
    ///
    /// The number of bytes written
    pub async fn fetch_to_file(&self, url: &Url, path: &Path) -> Result<u64, FetchError> {
        let mut response = self.get(url, self.asset_timeout).await?;

        let io_err = |source: std::io::Error| FetchError::Io {
            path: path.to_path_buf(),
            source,
        };

        let mut file = File::create(path).await.map_err(io_err)?;
        let mut written = 0u64;

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|source| transport(url, source))?
        {
            file.write_all(&chunk).await.map_err(io_err)?;
            written += chunk.len() as u64;
        }

        file.flush().await.map_err(io_err)?;
        file.sync_all().await.map_err(io_err)?;

        Ok(written)
    }

    /// Sends a GET request, folding error statuses into the transport error
    ///
    /// `timeout` covers the whole exchange, body included.
    async fn get(&self, url: &Url, timeout: Duration) -> Result<Response, FetchError> {
        self.client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await
            .and_then(Response::error_for_status)
            .map_err(|source| transport(url, source))
    }
}

fn transport(url: &Url, source: reqwest::Error) -> FetchError {
    FetchError::Transport {
        url: url.to_string(),
        source,
    }
}
