//! Chain coordinator - the pagination and resume loop
//!
//! This module walks the chain one page at a time:
//! - Loading the checkpoint and recomputing the frontier on resume
//! - Fetching each page and handing it to the page source
//! - Streaming the page's asset to disk
//! - Persisting the checkpoint once the asset is stored
//!
//! The checkpoint never points past a stored asset. Killing the process at
//! any point costs at most the one page in flight.

use crate::config::{Config, SiteConfig};
use crate::crawler::fetcher::{FetchError, Fetcher};
use crate::crawler::naming::asset_filename;
use crate::source::{PageResult, PageSource};
use crate::state::{checkpoint_path, load_checkpoint, save_checkpoint, Checkpoint};
use crate::ChainError;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Why a session stopped without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The last page of the chain has been processed
    EndOfChain,

    /// The per-session page limit was reached; rerun to continue
    PageLimit,
}

/// Outcome of a successful session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Pages completed during this session
    pub pages_processed: u64,

    /// Checkpoint as persisted at the end of the session
    pub checkpoint: Checkpoint,

    pub termination: Termination,
}

/// Walks one chain into one output directory
pub struct Coordinator {
    initial_url: Url,
    output_dir: PathBuf,
    source: Box<dyn PageSource>,
    fetcher: Fetcher,
    request_delay: Duration,
    max_pages: Option<u64>,
}

impl Coordinator {
    /// Creates a coordinator for the chain starting at `initial_url`
    pub fn new(
        initial_url: Url,
        output_dir: impl Into<PathBuf>,
        source: Box<dyn PageSource>,
        fetcher: Fetcher,
    ) -> Self {
        Self {
            initial_url,
            output_dir: output_dir.into(),
            source,
            fetcher,
            request_delay: Duration::ZERO,
            max_pages: None,
        }
    }

    /// Creates a coordinator for one configured site
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(ChainError)` - The site's selectors or the HTTP client could not be built
    pub fn from_config(config: &Config, site: &SiteConfig) -> Result<Self, ChainError> {
        let source = site.page_source()?;
        let fetcher = Fetcher::from_config(&config.user_agent, &config.fetcher)?;

        Ok(Self::new(
            site.initial_url.clone(),
            site.output_dir.clone(),
            Box::new(source),
            fetcher,
        )
        .with_request_delay(config.fetcher.request_delay())
        .with_max_pages(site.max_pages))
    }

    /// Pause between consecutive pages of a session
    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    /// Stop normally after this many newly completed pages
    pub fn with_max_pages(mut self, max_pages: Option<u64>) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Runs the walk until the chain ends or something fails
    ///
    /// # Returns
    ///
    /// * `Ok(RunSummary)` - End of chain (or page limit) reached
    /// * `Err(ChainError)` - The session stopped; the on-disk checkpoint is
    ///   the last good state and a rerun resumes from it
    pub async fn run(&self) -> Result<RunSummary, ChainError> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|source| ChainError::Io {
                path: self.output_dir.clone(),
                source,
            })?;

        let (mut checkpoint, mut frontier) = self.resume().await?;
        let mut pages_processed = 0u64;

        loop {
            let Some(page_url) = frontier else {
                tracing::info!(
                    "No more pages; chain complete at page {}",
                    checkpoint.last_page_index
                );
                return Ok(RunSummary {
                    pages_processed,
                    checkpoint,
                    termination: Termination::EndOfChain,
                });
            };

            if self.max_pages.is_some_and(|max| pages_processed >= max) {
                tracing::info!(
                    "Page limit of {} reached; next run continues at {}",
                    pages_processed,
                    page_url
                );
                return Ok(RunSummary {
                    pages_processed,
                    checkpoint,
                    termination: Termination::PageLimit,
                });
            }

            if pages_processed > 0 && !self.request_delay.is_zero() {
                tokio::time::sleep(self.request_delay).await;
            }

            let (next_checkpoint, next) = self.process_page(&page_url, &checkpoint).await?;
            checkpoint = next_checkpoint;
            pages_processed += 1;
            frontier = next;
        }
    }

    /// Loads the checkpoint and works out the first page of this session
    ///
    /// A checkpointed page is fetched and parsed again only to learn its
    /// next link; its asset is already on disk and is not downloaded.
    async fn resume(&self) -> Result<(Checkpoint, Option<Url>), ChainError> {
        let Some(checkpoint) = self.load_state().await? else {
            tracing::info!("No checkpoint found, starting at {}", self.initial_url);
            return Ok((Checkpoint::default(), Some(self.initial_url.clone())));
        };

        let Some(last_url) = checkpoint.last_page_url.clone() else {
            tracing::info!(
                "Checkpoint has no last page, starting at {} as page {}",
                self.initial_url,
                checkpoint.next_index()
            );
            return Ok((checkpoint, Some(self.initial_url.clone())));
        };

        tracing::info!(
            "Resuming after page {} ({})",
            checkpoint.last_page_index,
            last_url
        );

        let content = self
            .fetcher
            .fetch_text(&last_url)
            .await
            .map_err(ChainError::ResumeFetch)?;
        let result = self.parse(&last_url, &content)?;

        Ok((checkpoint, result.next.following(&last_url)))
    }

    /// Processes one page and persists the advanced checkpoint
    ///
    /// Returns the persisted checkpoint and the page that follows, if any.
    async fn process_page(
        &self,
        page_url: &Url,
        checkpoint: &Checkpoint,
    ) -> Result<(Checkpoint, Option<Url>), ChainError> {
        let page_index = checkpoint.next_index();
        tracing::info!("Downloading page {}: {}", page_index, page_url);

        let content = self
            .fetcher
            .fetch_text(page_url)
            .await
            .map_err(fetch_failure)?;
        let result = self.parse(page_url, &content)?;

        let asset_path = self
            .output_dir
            .join(asset_filename(page_index, &result.image_url));
        let bytes = self
            .fetcher
            .fetch_to_file(&result.image_url, &asset_path)
            .await
            .map_err(fetch_failure)?;
        tracing::debug!(
            "Stored {} ({} bytes) from {}",
            asset_path.display(),
            bytes,
            result.image_url
        );

        let mut next_checkpoint = checkpoint.clone();
        next_checkpoint.advance(page_url.clone());
        self.store_state(&next_checkpoint).await?;

        Ok((next_checkpoint, result.next.following(page_url)))
    }

    async fn load_state(&self) -> Result<Option<Checkpoint>, ChainError> {
        let dir = self.output_dir.clone();
        let loaded = tokio::task::spawn_blocking(move || load_checkpoint(&dir))
            .await
            .map_err(|e| self.join_failure(e))??;
        Ok(loaded)
    }

    async fn store_state(&self, checkpoint: &Checkpoint) -> Result<(), ChainError> {
        let dir = self.output_dir.clone();
        let checkpoint = checkpoint.clone();
        tokio::task::spawn_blocking(move || save_checkpoint(&dir, &checkpoint))
            .await
            .map_err(|e| self.join_failure(e))??;
        Ok(())
    }

    fn join_failure(&self, err: tokio::task::JoinError) -> ChainError {
        ChainError::Io {
            path: checkpoint_path(&self.output_dir),
            source: std::io::Error::new(std::io::ErrorKind::Other, err),
        }
    }

    fn parse(&self, page_url: &Url, content: &[u8]) -> Result<PageResult, ChainError> {
        self.source
            .process_page(page_url, content)
            .map_err(|source| ChainError::Parse {
                url: page_url.to_string(),
                source,
            })
    }
}

/// Maps a fetch failure inside the main loop onto the session error
fn fetch_failure(err: FetchError) -> ChainError {
    match err {
        FetchError::Io { path, source } => ChainError::Io { path, source },
        transport @ FetchError::Transport { .. } => ChainError::Transport(transport),
    }
}

/// Walks the chain starting at `initial_url` into `output_dir`
///
/// Shorthand for [`Coordinator::new`] followed by [`Coordinator::run`].
///
/// # Example
///
/// ```no_run
/// use chainwalk::config::{FetcherConfig, UserAgentConfig};
/// use chainwalk::crawler::{run_chain, Fetcher};
/// use chainwalk::source::SitePreset;
/// use url::Url;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let user_agent = UserAgentConfig {
///     crawler_name: "chainwalk".to_string(),
///     crawler_version: "0.1".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
/// let fetcher = Fetcher::from_config(&user_agent, &FetcherConfig::default())?;
/// let summary = run_chain(
///     Url::parse("https://xkcd.com/1/")?,
///     SitePreset::Xkcd.source()?,
///     "downloads/xkcd",
///     fetcher,
/// )
/// .await?;
/// println!("{} pages downloaded", summary.pages_processed);
/// # Ok(())
/// # }
/// ```
pub async fn run_chain(
    initial_url: Url,
    source: impl PageSource + 'static,
    output_dir: impl Into<PathBuf>,
    fetcher: Fetcher,
) -> Result<RunSummary, ChainError> {
    Coordinator::new(initial_url, output_dir, Box::new(source), fetcher)
        .run()
        .await
}
