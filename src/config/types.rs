use crate::source::{SelectorSource, SitePreset};
use crate::ConfigError;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Main configuration structure for Chainwalk
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(rename = "site", default)]
    pub sites: Vec<SiteConfig>,
}

impl Config {
    /// Looks up a site by name
    ///
    /// With no name given, a configuration holding exactly one site selects it.
    pub fn select_site(&self, name: Option<&str>) -> Option<&SiteConfig> {
        match name {
            Some(name) => self.sites.iter().find(|site| site.name == name),
            None if self.sites.len() == 1 => self.sites.first(),
            None => None,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// HTTP behavior shared by every site
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FetcherConfig {
    /// Deadline for fetching a page, body included (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Deadline for downloading an asset, body included (seconds)
    #[serde(default = "default_asset_timeout_secs")]
    pub asset_timeout_secs: u64,

    /// Connection timeout (seconds)
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Pause between consecutive pages (milliseconds)
    #[serde(default)]
    pub request_delay_ms: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_asset_timeout_secs() -> u64 {
    300
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            asset_timeout_secs: default_asset_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_delay_ms: 0,
        }
    }
}

impl FetcherConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn asset_timeout(&self) -> Duration {
        Duration::from_secs(self.asset_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

/// One chain to archive
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SiteConfig {
    /// Name used to select the site on the command line
    pub name: String,

    /// First page of the chain
    pub initial_url: Url,

    /// Directory receiving the assets and the checkpoint file
    pub output_dir: PathBuf,

    /// Built-in page layout
    #[serde(default)]
    pub preset: Option<SitePreset>,

    /// CSS selector for the "next page" anchor (custom layouts)
    #[serde(default)]
    pub next_selector: Option<String>,

    /// CSS selector for the page image (custom layouts)
    #[serde(default)]
    pub image_selector: Option<String>,

    /// Stop after this many newly completed pages in one session
    #[serde(default)]
    pub max_pages: Option<u64>,
}

impl SiteConfig {
    /// Builds a site entry for a built-in layout
    pub fn from_preset(
        name: impl Into<String>,
        preset: SitePreset,
        initial_url: Url,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            initial_url,
            output_dir: output_dir.into(),
            preset: Some(preset),
            next_selector: None,
            image_selector: None,
            max_pages: None,
        }
    }

    /// Builds the page source described by this entry
    ///
    /// A preset wins over explicit selectors; validation rejects entries that
    /// carry both.
    pub fn page_source(&self) -> Result<SelectorSource, ConfigError> {
        let source = match (self.preset, &self.next_selector, &self.image_selector) {
            (Some(preset), _, _) => preset.source(),
            (None, Some(next), Some(image)) => SelectorSource::new(next, image),
            _ => {
                return Err(ConfigError::Validation(format!(
                    "site '{}' needs a preset or both next-selector and image-selector",
                    self.name
                )))
            }
        };

        source.map_err(|e| ConfigError::Validation(format!("site '{}': {}", self.name, e)))
    }
}
