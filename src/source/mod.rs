//! Page sources: per-site extraction of the image and the next link
//!
//! A page source is a pure transform from a page (URL plus raw body) to a
//! [`PageResult`]. The coordinator never looks inside page markup; everything
//! site-specific lives behind the [`PageSource`] trait.
//!
//! # Components
//!
//! - `SelectorSource`: CSS-selector driven source used for every configured site
//! - `SitePreset`: built-in selector pairs for known comics

mod selector;
mod sites;

pub use selector::SelectorSource;
pub use sites::SitePreset;

use thiserror::Error;
use url::Url;

/// What follows the current page in the chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextPage {
    /// Keep walking at this URL
    Continue(Url),

    /// The current page is the last one
    End,
}

impl NextPage {
    pub fn url(&self) -> Option<&Url> {
        match self {
            Self::Continue(url) => Some(url),
            Self::End => None,
        }
    }

    /// The page to visit after `page_url`, if any
    ///
    /// A "next" link back to `page_url` itself (fragment aside) ends the
    /// chain, whichever source produced it.
    pub fn following(self, page_url: &Url) -> Option<Url> {
        match self {
            Self::Continue(url) if same_page(&url, page_url) => None,
            Self::Continue(url) => Some(url),
            Self::End => None,
        }
    }
}

/// Returns true if both URLs address the same document
///
/// Fragments only move within a page: `/3000/#` is `/3000/`.
pub fn same_page(a: &Url, b: &Url) -> bool {
    let mut a = a.clone();
    let mut b = b.clone();
    a.set_fragment(None);
    b.set_fragment(None);
    a == b
}

/// Output of a page source for one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResult {
    /// Absolute URL of the page's image
    pub image_url: Url,

    /// Where the chain continues, if anywhere
    pub next: NextPage,
}

/// Structural mismatch between a page and the layout a source expects
///
/// These are never retried: the site changed or the selectors are wrong.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("expected {expected} {element} element(s) matching `{selector}`, found {actual}")]
    MatchCount {
        element: &'static str,
        selector: String,
        expected: usize,
        actual: usize,
    },

    #[error("{element} element matching `{selector}` has no `{attribute}` attribute")]
    MissingAttribute {
        element: &'static str,
        selector: String,
        attribute: &'static str,
    },

    #[error("cannot resolve {element} link '{href}': {source}")]
    InvalidLink {
        element: &'static str,
        href: String,
        source: url::ParseError,
    },

    #[error("invalid selector `{selector}`: {message}")]
    InvalidSelector { selector: String, message: String },
}

/// Site-specific page parser
///
/// Implementations must return absolute URLs (relative links resolved
/// against `page_url`) and must fail rather than guess when the markup is
/// ambiguous.
pub trait PageSource: Send + Sync {
    fn process_page(&self, page_url: &Url, content: &[u8]) -> Result<PageResult, ParseError>;
}

impl<F> PageSource for F
where
    F: Fn(&Url, &[u8]) -> Result<PageResult, ParseError> + Send + Sync,
{
    fn process_page(&self, page_url: &Url, content: &[u8]) -> Result<PageResult, ParseError> {
        self(page_url, content)
    }
}
