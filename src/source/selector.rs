//! CSS-selector page source
//!
//! Extracts the "next" anchor and the page image with one selector each.
//! Both selectors must match exactly once.

use crate::source::{same_page, NextPage, PageResult, PageSource, ParseError};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Page source driven by a pair of CSS selectors
#[derive(Debug, Clone)]
pub struct SelectorSource {
    next_selector: String,
    image_selector: String,
    next: Selector,
    image: Selector,
}

impl SelectorSource {
    /// Compiles the two selectors
    ///
    /// # Arguments
    ///
    /// * `next_selector` - Selects the anchor whose `href` is the next page
    /// * `image_selector` - Selects the `img` whose `src` is the page's image
    ///
    /// # Example
    ///
    /// ```
    /// use chainwalk::source::SelectorSource;
    ///
    /// let source = SelectorSource::new("a.next", "#comic img").unwrap();
    /// assert_eq!(source.next_selector(), "a.next");
    /// ```
    pub fn new(next_selector: &str, image_selector: &str) -> Result<Self, ParseError> {
        Ok(Self {
            next: compile(next_selector)?,
            image: compile(image_selector)?,
            next_selector: next_selector.to_string(),
            image_selector: image_selector.to_string(),
        })
    }

    pub fn next_selector(&self) -> &str {
        &self.next_selector
    }

    pub fn image_selector(&self) -> &str {
        &self.image_selector
    }
}

impl PageSource for SelectorSource {
    fn process_page(&self, page_url: &Url, content: &[u8]) -> Result<PageResult, ParseError> {
        let html = String::from_utf8_lossy(content);
        let document = Html::parse_document(&html);

        let next_element = select_one(&document, &self.next, &self.next_selector, "next")?;
        let next_url = resolve(
            next_element,
            "href",
            page_url,
            &self.next_selector,
            "next",
        )?;

        let image_element = select_one(&document, &self.image, &self.image_selector, "image")?;
        let image_url = resolve(
            image_element,
            "src",
            page_url,
            &self.image_selector,
            "image",
        )?;

        // The last page's "next" control points back at itself
        let next = if same_page(&next_url, page_url) {
            NextPage::End
        } else {
            NextPage::Continue(next_url)
        };

        Ok(PageResult { image_url, next })
    }
}

fn compile(selector: &str) -> Result<Selector, ParseError> {
    Selector::parse(selector).map_err(|e| ParseError::InvalidSelector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

/// Returns the single element matching `selector`
fn select_one<'a>(
    document: &'a Html,
    selector: &Selector,
    selector_text: &str,
    element: &'static str,
) -> Result<ElementRef<'a>, ParseError> {
    let matches: Vec<ElementRef<'a>> = document.select(selector).collect();
    match matches.as_slice() {
        [found] => Ok(*found),
        _ => Err(ParseError::MatchCount {
            element,
            selector: selector_text.to_string(),
            expected: 1,
            actual: matches.len(),
        }),
    }
}

/// Reads `attribute` from `element` and resolves it against the page URL
fn resolve(
    element: ElementRef<'_>,
    attribute: &'static str,
    page_url: &Url,
    selector_text: &str,
    element_name: &'static str,
) -> Result<Url, ParseError> {
    let href = element
        .value()
        .attr(attribute)
        .ok_or_else(|| ParseError::MissingAttribute {
            element: element_name,
            selector: selector_text.to_string(),
            attribute,
        })?;

    page_url
        .join(href.trim())
        .map_err(|source| ParseError::InvalidLink {
            element: element_name,
            href: href.to_string(),
            source,
        })
}
