//! Asset file naming
//!
//! `{page_index:05}-{sha256(image_url)}{extension}`: unique per page, derivable
//! from the URL and index alone, and sorted by index in a directory listing.

use sha2::{Digest, Sha256};
use url::Url;

/// Returns the file name for the asset of page `page_index`
///
/// # Example
///
/// ```
/// use chainwalk::crawler::asset_filename;
/// use url::Url;
///
/// let url = Url::parse("http://x/img1.png").unwrap();
/// let name = asset_filename(1, &url);
/// assert!(name.starts_with("00001-"));
/// assert!(name.ends_with(".png"));
/// ```
pub fn asset_filename(page_index: u64, image_url: &Url) -> String {
    let hash = hex::encode(Sha256::digest(image_url.as_str().as_bytes()));
    format!("{:05}-{}{}", page_index, hash, extension(image_url))
}

/// Extension of the last path segment, including the dot
///
/// Leading dots do not start an extension, so `/.hidden` has none.
fn extension(url: &Url) -> &str {
    let segment = url.path().rsplit('/').next().unwrap_or("");
    let stem = segment.trim_start_matches('.');
    match stem.rfind('.') {
        Some(pos) => &stem[pos..],
        None => "",
    }
}
