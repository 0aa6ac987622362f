//! Crawler module: walking a page chain
//!
//! This module contains the core walking logic, including:
//! - HTTP fetching of pages and assets
//! - Deterministic asset naming
//! - The coordinator driving the pagination and resume loop

mod coordinator;
mod fetcher;
mod naming;

pub use coordinator::{run_chain, Coordinator, RunSummary, Termination};
pub use fetcher::{build_http_client, FetchError, Fetcher};
pub use naming::asset_filename;
