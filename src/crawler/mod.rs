//! Crawler module for page fetching and record extraction
//!
//! This module contains the fetch-parse-persist pipeline:
//! - HTTP fetching of numbered search-result pages
//! - HTML parsing into product records
//! - Randomized pacing between requests
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod pacing;
mod parser;

pub use coordinator::{run_crawl, Coordinator, CrawlJob, CrawlReport};
pub use fetcher::{build_http_client, FetchError, PageFetcher};
pub use pacing::Pacer;
pub use parser::RecordExtractor;
