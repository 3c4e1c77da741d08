//! HTTP fetcher for search-result pages
//!
//! This module handles all outbound requests for the crawler:
//! - Building the HTTP client with a browser user agent
//! - Building the page URL from the fixed search URL
//! - Issuing exactly one GET per page and classifying failures

use crate::config::{CrawlerConfig, UserAgentConfig};
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Reasons a page could not be fetched
///
/// The coordinator treats every variant the same way (page unavailable);
/// the distinction only matters for log output.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("page {page} is outside 1..={total}")]
    PageOutOfRange { page: u32, total: u32 },

    #[error("invalid page URL: {0}")]
    InvalidUrl(String),

    #[error("request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("transport error for {url}: {source}")]
    Transport { url: String, source: reqwest::Error },

    #[error("failed to read body of {url}: {source}")]
    Body { url: String, source: reqwest::Error },
}

/// Builds the HTTP client used for page fetches
///
/// The configured user agent is sent on every request. Redirects follow
/// reqwest's default policy.
///
/// # Example
///
/// ```no_run
/// use listing_harvest::config::UserAgentConfig;
/// use listing_harvest::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default(), 30).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    timeout_secs: u64,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.value.clone())
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(connect_timeout(timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Connection phase budget, never longer than the whole-request timeout
fn connect_timeout(timeout_secs: u64) -> Duration {
    Duration::from_secs(timeout_secs.min(CONNECT_TIMEOUT_SECS))
}

/// Fetches numbered pages of one fixed search query
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
    search_url: Url,
    total_pages: u32,
}

impl PageFetcher {
    /// Creates a fetcher for the configured search URL
    pub fn new(client: Client, config: &CrawlerConfig) -> Result<Self, url::ParseError> {
        Ok(Self {
            client,
            search_url: Url::parse(&config.search_url)?,
            total_pages: config.total_pages,
        })
    }

    /// Returns the URL for a page: the search URL with `page={n}` appended
    pub fn page_url(&self, page: u32) -> Result<Url, FetchError> {
        if page < 1 || page > self.total_pages {
            return Err(FetchError::PageOutOfRange {
                page,
                total: self.total_pages,
            });
        }

        let mut url = self.search_url.clone();
        url.query_pairs_mut()
            .append_pair("page", &page.to_string());
        Ok(url)
    }

    /// Fetches one page and returns its raw markup
    ///
    /// # Request Flow
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | Page outside 1..=total | `PageOutOfRange`, no request sent |
    /// | Timeout | `Timeout` |
    /// | Connection/TLS failure | `Transport` |
    /// | Non-2xx status | `Status` |
    /// | Body read failure | `Body` |
    ///
    /// No retry is attempted.
    pub async fn fetch(&self, page: u32) -> Result<String, FetchError> {
        let url = self.page_url(page)?;
        let url_str = url.to_string();

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url_str.clone(),
                }
            } else {
                FetchError::Transport {
                    url: url_str.clone(),
                    source: e,
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url_str,
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url_str.clone(),
                }
            } else {
                FetchError::Body {
                    url: url_str.clone(),
                    source: e,
                }
            }
        })
    }

    /// Total number of pages this fetcher accepts
    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }
}
