use serde::Deserialize;

/// Main configuration structure for Listing-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    pub storage: StorageConfig,
    pub api: ApiConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
}

/// Crawl job and pacing configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Search URL without the page parameter (e.g. `https://www.amazon.com/s?k=laptops`)
    #[serde(rename = "search-url")]
    pub search_url: String,

    /// Origin prefixed to relative product links
    #[serde(rename = "site-origin")]
    pub site_origin: String,

    /// Number of result pages fetched per crawl
    #[serde(rename = "total-pages")]
    pub total_pages: u32,

    /// Lower bound of the delay between page fetches (milliseconds, inclusive)
    #[serde(rename = "min-delay-ms", default = "default_min_delay_ms")]
    pub min_delay_ms: u64,

    /// Upper bound of the delay between page fetches (milliseconds, inclusive)
    #[serde(rename = "max-delay-ms", default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Whole-request timeout for a page fetch
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Client identity sent with every page request
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    #[serde(default = "default_user_agent")]
    pub value: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            value: default_user_agent(),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Read API listener and credentials
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,
}

/// CSS selectors used to pull product fields out of a result page
#[derive(Debug, Clone, Deserialize)]
pub struct SelectorConfig {
    #[serde(rename = "result-item", default = "default_result_item")]
    pub result_item: String,

    #[serde(default = "default_title")]
    pub title: String,

    #[serde(default = "default_price")]
    pub price: String,

    #[serde(default = "default_rating")]
    pub rating: String,

    /// Anchor whose `href` is the product detail link
    #[serde(default = "default_link")]
    pub link: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            result_item: default_result_item(),
            title: default_title(),
            price: default_price(),
            rating: default_rating(),
            link: default_link(),
        }
    }
}

fn default_min_delay_ms() -> u64 {
    2000
}

fn default_max_delay_ms() -> u64 {
    5000
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/128.0.0.0 Safari/537.36".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3005
}

fn default_result_item() -> String {
    ".s-main-slot .s-result-item".to_string()
}

fn default_title() -> String {
    "h2 a span".to_string()
}

fn default_price() -> String {
    ".a-price span.a-offscreen".to_string()
}

fn default_rating() -> String {
    ".a-row span.a-icon-alt".to_string()
}

fn default_link() -> String {
    "h2 a".to_string()
}
