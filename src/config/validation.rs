use crate::config::types::{
    ApiConfig, Config, CrawlerConfig, SelectorConfig, StorageConfig, UserAgentConfig,
};
use crate::{ConfigError, ConfigResult};
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_storage_config(&config.storage)?;
    validate_api_config(&config.api)?;
    validate_selectors(&config.selectors)?;
    Ok(())
}

/// Validates crawl job and pacing configuration
fn validate_crawler_config(config: &CrawlerConfig) -> ConfigResult<()> {
    validate_http_url("search-url", &config.search_url)?;
    validate_http_url("site-origin", &config.site_origin)?;

    if config.total_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "total-pages must be >= 1, got {}",
            config.total_pages
        )));
    }

    if config.min_delay_ms > config.max_delay_ms {
        return Err(ConfigError::Validation(format!(
            "min-delay-ms ({}) must not exceed max-delay-ms ({})",
            config.min_delay_ms, config.max_delay_ms
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request-timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_user_agent_config(config: &UserAgentConfig) -> ConfigResult<()> {
    if config.value.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent value cannot be empty".to_string(),
        ));
    }

    // Must be usable as an HTTP header value
    if config.value.chars().any(|c| c.is_control()) {
        return Err(ConfigError::Validation(
            "user-agent value cannot contain control characters".to_string(),
        ));
    }

    Ok(())
}

fn validate_storage_config(config: &StorageConfig) -> ConfigResult<()> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates API credentials
///
/// Credentials may come from the file or from `BASIC_AUTH_USERNAME` /
/// `BASIC_AUTH_PASSWORD`; either way they must be set by now.
fn validate_api_config(config: &ApiConfig) -> ConfigResult<()> {
    if config.username.is_empty() {
        return Err(ConfigError::Validation(
            "api username cannot be empty (set it in [api] or BASIC_AUTH_USERNAME)".to_string(),
        ));
    }

    if config.username.contains(':') {
        return Err(ConfigError::Validation(
            "api username cannot contain ':'".to_string(),
        ));
    }

    if config.password.is_empty() {
        return Err(ConfigError::Validation(
            "api password cannot be empty (set it in [api] or BASIC_AUTH_PASSWORD)".to_string(),
        ));
    }

    if config.host.is_empty() {
        return Err(ConfigError::Validation("api host cannot be empty".to_string()));
    }

    Ok(())
}

fn validate_selectors(config: &SelectorConfig) -> ConfigResult<()> {
    for (name, raw) in [
        ("result-item", &config.result_item),
        ("title", &config.title),
        ("price", &config.price),
        ("rating", &config.rating),
        ("link", &config.link),
    ] {
        Selector::parse(raw).map_err(|e| {
            ConfigError::InvalidSelector(format!("{} selector '{}': {}", name, raw, e))
        })?;
    }

    Ok(())
}

fn validate_http_url(name: &str, value: &str) -> ConfigResult<()> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", name, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "{} '{}' must use HTTP or HTTPS scheme",
            name, value
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            crawler: CrawlerConfig {
                search_url: "https://www.example.com/s?k=laptops".to_string(),
                site_origin: "https://www.example.com".to_string(),
                total_pages: 3,
                min_delay_ms: 2000,
                max_delay_ms: 5000,
                request_timeout_secs: 30,
            },
            user_agent: UserAgentConfig::default(),
            storage: StorageConfig {
                database_path: "./test.db".to_string(),
            },
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 3005,
                username: "admin".to_string(),
                password: "secret".to_string(),
            },
            selectors: SelectorConfig::default(),
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_zero_pages_rejected() {
        let mut config = valid_config();
        config.crawler.total_pages = 0;
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_delay_bounds_must_be_ordered() {
        let mut config = valid_config();
        config.crawler.min_delay_ms = 6000;
        assert!(validate(&config).is_err());

        config.crawler.max_delay_ms = 6000;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_bad_urls_rejected() {
        let mut config = valid_config();
        config.crawler.search_url = "not a url".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));

        let mut config = valid_config();
        config.crawler.site_origin = "ftp://example.com".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_bad_selector_rejected() {
        let mut config = valid_config();
        config.selectors.price = "..[[".to_string();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidSelector(_))
        ));
    }

    #[test]
    fn test_missing_credentials_rejected() {
        let mut config = valid_config();
        config.api.password.clear();
        assert!(validate(&config).is_err());

        let mut config = valid_config();
        config.api.username = "ad:min".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_empty_user_agent_rejected() {
        let mut config = valid_config();
        config.user_agent.value = "   ".to_string();
        assert!(validate(&config).is_err());
    }
}
