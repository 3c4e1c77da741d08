//! Randomized pacing between page fetches
//!
//! A fixed interval is easy to fingerprint, so every gap between two page
//! requests is drawn independently and uniformly from an inclusive range.

use crate::config::CrawlerConfig;
use rand::Rng;
use std::time::Duration;

/// Draws and sleeps the delay between consecutive page fetches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacer {
    min_ms: u64,
    max_ms: u64,
}

impl Pacer {
    /// Creates a pacer over `[min_ms, max_ms]`; the bounds are swapped if reversed
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self {
            min_ms: min_ms.min(max_ms),
            max_ms: min_ms.max(max_ms),
        }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(config.min_delay_ms, config.max_delay_ms)
    }

    /// Returns a uniformly distributed delay within the inclusive bounds
    pub fn next_delay(&self) -> Duration {
        let ms = rand::rng().random_range(self.min_ms..=self.max_ms);
        Duration::from_millis(ms)
    }

    /// Suspends the calling task for `delay`
    pub async fn wait(&self, delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

impl Default for Pacer {
    fn default() -> Self {
        Self::new(2000, 5000)
    }
}
