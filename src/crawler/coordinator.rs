//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the page loop that drives one crawl:
//! - Fetching each page of the search listing exactly once, in order
//! - Extracting records and inserting each page as one batch
//! - Pacing between pages with a randomized delay
//! - Isolating per-page failures so the loop always runs to completion
//! - Recording the run and its totals in the run log

use crate::config::Config;
use crate::crawler::fetcher::{build_http_client, PageFetcher};
use crate::crawler::pacing::Pacer;
use crate::crawler::parser::RecordExtractor;
use crate::record::PageBatch;
use crate::storage::{lock, RecordStore, RunTotals, SharedStorage, StorageResult};
use std::time::{Duration, Instant};

/// Runtime state of one crawl invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlJob {
    search_url: String,
    total_pages: u32,
    current_page: u32,
}

impl CrawlJob {
    pub fn new(search_url: impl Into<String>, total_pages: u32) -> Self {
        Self {
            search_url: search_url.into(),
            total_pages,
            current_page: 0,
        }
    }

    pub fn search_url(&self) -> &str {
        &self.search_url
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    /// The page being processed; 0 before the first page starts
    pub fn current_page(&self) -> u32 {
        self.current_page
    }
}

/// Counters for one finished crawl
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    pub pages_attempted: u32,
    pub pages_failed: u32,
    pub empty_pages: u32,
    pub batches_failed: u32,
    pub records_inserted: u64,
    pub elapsed: Duration,
}

impl CrawlReport {
    pub fn totals(&self) -> RunTotals {
        RunTotals {
            pages_failed: self.pages_failed,
            batches_failed: self.batches_failed,
            records_inserted: self.records_inserted,
        }
    }
}

/// What happened to a single page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageOutcome {
    FetchFailed,
    Empty,
    Inserted(usize),
    StoreFailed,
}

/// Main crawler coordinator structure
pub struct Coordinator<S> {
    job: CrawlJob,
    fetcher: PageFetcher,
    extractor: RecordExtractor,
    pacer: Pacer,
    storage: SharedStorage<S>,
    config_hash: String,
}

impl<S: RecordStore> Coordinator<S> {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The validated configuration
    /// * `storage` - Store handle shared with the read API
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(HarvestError)` - HTTP client, search URL or selectors were unusable
    pub fn new(config: &Config, storage: SharedStorage<S>) -> crate::Result<Self> {
        let client = build_http_client(&config.user_agent, config.crawler.request_timeout_secs)?;
        let fetcher = PageFetcher::new(client, &config.crawler)?;
        let extractor = RecordExtractor::new(&config.selectors, &config.crawler.site_origin)?;

        Ok(Self {
            job: CrawlJob::new(config.crawler.search_url.clone(), config.crawler.total_pages),
            fetcher,
            extractor,
            pacer: Pacer::from_config(&config.crawler),
            storage,
            config_hash: String::new(),
        })
    }

    /// Sets the configuration hash recorded with the run
    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = hash.into();
        self
    }

    pub fn job(&self) -> &CrawlJob {
        &self.job
    }

    /// Runs the page loop to completion
    ///
    /// For each page 1..=total, in order:
    /// 1. Fetch the page; on failure log it and skip to pacing
    /// 2. Extract the page batch
    /// 3. Insert a non-empty batch; on failure log it and continue
    /// 4. Sleep a random delay before the next page
    ///
    /// Never fails: every page is attempted exactly once and the report
    /// describes what happened.
    pub async fn run(&mut self) -> CrawlReport {
        let total = self.job.total_pages;
        let start_time = Instant::now();
        let mut report = CrawlReport::default();

        tracing::info!(
            "Starting crawl of {} pages from {}",
            total,
            self.job.search_url
        );
        let run_id = self.start_run();

        for page in 1..=total {
            self.job.current_page = page;
            report.pages_attempted += 1;

            match self.process_page(page).await {
                PageOutcome::FetchFailed => report.pages_failed += 1,
                PageOutcome::Empty => report.empty_pages += 1,
                PageOutcome::Inserted(count) => report.records_inserted += count as u64,
                PageOutcome::StoreFailed => report.batches_failed += 1,
            }

            if page < total {
                let delay = self.pacer.next_delay();
                tracing::info!(
                    "Waiting {:.1} seconds before scraping the next page...",
                    delay.as_secs_f64()
                );
                self.pacer.wait(delay).await;
            }
        }

        report.elapsed = start_time.elapsed();
        self.finish_run(run_id, &report);

        tracing::info!(
            "Crawl completed: {} pages attempted, {} failed, {} batches not stored, {} records inserted in {:?}",
            report.pages_attempted,
            report.pages_failed,
            report.batches_failed,
            report.records_inserted,
            report.elapsed
        );

        report
    }

    /// Fetches, extracts and stores a single page
    async fn process_page(&mut self, page: u32) -> PageOutcome {
        let markup = match self.fetcher.fetch(page).await {
            Ok(markup) => markup,
            Err(e) => {
                tracing::warn!("Error scraping page {}: {}", page, e);
                return PageOutcome::FetchFailed;
            }
        };

        let batch = self.extractor.extract(&markup);
        if batch.is_empty() {
            tracing::info!("Page {} yielded no records", page);
            return PageOutcome::Empty;
        }

        match self.store_batch(&batch) {
            Ok(inserted) => {
                tracing::info!("Data inserted successfully for page {}: {}", page, inserted);
                PageOutcome::Inserted(inserted)
            }
            Err(e) => {
                tracing::error!("Error inserting data for page {}: {}", page, e);
                PageOutcome::StoreFailed
            }
        }
    }

    fn store_batch(&self, batch: &PageBatch) -> StorageResult<usize> {
        let mut storage = lock(&self.storage)?;
        storage.insert_batch(batch)
    }

    /// Records the run start; a failure only loses the run log entry
    fn start_run(&self) -> Option<i64> {
        let result =
            lock(&self.storage).and_then(|mut s| s.create_run(&self.config_hash, self.job.total_pages));

        match result {
            Ok(run_id) => {
                tracing::debug!("Recorded crawl run {}", run_id);
                Some(run_id)
            }
            Err(e) => {
                tracing::warn!("Failed to record crawl run: {}", e);
                None
            }
        }
    }

    fn finish_run(&self, run_id: Option<i64>, report: &CrawlReport) {
        let Some(run_id) = run_id else {
            return;
        };

        let result = lock(&self.storage).and_then(|mut s| s.complete_run(run_id, &report.totals()));
        if let Err(e) = result {
            tracing::warn!("Failed to complete crawl run {}: {}", run_id, e);
        }
    }
}

/// Runs one complete crawl against the given store
///
/// # Returns
///
/// * `Ok(CrawlReport)` - The crawl ran (individual pages may still have failed)
/// * `Err(HarvestError)` - The coordinator could not be built
///
/// # Example
///
/// ```no_run
/// use listing_harvest::config::load_config;
/// use listing_harvest::crawler::run_crawl;
/// use listing_harvest::storage::{share, SqliteStorage};
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("harvest.toml"))?;
/// let storage = share(SqliteStorage::new(Path::new(&config.storage.database_path))?);
/// let report = run_crawl(&config, storage, "hash").await?;
/// println!("{} records", report.records_inserted);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl<S: RecordStore>(
    config: &Config,
    storage: SharedStorage<S>,
    config_hash: &str,
) -> crate::Result<CrawlReport> {
    let mut coordinator = Coordinator::new(config, storage)?.with_config_hash(config_hash);
    Ok(coordinator.run().await)
}
