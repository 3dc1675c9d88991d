//! Scrape phase: turn a job-posting URL into a structured `JobPosting`.

pub mod firecrawl;

use async_trait::async_trait;
use data_model_cvgen::models::JobPosting;
use url::Url;

use crate::ScrapeError;

pub use firecrawl::{FirecrawlConfig, FirecrawlScraper};

#[async_trait]
pub trait Scraper: Send + Sync {
    /// Extracts the posting at `url`. An incomplete posting is an error.
    async fn extract(&self, url: &Url) -> Result<JobPosting, ScrapeError>;
}
