pub mod common;
pub mod errors;
pub mod generate;
pub mod lifecycle;
pub mod llms;
pub mod scrape;

#[cfg(any(test, feature = "test-helpers"))]
pub mod mock;

pub use common::*;
pub use errors::{Error, GenerationError, ScrapeError};
pub use generate::{GenerationInput, LlmTextGenerator, TextGenerator};
pub use lifecycle::{JobLifecycleController, ProcessOutcome, Processor, Submitter, is_valid_url, job_status};
pub use llms::{ChatGpt, LlmProvider};
pub use scrape::{FirecrawlConfig, FirecrawlScraper, Scraper};
