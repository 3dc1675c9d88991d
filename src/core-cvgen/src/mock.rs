//! Mock collaborators for testing
//!
//! Scrapers, generators, LLM providers and dispatchers that return canned results without
//! making network calls. Each mock counts its calls so tests can assert what was (not) invoked.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use data_model_cvgen::models::{GeneratedContent, GenerationRequest, JobPosting};
use data_model_cvgen::{DispatchError, Dispatcher};
use url::Url;

use crate::generate::{GenerationInput, TextGenerator};
use crate::llms::LlmProvider;
use crate::scrape::Scraper;
use crate::{GenerationError, ScrapeError};

//
// Scraper
//

pub struct MockScraper {
    posting: Option<JobPosting>,
    failure: Option<String>,
    calls: AtomicUsize,
}

impl MockScraper {
    /// Returns `posting` for every URL.
    pub fn returning(posting: JobPosting) -> Self {
        Self {
            posting: Some(posting),
            failure: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Fails every scrape with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            posting: None,
            failure: Some(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Scraper for MockScraper {
    async fn extract(&self, _url: &Url) -> Result<JobPosting, ScrapeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match (&self.posting, &self.failure) {
            (Some(posting), _) => Ok(posting.clone()),
            (None, Some(message)) => Err(ScrapeError::Other(message.clone())),
            (None, None) => Err(ScrapeError::MissingExtract),
        }
    }
}

//
// Text generator
//

enum GeneratorBehavior {
    Content(GeneratedContent),
    Fail(String),
    Unparseable,
}

pub struct MockTextGenerator {
    behavior: GeneratorBehavior,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockTextGenerator {
    pub fn returning(content: GeneratedContent) -> Self {
        Self::with_behavior(GeneratorBehavior::Content(content))
    }

    /// Fails like a provider outage.
    pub fn failing(message: &str) -> Self {
        Self::with_behavior(GeneratorBehavior::Fail(message.to_string()))
    }

    /// Fails like a model that answered with prose instead of JSON.
    pub fn unparseable() -> Self {
        Self::with_behavior(GeneratorBehavior::Unparseable)
    }

    fn with_behavior(behavior: GeneratorBehavior) -> Self {
        Self {
            behavior,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Sleeps before answering, so concurrent callers overlap.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for MockTextGenerator {
    async fn generate(&self, _input: &GenerationInput) -> Result<GeneratedContent, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.behavior {
            GeneratorBehavior::Content(content) => Ok(content.clone()),
            GeneratorBehavior::Fail(message) => Err(GenerationError::Provider(message.clone())),
            GeneratorBehavior::Unparseable => Err(GenerationError::Unparseable(
                "expected value at line 1 column 1".to_string(),
            )),
        }
    }
}

//
// LLM provider
//

/// Mock LLM provider for testing
///
/// Can be configured to:
/// - Return specific responses based on prompt content
/// - Return a default response for any prompt
/// - Simulate API failures
#[derive(Default)]
pub struct MockLlmProvider {
    /// If the prompt contains the key, return the corresponding response
    responses: HashMap<String, String>,
    default_response: Option<String>,
    should_fail: bool,
}

impl MockLlmProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock that returns a specific response when the prompt contains the given text
    pub fn with_response(prompt_contains: &str, response: &str) -> Self {
        let mut provider = Self::new();
        provider.add_response(prompt_contains, response);
        provider
    }

    /// Create a mock with a default response for any prompt
    pub fn with_default(response: &str) -> Self {
        let mut provider = Self::new();
        provider.set_default(response);
        provider
    }

    /// Create a mock that always fails with an error
    pub fn with_failure() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    pub fn add_response(&mut self, prompt_contains: &str, response: &str) {
        self.responses.insert(prompt_contains.to_string(), response.to_string());
    }

    pub fn set_default(&mut self, response: &str) {
        self.default_response = Some(response.to_string());
    }

    pub fn set_should_fail(&mut self, should_fail: bool) {
        self.should_fail = should_fail;
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    async fn complete_prompt(&self, prompt: &str) -> Result<String, GenerationError> {
        if self.should_fail {
            return Err(GenerationError::Provider(
                "Mock LLM provider configured to fail".to_string(),
            ));
        }

        for (key, response) in &self.responses {
            if prompt.contains(key) {
                return Ok(response.clone());
            }
        }

        self.default_response.clone().ok_or_else(|| {
            GenerationError::Provider("Mock LLM provider has no response configured for this prompt".to_string())
        })
    }
}

//
// Dispatcher
//

/// A dispatcher whose queue is always down.
#[derive(Default)]
pub struct FailingDispatcher {
    calls: AtomicUsize,
}

impl FailingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Dispatcher for FailingDispatcher {
    async fn schedule(&self, _request: &GenerationRequest) -> Result<(), DispatchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(DispatchError::Unavailable("queue is down".to_string()))
    }
}

//
// Test Fixtures
//

/// A well-formed model answer for the sample posting and profile.
pub fn sample_llm_response() -> &'static str {
    r#"{
  "cv": "John Doe\nBackend engineer with 3 years of Python and AWS.",
  "motivation_letter": "Dear Example Corp,\nI would love to join your team.",
  "compatibility_percentage": 85
}"#
}
