//! The job lifecycle: `SCRAPING -> PROCESSING -> COMPLETED | FAILED`.
//!
//! A job is driven by two independent invocations that share nothing but the [`JobStore`] and the
//! [`Dispatcher`] queue:
//!
//! 1. [`Submitter::submit`] creates the job, scrapes the posting, stores it and dispatches a
//!    [`GenerationRequest`]. It returns as soon as the request is dispatched.
//! 2. [`Processor::process`] consumes a request, generates the application material and records
//!    the terminal status. Requests may be delivered more than once; only the first delivery that
//!    reaches a terminal write has any effect.
//!
//! Any collaborator failure is recorded on the job as `FAILED` with its message. Store failures are
//! returned to the caller untouched, since there is nowhere to record them.

use std::sync::Arc;

use data_model_cvgen::models::{
    GeneratedContent, GenerationRequest, JobPhase, JobPosting, JobRecord, JobStatus, JobTransition, JobView,
    UserProfile,
};
use data_model_cvgen::{Dispatcher, JobStore, StoreError};
use url::Url;
use uuid::Uuid;

use crate::errors::{Error, ScrapeError};
use crate::generate::{GenerationInput, TextGenerator};
use crate::scrape::Scraper;

/// Parses `url` and accepts only http(s).
pub fn is_valid_url(url: &str) -> Result<Url, Error> {
    let parsed = Url::parse(url.trim())?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(Error::UnsupportedScheme(other.to_string())),
    }
}

/// Result of one delivery of a generation request.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessOutcome {
    /// Generated content was stored; the job is now COMPLETED.
    Completed(GeneratedContent),
    /// Generation failed; the job is now FAILED with this message.
    Failed(String),
    /// The job was already terminal. Nothing was written.
    AlreadyFinished(JobStatus),
}

/// Runs the synchronous half of a job: create, scrape, store, dispatch.
#[derive(Clone)]
pub struct Submitter {
    store: Arc<dyn JobStore>,
    scraper: Arc<dyn Scraper>,
    dispatcher: Arc<dyn Dispatcher>,
}

impl Submitter {
    pub fn new(store: Arc<dyn JobStore>, scraper: Arc<dyn Scraper>, dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self {
            store,
            scraper,
            dispatcher,
        }
    }

    /// Starts a job for `url` and returns its id once generation has been dispatched.
    ///
    /// An invalid URL is rejected before any job exists. A scrape or dispatch failure leaves the
    /// job FAILED and is returned as `Error::Scrape` / `Error::Dispatch`.
    pub async fn submit(&self, url: &str, user_profile: Option<UserProfile>) -> Result<Uuid, Error> {
        let url = is_valid_url(url)?;

        let job_id = Uuid::new_v4();
        self.store
            .create(&JobRecord::new_scraping(job_id, url.to_string()))
            .await?;
        tracing::info!("[job: {}] Created for {}", job_id, url);

        let job_data = match self.scrape(&url).await {
            Ok(job_data) => job_data,
            Err(e) => {
                tracing::warn!("[job: {}] Scrape failed: {}", job_id, e);
                mark_failed(self.store.as_ref(), job_id, &e.to_string()).await?;
                return Err(Error::Scrape(e));
            }
        };

        self.store
            .update(job_id, &JobTransition::Processing { job_data })
            .await?;
        tracing::info!("[job: {}] Posting stored, dispatching generation", job_id);

        let request = GenerationRequest { job_id, user_profile };
        if let Err(e) = self.dispatcher.schedule(&request).await {
            tracing::error!("[job: {}] Dispatch failed: {}", job_id, e);
            mark_failed(self.store.as_ref(), job_id, &format!("Failed to schedule generation: {}", e)).await?;
            return Err(Error::Dispatch(e));
        }

        Ok(job_id)
    }

    async fn scrape(&self, url: &Url) -> Result<JobPosting, ScrapeError> {
        let posting = self.scraper.extract(url).await?;
        let missing = posting.missing_fields();
        if missing.is_empty() {
            Ok(posting)
        } else {
            Err(ScrapeError::Incomplete(missing))
        }
    }
}

/// Runs the asynchronous half of a job: generate, then record the terminal status.
#[derive(Clone)]
pub struct Processor {
    store: Arc<dyn JobStore>,
    generator: Arc<dyn TextGenerator>,
}

impl Processor {
    pub fn new(store: Arc<dyn JobStore>, generator: Arc<dyn TextGenerator>) -> Self {
        Self { store, generator }
    }

    /// Handles one delivery of `request`. Safe to call any number of times for the same job.
    pub async fn process(&self, request: &GenerationRequest) -> Result<ProcessOutcome, Error> {
        let job_id = request.job_id;
        let record = self.store.get(job_id).await?.ok_or(Error::JobNotFound(job_id))?;

        if record.status.is_terminal() {
            tracing::info!("[job: {}] Already {}, skipping redelivered request", job_id, record.status);
            return Ok(ProcessOutcome::AlreadyFinished(record.status));
        }

        let job_data = match record.to_phase() {
            Ok(JobPhase::Processing { job_data }) => job_data,
            Ok(JobPhase::Scraping) => return Err(Error::NotReady(job_id)),
            Ok(phase) => return Ok(ProcessOutcome::AlreadyFinished(phase.status())),
            Err(corrupt) => {
                tracing::error!("[job: {}] {}", job_id, corrupt);
                mark_failed(self.store.as_ref(), job_id, &corrupt.to_string()).await?;
                return Err(Error::Corrupt(corrupt));
            }
        };

        let input = GenerationInput {
            job_posting: job_data,
            user_profile: request.user_profile.clone(),
        };

        tracing::debug!("[job: {}] Generating application material", job_id);
        let (transition, outcome) = match self.generator.generate(&input).await {
            Ok(result) => (
                JobTransition::Completed { result: result.clone() },
                ProcessOutcome::Completed(result),
            ),
            Err(e) => {
                tracing::warn!("[job: {}] Generation failed: {}", job_id, e);
                let error = failure_message(&e.to_string());
                (JobTransition::Failed { error: error.clone() }, ProcessOutcome::Failed(error))
            }
        };

        match self.store.update(job_id, &transition).await {
            Ok(record) => {
                tracing::info!("[job: {}] Finished as {}", job_id, record.status);
                Ok(outcome)
            }
            // Another delivery finished the job first.
            Err(StoreError::InvalidTransition { from, .. }) if from.is_terminal() => {
                tracing::info!("[job: {}] Lost race to another delivery, job is {}", job_id, from);
                Ok(ProcessOutcome::AlreadyFinished(from))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// What a poller sees for `job_id`.
pub async fn job_status(store: &dyn JobStore, job_id: Uuid) -> Result<JobView, Error> {
    let record = store.get(job_id).await?.ok_or(Error::JobNotFound(job_id))?;
    Ok(JobView::from_record(&record)?)
}

/// The message stored on a FAILED job. Never blank.
fn failure_message(error: &str) -> String {
    if error.trim().is_empty() {
        "unknown error".to_string()
    } else {
        error.to_string()
    }
}

async fn mark_failed(store: &dyn JobStore, job_id: Uuid, error: &str) -> Result<(), Error> {
    let error = failure_message(error);
    store.update(job_id, &JobTransition::Failed { error }).await?;
    Ok(())
}

/// Both halves of the lifecycle over one set of collaborators.
///
/// Deployed processes only need one half each: the API holds a [`Submitter`], the worker a
/// [`Processor`]. The controller is for running the whole lifecycle in one process.
#[derive(Clone)]
pub struct JobLifecycleController {
    store: Arc<dyn JobStore>,
    submitter: Submitter,
    processor: Processor,
}

impl JobLifecycleController {
    pub fn new(
        store: Arc<dyn JobStore>,
        scraper: Arc<dyn Scraper>,
        generator: Arc<dyn TextGenerator>,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> Self {
        Self {
            submitter: Submitter::new(store.clone(), scraper, dispatcher),
            processor: Processor::new(store.clone(), generator),
            store,
        }
    }

    pub async fn submit(&self, url: &str, user_profile: Option<UserProfile>) -> Result<Uuid, Error> {
        self.submitter.submit(url, user_profile).await
    }

    pub async fn process(&self, request: &GenerationRequest) -> Result<ProcessOutcome, Error> {
        self.processor.process(request).await
    }

    pub async fn get_status(&self, job_id: Uuid) -> Result<JobView, Error> {
        job_status(self.store.as_ref(), job_id).await
    }

    pub fn submitter(&self) -> &Submitter {
        &self.submitter
    }

    pub fn processor(&self) -> &Processor {
        &self.processor
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::time::Duration;

    use super::*;
    use crate::GenerationError;
    use crate::mock::{FailingDispatcher, MockScraper, MockTextGenerator};
    use data_model_cvgen::test_helpers::{
        create_test_job, sample_generated_content, sample_job_posting, sample_user_profile,
    };
    use data_model_cvgen::{MemoryDispatcher, MemoryJobStore};

    const URL: &str = "https://example.com/job/123";

    struct Harness {
        store: Arc<MemoryJobStore>,
        scraper: Arc<MockScraper>,
        generator: Arc<MockTextGenerator>,
        dispatcher: Arc<MemoryDispatcher>,
        controller: JobLifecycleController,
    }

    fn harness(scraper: MockScraper, generator: MockTextGenerator) -> Harness {
        let store = Arc::new(MemoryJobStore::new());
        let scraper = Arc::new(scraper);
        let generator = Arc::new(generator);
        let dispatcher = Arc::new(MemoryDispatcher::new());
        let controller = JobLifecycleController::new(
            store.clone(),
            scraper.clone(),
            generator.clone(),
            dispatcher.clone(),
        );
        Harness {
            store,
            scraper,
            generator,
            dispatcher,
            controller,
        }
    }

    fn happy_harness() -> Harness {
        harness(
            MockScraper::returning(sample_job_posting()),
            MockTextGenerator::returning(sample_generated_content()),
        )
    }

    async fn stored(store: &MemoryJobStore, job_id: Uuid) -> JobRecord {
        store.get(job_id).await.unwrap().expect("job exists")
    }

    #[test]
    fn test_is_valid_url() {
        assert_eq!(is_valid_url(" https://example.com/job/123 ").unwrap().as_str(), URL);
        assert!(matches!(is_valid_url("not a url"), Err(Error::InvalidUrl(_))));
        assert!(matches!(is_valid_url(""), Err(Error::InvalidUrl(_))));
        assert!(matches!(
            is_valid_url("ftp://example.com/job.txt"),
            Err(Error::UnsupportedScheme(scheme)) if scheme == "ftp"
        ));
    }

    #[tokio::test]
    async fn test_submit_issues_fresh_ids_and_never_completes_synchronously() {
        let h = happy_harness();
        let mut ids = HashSet::new();
        for _ in 0..5 {
            let job_id = h.controller.submit(URL, None).await.unwrap();
            assert!(ids.insert(job_id), "job id reused: {}", job_id);

            let view = h.controller.get_status(job_id).await.unwrap();
            assert_ne!(view.status, JobStatus::Completed);
            assert_eq!(view.status, JobStatus::Processing);
        }
        assert_eq!(h.generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_successful_scrape_stores_posting_and_dispatches() {
        let h = happy_harness();
        let job_id = h.controller.submit(URL, Some(sample_user_profile())).await.unwrap();

        let record = stored(&h.store, job_id).await;
        assert_eq!(record.url, URL);
        assert_eq!(
            record.to_phase().unwrap(),
            JobPhase::Processing {
                job_data: sample_job_posting()
            }
        );

        assert_eq!(
            h.dispatcher.pending(),
            vec![GenerationRequest {
                job_id,
                user_profile: Some(sample_user_profile()),
            }]
        );
    }

    #[tokio::test]
    async fn test_failed_scrape_fails_job_without_dispatch() {
        let h = harness(
            MockScraper::failing("page returned 403"),
            MockTextGenerator::returning(sample_generated_content()),
        );

        let result = h.controller.submit(URL, None).await;
        assert!(matches!(result, Err(Error::Scrape(_))));

        assert_eq!(h.store.len().await, 1);
        assert!(h.dispatcher.pending().is_empty());

        assert_eq!(h.scraper.calls(), 1);
        let record = stored(&h.store, h.store.ids().await[0]).await;
        assert_eq!(record.status, JobStatus::Failed);
        assert!(record.error.as_deref().is_some_and(|e| e.contains("page returned 403")));
        assert!(record.job_data.is_none());
    }

    #[tokio::test]
    async fn test_incomplete_posting_is_a_scrape_failure() {
        let incomplete = JobPosting {
            job_description: String::new(),
            ..sample_job_posting()
        };
        let h = harness(
            MockScraper::returning(incomplete),
            MockTextGenerator::returning(sample_generated_content()),
        );

        let result = h.controller.submit(URL, None).await;
        assert!(matches!(
            result,
            Err(Error::Scrape(ScrapeError::Incomplete(fields))) if fields == vec!["job_description"]
        ));
        assert!(h.dispatcher.pending().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_url_creates_no_job() {
        let h = happy_harness();
        assert!(matches!(
            h.controller.submit("example dot com", None).await,
            Err(Error::InvalidUrl(_))
        ));
        assert!(h.store.is_empty().await);
        assert_eq!(h.scraper.calls(), 0);
    }

    #[tokio::test]
    async fn test_dispatch_failure_fails_job() {
        let store = Arc::new(MemoryJobStore::new());
        let dispatcher = Arc::new(FailingDispatcher::new());
        let submitter = Submitter::new(
            store.clone(),
            Arc::new(MockScraper::returning(sample_job_posting())),
            dispatcher.clone(),
        );

        let result = submitter.submit(URL, None).await;
        assert!(matches!(result, Err(Error::Dispatch(_))));
        assert_eq!(dispatcher.calls(), 1);

        let job_id = store.ids().await[0];
        let record = stored(&store, job_id).await;
        assert_eq!(record.status, JobStatus::Failed);
        assert!(record.error.unwrap().contains("queue is down"));
        // The posting scraped before the failure is kept.
        assert!(record.job_data.is_some());
    }

    #[tokio::test]
    async fn test_process_completes_and_is_idempotent() {
        let h = happy_harness();
        let job_id = h.controller.submit(URL, None).await.unwrap();
        let request = h.dispatcher.pop().unwrap();

        let outcome = h.controller.process(&request).await.unwrap();
        assert_eq!(outcome, ProcessOutcome::Completed(sample_generated_content()));
        let completed = stored(&h.store, job_id).await;
        assert_eq!(completed.status, JobStatus::Completed);

        let outcome = h.controller.process(&request).await.unwrap();
        assert_eq!(outcome, ProcessOutcome::AlreadyFinished(JobStatus::Completed));
        assert_eq!(stored(&h.store, job_id).await, completed);
        assert_eq!(h.generator.calls(), 1);
    }

    #[tokio::test]
    async fn test_process_generation_failure_fails_job() {
        let h = harness(
            MockScraper::returning(sample_job_posting()),
            MockTextGenerator::unparseable(),
        );
        let job_id = h.controller.submit(URL, None).await.unwrap();
        let request = h.dispatcher.pop().unwrap();

        let outcome = h.controller.process(&request).await.unwrap();
        let expected = GenerationError::Unparseable("expected value at line 1 column 1".to_string()).to_string();
        assert_eq!(outcome, ProcessOutcome::Failed(expected.clone()));

        let view = h.controller.get_status(job_id).await.unwrap();
        assert_eq!(view.status, JobStatus::Failed);
        assert_eq!(view.error, Some(expected));
        assert_eq!(view.result, None);

        // A redelivery after failure is also a no-op.
        let outcome = h.controller.process(&request).await.unwrap();
        assert_eq!(outcome, ProcessOutcome::AlreadyFinished(JobStatus::Failed));
        assert_eq!(h.generator.calls(), 1);
    }

    #[tokio::test]
    async fn test_process_unknown_job_mutates_nothing() {
        let h = happy_harness();
        let existing = create_test_job(
            h.store.as_ref(),
            URL,
            JobPhase::Processing {
                job_data: sample_job_posting(),
            },
        )
        .await;

        let unknown = Uuid::new_v4();
        let result = h
            .controller
            .process(&GenerationRequest {
                job_id: unknown,
                user_profile: None,
            })
            .await;
        assert!(matches!(result, Err(Error::JobNotFound(id)) if id == unknown));

        assert_eq!(h.store.len().await, 1);
        assert_eq!(stored(&h.store, existing.job_id).await, existing);
        assert_eq!(h.generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_process_before_scrape_finishes_is_not_ready() {
        let h = happy_harness();
        let scraping = create_test_job(h.store.as_ref(), URL, JobPhase::Scraping).await;

        let result = h
            .controller
            .process(&GenerationRequest {
                job_id: scraping.job_id,
                user_profile: None,
            })
            .await;
        assert!(matches!(result, Err(Error::NotReady(_))));
        assert_eq!(stored(&h.store, scraping.job_id).await, scraping);
    }

    #[tokio::test]
    async fn test_process_corrupt_record_fails_job() {
        let h = happy_harness();
        let mut record = JobRecord::new_scraping(Uuid::new_v4(), URL.to_string());
        record.status = JobStatus::Processing;
        record.job_data = Some(serde_json::json!({ "title": "Engineer", "description": "Build things" }));
        h.store.create(&record).await.unwrap();

        let result = h
            .controller
            .process(&GenerationRequest {
                job_id: record.job_id,
                user_profile: None,
            })
            .await;
        assert!(matches!(result, Err(Error::Corrupt(_))));
        assert_eq!(stored(&h.store, record.job_id).await.status, JobStatus::Failed);
        assert_eq!(h.generator.calls(), 0);

        // The failure stays readable even though the stored posting is not.
        let view = h.controller.get_status(record.job_id).await.unwrap();
        assert_eq!(view.status, JobStatus::Failed);
        assert!(view.error.unwrap().contains("unreadable json"));
        assert!(view.result.is_none());
    }

    #[test]
    fn test_failure_message_is_never_blank() {
        assert_eq!(failure_message(""), "unknown error");
        assert_eq!(failure_message("  \n"), "unknown error");
        assert_eq!(failure_message("rate limited"), "rate limited");
    }

    #[tokio::test]
    async fn test_concurrent_deliveries_write_once() {
        let store = Arc::new(MemoryJobStore::new());
        let generator = Arc::new(
            MockTextGenerator::returning(sample_generated_content()).with_delay(Duration::from_millis(20)),
        );
        let processor = Processor::new(store.clone(), generator.clone());
        let job = create_test_job(
            store.as_ref(),
            URL,
            JobPhase::Processing {
                job_data: sample_job_posting(),
            },
        )
        .await;
        let request = GenerationRequest {
            job_id: job.job_id,
            user_profile: None,
        };

        let (first, second) = tokio::join!(processor.process(&request), processor.process(&request));
        let mut outcomes = vec![first.unwrap(), second.unwrap()];
        outcomes.sort_by_key(|o| matches!(o, ProcessOutcome::AlreadyFinished(_)));

        assert_eq!(
            outcomes,
            vec![
                ProcessOutcome::Completed(sample_generated_content()),
                ProcessOutcome::AlreadyFinished(JobStatus::Completed),
            ]
        );
        assert_eq!(stored(&store, job.job_id).await.status, JobStatus::Completed);
    }

    #[tokio::test]
    async fn test_status_of_unknown_job() {
        let h = happy_harness();
        assert!(matches!(
            h.controller.get_status(Uuid::new_v4()).await,
            Err(Error::JobNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_end_to_end_scenario() {
        let h = happy_harness();

        let job_id = h.controller.submit(URL, Some(sample_user_profile())).await.unwrap();

        let view = h.controller.get_status(job_id).await.unwrap();
        assert_eq!(view.status, JobStatus::Processing);
        let record = stored(&h.store, job_id).await;
        assert_eq!(record.job_data.as_ref().unwrap()["job_title"], "Engineer");

        let request = h.dispatcher.pop().unwrap();
        assert_eq!(request.job_id, job_id);
        h.controller.process(&request).await.unwrap();

        let view = h.controller.get_status(job_id).await.unwrap();
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["jobId"], job_id.to_string());
        assert_eq!(json["status"], "COMPLETED");
        assert_eq!(json["result"]["compatibility_percentage"], 85);
        assert!(json.get("error").is_none());
    }
}
