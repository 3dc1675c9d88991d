use data_model_cvgen::models::CorruptRecord;
use data_model_cvgen::{DispatchError, StoreError};
use uuid::Uuid;

/// Failures surfaced by the job lifecycle.
#[derive(Debug)]
pub enum Error {
    /// The submitted URL does not parse.
    InvalidUrl(url::ParseError),

    /// The submitted URL is not http(s).
    UnsupportedScheme(String),

    /// Scraping the posting failed; the job was marked FAILED.
    Scrape(ScrapeError),

    /// Scheduling generation failed; the job was marked FAILED.
    Dispatch(DispatchError),

    /// No job exists with this id.
    JobNotFound(Uuid),

    /// Generation was requested before the posting was stored.
    NotReady(Uuid),

    /// Stored job fields disagree with its status.
    Corrupt(CorruptRecord),

    /// The job store itself failed. Nothing could be recorded on the job.
    Store(StoreError),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidUrl(err) => write!(f, "Not a valid URL: {}", err),
            Error::UnsupportedScheme(scheme) => write!(f, "Only http and https URLs are supported, got: {}", scheme),
            Error::Scrape(err) => write!(f, "Scraping failed: {}", err),
            Error::Dispatch(err) => write!(f, "Failed to schedule generation: {}", err),
            Error::JobNotFound(job_id) => write!(f, "Job not found: {}", job_id),
            Error::NotReady(job_id) => write!(f, "Job {} has not finished scraping", job_id),
            Error::Corrupt(err) => write!(f, "Corrupt job record: {}", err),
            Error::Store(err) => write!(f, "Job store error: {}", err),
        }
    }
}

impl std::error::Error for Error {}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::InvalidUrl(err)
    }
}

impl From<ScrapeError> for Error {
    fn from(err: ScrapeError) -> Self {
        Error::Scrape(err)
    }
}

impl From<DispatchError> for Error {
    fn from(err: DispatchError) -> Self {
        Error::Dispatch(err)
    }
}

impl From<CorruptRecord> for Error {
    fn from(err: CorruptRecord) -> Self {
        Error::Corrupt(err)
    }
}

/// A missing job is a lifecycle outcome, not a storage fault.
impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::JobNotFound(job_id) => Error::JobNotFound(job_id),
            _ => Error::Store(err),
        }
    }
}

/// Why a posting could not be scraped.
#[derive(Debug)]
pub enum ScrapeError {
    /// Scraper is missing configuration (e.g. an API key).
    Config(String),

    /// Transport failure talking to the scraping service.
    Http(reqwest::Error),

    /// The scraping service answered with a non-success HTTP status.
    Api { status: u16, message: String },

    /// The scraping service answered but reported failure.
    Unsuccessful(String),

    /// The scraping service returned no extracted fields.
    MissingExtract,

    /// The extracted fields do not have the posting's shape.
    Malformed(serde_json::Error),

    /// The posting lacks required fields.
    Incomplete(Vec<&'static str>),

    /// Any other failure, described.
    Other(String),
}

impl std::fmt::Display for ScrapeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScrapeError::Config(msg) => write!(f, "Scraper misconfigured: {}", msg),
            ScrapeError::Http(err) => write!(f, "Scraper request failed: {}", err),
            ScrapeError::Api { status, message } => write!(f, "Scraper API returned {}: {}", status, message),
            ScrapeError::Unsuccessful(msg) => write!(f, "Scraper reported failure: {}", msg),
            ScrapeError::MissingExtract => write!(f, "Scraper returned no extracted job data"),
            ScrapeError::Malformed(err) => write!(f, "Scraped job data is malformed: {}", err),
            ScrapeError::Incomplete(fields) => write!(f, "Scraped job data is missing: {}", fields.join(", ")),
            ScrapeError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ScrapeError {}

impl From<reqwest::Error> for ScrapeError {
    fn from(err: reqwest::Error) -> Self {
        ScrapeError::Http(err)
    }
}

impl From<serde_json::Error> for ScrapeError {
    fn from(err: serde_json::Error) -> Self {
        ScrapeError::Malformed(err)
    }
}

/// Why generated content could not be produced.
#[derive(Debug)]
pub enum GenerationError {
    /// Internal error: prompt substitution failed.
    PromptCreationFailure(subst::Error),

    /// Error calling ChatGPT
    ChatGptError(async_openai::error::OpenAIError),

    /// The model returned no content.
    EmptyResponse,

    /// The model's output cannot be parsed into the expected structure.
    Unparseable(String),

    /// The output parsed but its values are unusable.
    InvalidContent(String),

    /// Any other provider failure, described.
    Provider(String),
}

impl std::fmt::Display for GenerationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationError::PromptCreationFailure(err) => write!(f, "Failed to create prompt: {}", err),
            GenerationError::ChatGptError(err) => write!(f, "Error calling ChatGPT: {}", err),
            GenerationError::EmptyResponse => write!(f, "Language model returned an empty response"),
            GenerationError::Unparseable(msg) => write!(f, "Language model output is not valid JSON content: {}", msg),
            GenerationError::InvalidContent(msg) => write!(f, "Language model output is invalid: {}", msg),
            GenerationError::Provider(msg) => write!(f, "Language model provider error: {}", msg),
        }
    }
}

impl std::error::Error for GenerationError {}

impl From<subst::Error> for GenerationError {
    fn from(err: subst::Error) -> Self {
        GenerationError::PromptCreationFailure(err)
    }
}

impl From<async_openai::error::OpenAIError> for GenerationError {
    fn from(err: async_openai::error::OpenAIError) -> Self {
        GenerationError::ChatGptError(err)
    }
}
