use chrono::{DateTime, Utc};
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::pg::{Pg, PgValue};
use diesel::prelude::*;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::SqlType;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io::Write;
use uuid::Uuid;

// SQL type definition for the custom enum
// Note: uses snake_case to match the PostgreSQL type name
#[allow(non_camel_case_types)]
#[derive(SqlType, diesel::query_builder::QueryId, Debug, Clone, Copy)]
#[diesel(postgres_type(name = "job_status"))]
pub struct Job_status;

// JobStatus enum
/// Where a job is in its lifecycle.
///
/// Progression is forward only: `Scraping -> Processing -> Completed`, with `Failed` reachable
/// from either non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Job_status)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Job created, scraper is running
    Scraping,
    /// Posting scraped & stored, generation has been dispatched
    Processing,
    /// Generated content stored
    Completed,
    /// Scraping, dispatch or generation failed
    Failed,
}

impl JobStatus {
    /// True if the job's status is Completed or Failed.
    pub fn is_terminal(&self) -> bool {
        match self {
            Self::Scraping | Self::Processing => false,
            Self::Completed | Self::Failed => true,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Scraping => "SCRAPING",
            JobStatus::Processing => "PROCESSING",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ToSql<Job_status, Pg> for JobStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<Job_status, Pg> for JobStatus {
    fn from_sql(bytes: PgValue) -> deserialize::Result<Self> {
        match bytes.as_bytes() {
            b"SCRAPING" => Ok(JobStatus::Scraping),
            b"PROCESSING" => Ok(JobStatus::Processing),
            b"COMPLETED" => Ok(JobStatus::Completed),
            b"FAILED" => Ok(JobStatus::Failed),
            _ => Err("Unrecognized enum variant".into()),
        }
    }
}

//
// Payloads carried by a job
//

/// Structured fields extracted from a job-posting page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPosting {
    pub job_title: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub location: String,
    pub job_description: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary_range: Option<String>,
}

impl JobPosting {
    /// Names of the fields that must be non-blank for the posting to be usable.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.job_title.trim().is_empty() {
            missing.push("job_title");
        }
        if self.job_description.trim().is_empty() {
            missing.push("job_description");
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }
}

/// The applicant's profile, passed through from the submit request to the generation phase.
/// Unknown keys are preserved so that richer profiles reach the generator untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skills: Vec<String>,
    /// Free text or a list of positions; passed to the generator as given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience: Option<Value>,
    /// Free text or a list of degrees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub education: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Application material produced for a posting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedContent {
    pub cv: String,
    pub motivation_letter: String,
    pub compatibility_percentage: u8,
}

/// Asks the generation phase to run for a job. This is the only thing that crosses from the
/// submitting process to the generating process; everything else is read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub job_id: Uuid,
    #[serde(default, alias = "user_profile", skip_serializing_if = "Option::is_none")]
    pub user_profile: Option<UserProfile>,
}

//
// job table model (database representation)
//

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::job)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct JobRecord {
    pub job_id: Uuid,
    pub url: String,
    pub status: JobStatus,
    pub job_data: Option<Value>,
    pub result_data: Option<Value>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// JobPhase - ergonomic Rust enum for the job's status and the data each status carries
/// A job's state together with exactly the fields that state owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum JobPhase {
    Scraping,
    Processing {
        job_data: JobPosting,
    },
    Completed {
        job_data: JobPosting,
        result: GeneratedContent,
    },
    Failed {
        job_data: Option<JobPosting>,
        error: String,
    },
}

impl JobPhase {
    pub fn status(&self) -> JobStatus {
        match self {
            JobPhase::Scraping => JobStatus::Scraping,
            JobPhase::Processing { .. } => JobStatus::Processing,
            JobPhase::Completed { .. } => JobStatus::Completed,
            JobPhase::Failed { .. } => JobStatus::Failed,
        }
    }
}

/// A stored row whose columns disagree with its status.
#[derive(Debug, thiserror::Error)]
pub enum CorruptRecord {
    #[error("job {job_id} has status {status} but its fields do not match that status")]
    InconsistentFields { job_id: Uuid, status: JobStatus },
    #[error("job {job_id} has unreadable json: {source}")]
    Json {
        job_id: Uuid,
        #[source]
        source: serde_json::Error,
    },
}

impl JobRecord {
    /// A fresh record for a job whose posting is about to be scraped.
    pub fn new_scraping(job_id: Uuid, url: String) -> Self {
        let now = Utc::now();
        JobRecord {
            job_id,
            url,
            status: JobStatus::Scraping,
            job_data: None,
            result_data: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Convert database representation to ergonomic JobPhase enum
    pub fn to_phase(&self) -> Result<JobPhase, CorruptRecord> {
        let json_err = |source| CorruptRecord::Json {
            job_id: self.job_id,
            source,
        };
        let job_data = self
            .job_data
            .clone()
            .map(serde_json::from_value::<JobPosting>)
            .transpose()
            .map_err(json_err)?;
        let result = self
            .result_data
            .clone()
            .map(serde_json::from_value::<GeneratedContent>)
            .transpose()
            .map_err(json_err)?;

        match (self.status, job_data, result, self.error.clone()) {
            (JobStatus::Scraping, None, None, None) => Ok(JobPhase::Scraping),
            (JobStatus::Processing, Some(job_data), None, None) => Ok(JobPhase::Processing { job_data }),
            (JobStatus::Completed, Some(job_data), Some(result), None) => Ok(JobPhase::Completed { job_data, result }),
            (JobStatus::Failed, job_data, None, Some(error)) => Ok(JobPhase::Failed { job_data, error }),
            (status, ..) => Err(CorruptRecord::InconsistentFields {
                job_id: self.job_id,
                status,
            }),
        }
    }

    /// Create database representation from ergonomic JobPhase enum
    pub fn from_phase(job_id: Uuid, url: String, phase: JobPhase) -> Result<Self, serde_json::Error> {
        let mut record = JobRecord::new_scraping(job_id, url);
        record.status = phase.status();
        match phase {
            JobPhase::Scraping => {}
            JobPhase::Processing { job_data } => {
                record.job_data = Some(serde_json::to_value(job_data)?);
            }
            JobPhase::Completed { job_data, result } => {
                record.job_data = Some(serde_json::to_value(job_data)?);
                record.result_data = Some(serde_json::to_value(result)?);
            }
            JobPhase::Failed { job_data, error } => {
                record.job_data = job_data.map(serde_json::to_value).transpose()?;
                record.error = Some(error);
            }
        }
        Ok(record)
    }

    /// Writes the changeset's columns onto this record. Columns left as `None` are untouched.
    pub fn apply_changes(&mut self, changes: JobChangeset) {
        self.status = changes.status;
        if let Some(job_data) = changes.job_data {
            self.job_data = Some(job_data);
        }
        if let Some(result_data) = changes.result_data {
            self.result_data = Some(result_data);
        }
        if let Some(error) = changes.error {
            self.error = Some(error);
        }
        self.updated_at = changes.updated_at;
    }
}

//
// Transitions
//

/// The only ways a stored job may change after creation. Each variant writes the fields owned by
/// the phase that produces it.
#[derive(Debug, Clone, PartialEq)]
pub enum JobTransition {
    /// Scrape succeeded.
    Processing { job_data: JobPosting },
    /// Generation succeeded.
    Completed { result: GeneratedContent },
    /// Any collaborator failed.
    Failed { error: String },
}

impl JobTransition {
    pub fn target(&self) -> JobStatus {
        match self {
            JobTransition::Processing { .. } => JobStatus::Processing,
            JobTransition::Completed { .. } => JobStatus::Completed,
            JobTransition::Failed { .. } => JobStatus::Failed,
        }
    }

    /// Statuses this transition may be applied to.
    pub fn allowed_from(&self) -> &'static [JobStatus] {
        match self {
            JobTransition::Processing { .. } => &[JobStatus::Scraping],
            JobTransition::Completed { .. } => &[JobStatus::Processing],
            JobTransition::Failed { .. } => &[JobStatus::Scraping, JobStatus::Processing],
        }
    }
}

/// Column updates for one transition.
#[derive(Debug, Clone, PartialEq, AsChangeset)]
#[diesel(table_name = crate::schema::job)]
pub struct JobChangeset {
    pub status: JobStatus,
    pub job_data: Option<Value>,
    pub result_data: Option<Value>,
    pub error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl JobChangeset {
    pub fn from_transition(transition: &JobTransition) -> Result<Self, serde_json::Error> {
        let mut changes = JobChangeset {
            status: transition.target(),
            job_data: None,
            result_data: None,
            error: None,
            updated_at: Utc::now(),
        };
        match transition {
            JobTransition::Processing { job_data } => changes.job_data = Some(serde_json::to_value(job_data)?),
            JobTransition::Completed { result } => changes.result_data = Some(serde_json::to_value(result)?),
            JobTransition::Failed { error } => changes.error = Some(error.clone()),
        }
        Ok(changes)
    }
}

//
// generation_request table model (database representation)
//

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable)]
#[diesel(table_name = crate::schema::generation_request)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct GenerationRequestRecord {
    pub job_id: Uuid,
    pub user_profile: Option<Value>,
    pub created_at: DateTime<Utc>,
}

impl GenerationRequestRecord {
    pub fn from_request(request: &GenerationRequest) -> Result<Self, serde_json::Error> {
        Ok(GenerationRequestRecord {
            job_id: request.job_id,
            user_profile: request.user_profile.as_ref().map(serde_json::to_value).transpose()?,
            created_at: Utc::now(),
        })
    }

    pub fn to_request(&self) -> Result<GenerationRequest, serde_json::Error> {
        Ok(GenerationRequest {
            job_id: self.job_id,
            user_profile: self.user_profile.clone().map(serde_json::from_value).transpose()?,
        })
    }
}

//
// Read model
//

/// What a poller sees: `result` only once Completed, `error` only once Failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobView {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<GeneratedContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobView {
    /// Reads only the columns a poller sees, so a FAILED job with unreadable `job_data` still
    /// reports its error.
    pub fn from_record(record: &JobRecord) -> Result<Self, CorruptRecord> {
        let inconsistent = || CorruptRecord::InconsistentFields {
            job_id: record.job_id,
            status: record.status,
        };
        let (result, error) = match record.status {
            JobStatus::Completed => {
                let raw = record.result_data.clone().ok_or_else(inconsistent)?;
                let result = serde_json::from_value::<GeneratedContent>(raw).map_err(|source| CorruptRecord::Json {
                    job_id: record.job_id,
                    source,
                })?;
                (Some(result), None)
            }
            JobStatus::Failed => (None, Some(record.error.clone().ok_or_else(inconsistent)?)),
            JobStatus::Scraping | JobStatus::Processing => (None, None),
        };
        Ok(JobView {
            job_id: record.job_id,
            status: record.status,
            url: record.url.clone(),
            result,
            error,
        })
    }
}
