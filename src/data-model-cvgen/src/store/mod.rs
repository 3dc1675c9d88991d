//! Durable record of each job's status and progress.
//!
//! Every write touches exactly one record. Updates go through [`JobTransition`] so that the
//! store, not the caller, decides whether a status change is legal: a transition is applied
//! atomically and only when the record is currently in one of `transition.allowed_from()`.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{JobRecord, JobStatus, JobTransition};

mod memory;
mod pg;

pub use memory::MemoryJobStore;
pub use pg::PgJobStore;

#[async_trait]
pub trait JobStore: Send + Sync {
    /// Inserts a new record. Fails with `AlreadyExists` if the job id is taken.
    async fn create(&self, record: &JobRecord) -> Result<(), StoreError>;

    /// Applies `transition` to the job and returns the updated record.
    async fn update(&self, job_id: Uuid, transition: &JobTransition) -> Result<JobRecord, StoreError>;

    async fn get(&self, job_id: Uuid) -> Result<Option<JobRecord>, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Job {0} not found")]
    JobNotFound(Uuid),
    #[error("Job {0} already exists")]
    AlreadyExists(Uuid),
    #[error("Job {job_id} cannot move from {from} to {to}")]
    InvalidTransition { job_id: Uuid, from: JobStatus, to: JobStatus },
    #[error("Failed to serialize job fields: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Database error: {0}")]
    DbError(#[from] diesel::result::Error),
    #[error("Database pool error: {0}")]
    DbPoolError(String),
}

impl<E: std::fmt::Debug> From<deadpool::managed::PoolError<E>> for StoreError {
    fn from(error: deadpool::managed::PoolError<E>) -> Self {
        Self::DbPoolError(format!("{:?}", error))
    }
}
