use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::DbPool;
use crate::models::{JobChangeset, JobRecord, JobStatus, JobTransition};
use crate::schema::job;
use crate::store::{JobStore, StoreError};

/// Postgres-backed job store.
#[derive(Clone)]
pub struct PgJobStore {
    pool: DbPool,
}

impl PgJobStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn create(&self, record: &JobRecord) -> Result<(), StoreError> {
        let mut conn = self.pool.get().await?;

        diesel::insert_into(job::table)
            .values(record)
            .execute(&mut conn)
            .await
            .map_err(|e| match e {
                DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    StoreError::AlreadyExists(record.job_id)
                }
                _ => e.into(),
            })?;

        tracing::debug!("[job: {}] Created record ({})", record.job_id, record.status);
        Ok(())
    }

    async fn update(&self, job_id: Uuid, transition: &JobTransition) -> Result<JobRecord, StoreError> {
        let changes = JobChangeset::from_transition(transition)?;
        let mut conn = self.pool.get().await?;

        // The status filter makes the check-and-write a single statement: concurrent writers
        // racing on the same job cannot both succeed.
        let updated: Option<JobRecord> = diesel::update(
            job::table
                .find(job_id)
                .filter(job::status.eq_any(transition.allowed_from().to_vec())),
        )
        .set(&changes)
        .returning(JobRecord::as_returning())
        .get_result(&mut conn)
        .await
        .optional()?;

        match updated {
            Some(record) => {
                tracing::debug!("[job: {}] Moved to {}", job_id, record.status);
                Ok(record)
            }
            None => {
                let current: Option<JobStatus> = job::table
                    .find(job_id)
                    .select(job::status)
                    .first(&mut conn)
                    .await
                    .optional()?;

                match current {
                    None => Err(StoreError::JobNotFound(job_id)),
                    Some(from) => Err(StoreError::InvalidTransition {
                        job_id,
                        from,
                        to: transition.target(),
                    }),
                }
            }
        }
    }

    async fn get(&self, job_id: Uuid) -> Result<Option<JobRecord>, StoreError> {
        let mut conn = self.pool.get().await?;

        let record = job::table
            .find(job_id)
            .select(JobRecord::as_select())
            .first(&mut conn)
            .await
            .optional()?;

        Ok(record)
    }
}
