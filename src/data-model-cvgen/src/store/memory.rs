use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{JobChangeset, JobRecord, JobTransition};
use crate::store::{JobStore, StoreError};

/// In-process job store with the same transition rules as the Postgres store.
/// Used for one-off CLI runs and tests.
#[derive(Default)]
pub struct MemoryJobStore {
    records: RwLock<HashMap<Uuid, JobRecord>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Ids of every stored job, in no particular order.
    pub async fn ids(&self) -> Vec<Uuid> {
        self.records.read().await.keys().copied().collect()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn create(&self, record: &JobRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.job_id) {
            return Err(StoreError::AlreadyExists(record.job_id));
        }
        records.insert(record.job_id, record.clone());
        Ok(())
    }

    async fn update(&self, job_id: Uuid, transition: &JobTransition) -> Result<JobRecord, StoreError> {
        let changes = JobChangeset::from_transition(transition)?;

        let mut records = self.records.write().await;
        let record = records.get_mut(&job_id).ok_or(StoreError::JobNotFound(job_id))?;

        if !transition.allowed_from().contains(&record.status) {
            return Err(StoreError::InvalidTransition {
                job_id,
                from: record.status,
                to: transition.target(),
            });
        }

        record.apply_changes(changes);
        Ok(record.clone())
    }

    async fn get(&self, job_id: Uuid) -> Result<Option<JobRecord>, StoreError> {
        Ok(self.records.read().await.get(&job_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{JobPhase, JobStatus};
    use crate::test_helpers::{sample_generated_content, sample_job_posting};

    fn new_record() -> JobRecord {
        JobRecord::new_scraping(Uuid::new_v4(), "https://example.com/job/123".to_string())
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let store = MemoryJobStore::new();
        let record = new_record();

        store.create(&record).await.unwrap();

        assert_eq!(store.get(record.job_id).await.unwrap(), Some(record));
        assert_eq!(store.get(Uuid::new_v4()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_id() {
        let store = MemoryJobStore::new();
        let record = new_record();

        store.create(&record).await.unwrap();
        let result = store.create(&record).await;

        assert!(matches!(result, Err(StoreError::AlreadyExists(id)) if id == record.job_id));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_update_unknown_job() {
        let store = MemoryJobStore::new();
        let job_id = Uuid::new_v4();

        let result = store
            .update(
                job_id,
                &JobTransition::Failed {
                    error: "nope".to_string(),
                },
            )
            .await;

        assert!(matches!(result, Err(StoreError::JobNotFound(id)) if id == job_id));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_full_forward_path() {
        let store = MemoryJobStore::new();
        let record = new_record();
        store.create(&record).await.unwrap();

        let processing = store
            .update(
                record.job_id,
                &JobTransition::Processing {
                    job_data: sample_job_posting(),
                },
            )
            .await
            .unwrap();
        assert_eq!(processing.status, JobStatus::Processing);

        let completed = store
            .update(
                record.job_id,
                &JobTransition::Completed {
                    result: sample_generated_content(),
                },
            )
            .await
            .unwrap();

        assert_eq!(
            completed.to_phase().unwrap(),
            JobPhase::Completed {
                job_data: sample_job_posting(),
                result: sample_generated_content(),
            }
        );
        assert_eq!(completed.created_at, record.created_at);
    }

    #[tokio::test]
    async fn test_terminal_jobs_reject_further_transitions() {
        let store = MemoryJobStore::new();
        let record = new_record();
        store.create(&record).await.unwrap();
        store
            .update(
                record.job_id,
                &JobTransition::Failed {
                    error: "scrape failed".to_string(),
                },
            )
            .await
            .unwrap();

        let result = store
            .update(
                record.job_id,
                &JobTransition::Processing {
                    job_data: sample_job_posting(),
                },
            )
            .await;

        assert!(matches!(
            result,
            Err(StoreError::InvalidTransition {
                from: JobStatus::Failed,
                to: JobStatus::Processing,
                ..
            })
        ));
        let stored = store.get(record.job_id).await.unwrap().unwrap();
        assert_eq!(stored.error.as_deref(), Some("scrape failed"));
        assert_eq!(stored.job_data, None);
    }

    #[tokio::test]
    async fn test_completed_requires_processing() {
        let store = MemoryJobStore::new();
        let record = new_record();
        store.create(&record).await.unwrap();

        let result = store
            .update(
                record.job_id,
                &JobTransition::Completed {
                    result: sample_generated_content(),
                },
            )
            .await;

        assert!(matches!(
            result,
            Err(StoreError::InvalidTransition {
                from: JobStatus::Scraping,
                to: JobStatus::Completed,
                ..
            })
        ));
    }
}
