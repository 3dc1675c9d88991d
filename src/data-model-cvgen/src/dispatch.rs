//! Hand-off from the scrape phase to the generation phase.
//!
//! Scheduling is fire-and-forget: a successful `schedule` only means the request was recorded.
//! Consumers must tolerate a request being delivered more than once.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use diesel_async::RunQueryDsl;

use crate::db::DbPool;
use crate::models::{GenerationRequest, GenerationRequestRecord};
use crate::schema::generation_request;

#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn schedule(&self, request: &GenerationRequest) -> Result<(), DispatchError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Failed to serialize generation request: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Database error: {0}")]
    DbError(#[from] diesel::result::Error),
    #[error("Database pool error: {0}")]
    DbPoolError(String),
    #[error("Dispatcher unavailable: {0}")]
    Unavailable(String),
}

impl<E: std::fmt::Debug> From<deadpool::managed::PoolError<E>> for DispatchError {
    fn from(error: deadpool::managed::PoolError<E>) -> Self {
        Self::DbPoolError(format!("{:?}", error))
    }
}

/// Writes a durable `generation_request` row that the worker claims.
#[derive(Clone)]
pub struct PgDispatcher {
    pool: DbPool,
}

impl PgDispatcher {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Dispatcher for PgDispatcher {
    async fn schedule(&self, request: &GenerationRequest) -> Result<(), DispatchError> {
        let record = GenerationRequestRecord::from_request(request)?;
        let mut conn = self.pool.get().await?;

        // A duplicate request for the same job is harmless: the worker treats it as a redelivery.
        diesel::insert_into(generation_request::table)
            .values(&record)
            .on_conflict_do_nothing()
            .execute(&mut conn)
            .await?;

        tracing::debug!("[job: {}] Generation request queued", request.job_id);
        Ok(())
    }
}

/// FIFO queue held in memory. Lets a single process run both phases back to back.
#[derive(Default)]
pub struct MemoryDispatcher {
    queue: Mutex<VecDeque<GenerationRequest>>,
}

impl MemoryDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns the oldest pending request.
    pub fn pop(&self) -> Option<GenerationRequest> {
        self.queue.lock().ok()?.pop_front()
    }

    /// Copies of all pending requests, oldest first.
    pub fn pending(&self) -> Vec<GenerationRequest> {
        match self.queue.lock() {
            Ok(queue) => queue.iter().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }
}

#[async_trait]
impl Dispatcher for MemoryDispatcher {
    async fn schedule(&self, request: &GenerationRequest) -> Result<(), DispatchError> {
        self.queue
            .lock()
            .map_err(|_| DispatchError::Unavailable("queue lock poisoned".to_string()))?
            .push_back(request.clone());
        Ok(())
    }
}
