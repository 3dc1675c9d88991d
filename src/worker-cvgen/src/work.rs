use std::sync::Arc;

use core_cvgen::{ProcessOutcome, Processor};
use data_model_cvgen::{
    db::DbPool,
    models::{GenerationRequest, GenerationRequestRecord},
    schema,
};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::errors::Error;

/// Claims the oldest pending generation request.
/// The semaphore controls the maximum number of concurrent generations that the worker can handle.
///
/// The claimed row is deleted in the same transaction, so each request is handed to one worker.
/// Returns `Error::RecordNotFound` when the queue is empty.
pub async fn next_request_in_queue(
    pool: &DbPool,
    semaphore: Arc<Semaphore>,
) -> Result<(GenerationRequest, OwnedSemaphorePermit), Error> {
    // Blocks while max concurrency is reached. Dropped again on error, freeing the slot.
    tracing::debug!("Acquiring semaphore before checking for a new generation request.");
    let permit = semaphore.acquire_owned().await?;

    let mut conn = pool.get().await?;

    let record: GenerationRequestRecord = conn
        .transaction::<_, Error, _>(|conn| {
            async move {
                // FOR UPDATE SKIP LOCKED lets several workers poll the same queue.
                // Oldest first, ties broken on job id.
                let record: GenerationRequestRecord = schema::generation_request::table
                    .select(GenerationRequestRecord::as_select())
                    .order((
                        schema::generation_request::created_at.asc(),
                        schema::generation_request::job_id.asc(),
                    ))
                    .for_update()
                    .skip_locked()
                    .first(conn)
                    .await?;

                diesel::delete(schema::generation_request::table.find(record.job_id))
                    .execute(conn)
                    .await?;

                Ok(record)
            }
            .scope_boxed()
        })
        .await?;

    let request = record.to_request().unwrap_or_else(|e| {
        tracing::warn!("[job: {}] Unreadable user profile, generating without it: {}", record.job_id, e);
        GenerationRequest {
            job_id: record.job_id,
            user_profile: None,
        }
    });

    Ok((request, permit))
}

/// Runs the generation phase for one claimed request and logs how it ended.
pub async fn handle_request(processor: &Processor, request: &GenerationRequest) -> Result<ProcessOutcome, Error> {
    tracing::info!("[job: {}] Received generation request", request.job_id);

    let outcome = processor.process(request).await?;
    match &outcome {
        ProcessOutcome::Completed(content) => tracing::info!(
            "[job: {}] Completed (compatibility {}%)",
            request.job_id,
            content.compatibility_percentage
        ),
        ProcessOutcome::Failed(error) => tracing::error!("[job: {}] Failed: {}", request.job_id, error),
        ProcessOutcome::AlreadyFinished(status) => {
            tracing::info!("[job: {}] [SKIP] Duplicate request, job is {}", request.job_id, status)
        }
    }
    Ok(outcome)
}
