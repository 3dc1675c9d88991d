use std::sync::Arc;

use core_cvgen::{
    ChatGpt, LlmTextGenerator, Processor, TimeUnit, check_non_empty_env_vars, get_db_pool, get_max_concurrency,
    get_poll_interval, setup_logging,
};
use data_model_cvgen::PgJobStore;
use tokio::sync::Semaphore;

use worker_cvgen::{Error, handle_request, next_request_in_queue};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file., if it exists
    dotenvy::dotenv().ok();

    setup_logging("worker_cvgen=debug,core_cvgen=debug");
    check_non_empty_env_vars(&["DATABASE_URL", "OPENAI_API_KEY"]);

    let pool = get_db_pool().await;

    let generator = LlmTextGenerator::new(ChatGpt::from_env());
    tracing::info!("Generating with model {}", generator.provider().model());
    let processor = Processor::new(Arc::new(PgJobStore::new(pool.clone())), Arc::new(generator));

    let poll_interval = get_poll_interval(TimeUnit::Milliseconds, "WORKER_POLL_INTERVAL_MS", 600);

    let max_concurrency = get_max_concurrency(None);
    tracing::info!("Handling at most {} generations at once", max_concurrency);
    let semaphore = Arc::new(Semaphore::new(max_concurrency));

    // Worker polling loop
    loop {
        match next_request_in_queue(&pool, semaphore.clone()).await {
            Ok((request, permit)) => {
                tokio::spawn({
                    let processor = processor.clone();
                    async move {
                        if let Err(error) = handle_request(&processor, &request).await {
                            tracing::error!("[job: {}] [SKIP] Failed to handle request: {}", request.job_id, error);
                        }
                        // Free the concurrency slot only once this job is done.
                        drop(permit);
                    }
                });
                // More requests may be waiting: poll again without sleeping.
                continue;
            }
            Err(Error::RecordNotFound) => {}
            Err(error) => {
                tracing::error!("[SKIP] Error getting next generation request from DB queue: {}", error);
            }
        }
        tracing::debug!("Waiting to poll for next generation request");
        tokio::time::sleep(poll_interval).await;
    }
}
