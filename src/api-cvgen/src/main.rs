use std::sync::Arc;

use anyhow::Context;
use core_cvgen::{FirecrawlScraper, Submitter, check_non_empty_env_vars, get_api_base_url, get_db_pool, setup_logging};
use data_model_cvgen::{PgDispatcher, PgJobStore};

use api_cvgen::{AppState, router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    setup_logging("api_cvgen=debug,core_cvgen=debug,tower_http=debug");
    check_non_empty_env_vars(&["DATABASE_URL", "FIRECRAWL_API_KEY"]);

    let pool = get_db_pool().await;
    let store = Arc::new(PgJobStore::new(pool.clone()));
    let scraper = FirecrawlScraper::from_env().context("Cannot configure scraper")?;
    let dispatcher = Arc::new(PgDispatcher::new(pool));

    let state = AppState {
        store: store.clone(),
        submitter: Submitter::new(store, Arc::new(scraper), dispatcher),
    };
    let app = router().with_state(state);

    let addr = get_api_base_url().context("Invalid HOST or PORT")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to address: {}", addr))?;

    tracing::info!("Listening on {}", addr);
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
