use axum::{
    extract::{Json, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use core_cvgen::job_status;

use crate::models::{StatusError, StatusQuery, SubmitError, SubmitPayload, SubmitResponse};
use crate::routes::AppState;

/// POST /api/scrapeAndGenerate - Scrape a job posting and start generating application material
///
/// Responds once the posting is stored and generation is dispatched. The caller polls
/// `/api/status` with the returned `jobId` for the result.
pub async fn post_scrape_and_generate(
    State(state): State<AppState>,
    payload: Result<Json<SubmitPayload>, JsonRejection>,
) -> Result<impl IntoResponse, SubmitError> {
    let Json(payload) = payload.map_err(|e| SubmitError::InvalidRequest(e.body_text()))?;
    tracing::debug!("Submit request for {}", payload.url);

    let job_id = state.submitter.submit(&payload.url, payload.user_profile).await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            job_id,
            message: "Job posting scraped, generation started".to_string(),
        }),
    ))
}

/// GET /api/status?jobId=... - Get the status of a job, with its result or error once finished
pub async fn get_status(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<impl IntoResponse, StatusError> {
    let raw_id = query
        .job_id
        .ok_or_else(|| StatusError::InvalidId("jobId query parameter is required".to_string()))?;
    let job_id = Uuid::parse_str(raw_id.trim()).map_err(|e| StatusError::InvalidId(format!("{}: {}", raw_id, e)))?;

    let view = job_status(state.store.as_ref(), job_id).await?;
    Ok((StatusCode::OK, Json(view)))
}
