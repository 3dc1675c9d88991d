use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use core_cvgen::Error;
use data_model_cvgen::models::UserProfile;

// API Payload Types

/// Input payload for POST /api/scrapeAndGenerate
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitPayload {
    pub url: String,
    #[serde(default, alias = "user_profile", skip_serializing_if = "Option::is_none")]
    pub user_profile: Option<UserProfile>,
}

/// Response payload for POST /api/scrapeAndGenerate
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub job_id: Uuid,
    pub message: String,
}

/// Query parameters for GET /api/status.
/// Kept as a string so that a malformed id is reported as `invalid_id` rather than rejected by the extractor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusQuery {
    #[serde(default, rename = "jobId", alias = "job_id")]
    pub job_id: Option<String>,
}

// API Error Types

/// Error for POST /api/scrapeAndGenerate endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "error", content = "detail")]
pub enum SubmitError {
    /// The request body is not a valid submit payload
    #[serde(rename = "invalid_request")]
    InvalidRequest(String),
    /// The url is not an http(s) URL
    #[serde(rename = "invalid_url")]
    InvalidUrl(String),
    /// The job was created but scraping failed
    #[serde(rename = "scrape_failed")]
    ScrapeFailed(String),
    /// The job was scraped but generation could not be scheduled
    #[serde(rename = "dispatch_failed")]
    DispatchFailed(String),
    /// Unknown error occurred
    #[serde(rename = "unknown")]
    Unknown(String),
}

/// Error for GET /api/status endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "error", content = "detail")]
pub enum StatusError {
    /// The provided jobId is missing or not a valid UUID
    #[serde(rename = "invalid_id")]
    InvalidId(String),
    /// The jobId was not found
    #[serde(rename = "unknown_id")]
    UnknownId(String),
    /// Unknown error occurred
    #[serde(rename = "unknown")]
    Unknown(String),
}

// SubmitError

impl IntoResponse for SubmitError {
    fn into_response(self) -> axum::response::Response {
        let status = match self {
            SubmitError::InvalidRequest(_) | SubmitError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            SubmitError::ScrapeFailed(_) | SubmitError::DispatchFailed(_) | SubmitError::Unknown(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(self)).into_response()
    }
}

impl From<Error> for SubmitError {
    fn from(err: Error) -> Self {
        match err {
            Error::InvalidUrl(_) | Error::UnsupportedScheme(_) => SubmitError::InvalidUrl(err.to_string()),
            Error::Scrape(_) => SubmitError::ScrapeFailed(err.to_string()),
            Error::Dispatch(_) => SubmitError::DispatchFailed(err.to_string()),
            _ => SubmitError::Unknown(err.to_string()),
        }
    }
}

// StatusError

impl IntoResponse for StatusError {
    fn into_response(self) -> axum::response::Response {
        let status = match self {
            StatusError::InvalidId(_) => StatusCode::BAD_REQUEST,
            StatusError::UnknownId(_) => StatusCode::NOT_FOUND,
            StatusError::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

impl From<Error> for StatusError {
    fn from(err: Error) -> Self {
        match err {
            Error::JobNotFound(job_id) => StatusError::UnknownId(job_id.to_string()),
            _ => StatusError::Unknown(err.to_string()),
        }
    }
}
