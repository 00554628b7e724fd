use std::time::Duration;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Deserialize;
use thiserror::Error;

use crate::apis::schemas::ErrorResponse;

// Status reported when the caller went away before the job finished.
const CLIENT_CLOSED_REQUEST: u16 = 499;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("server configuration error: {0} is not configured")]
    MissingCredential(&'static str),

    #[error("{0}")]
    InvalidInput(String),

    // Non-success HTTP status from a provider; the status is mirrored to the caller
    #[error("{service} request failed ({status}): {message}")]
    Upstream {
        service: &'static str,
        status: u16,
        message: String,
    },

    #[error("image host rejected the upload: {0}")]
    HostRejected(String),

    #[error("upscaling job failed: {0}")]
    JobFailed(String),

    #[error("provider returned an unexpected result. Output: {0}")]
    UnexpectedOutput(String),

    #[error("job did not finish after {attempts} status checks ({elapsed:?})")]
    Timeout { attempts: u32, elapsed: Duration },

    #[error("request was cancelled before the job finished")]
    Cancelled,

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("could not decode {service} response: {message}")]
    Decode {
        service: &'static str,
        message: String,
    },

    #[error("internal error: {0}")]
    Internal(String),
}

const INVALID_TOKEN: &str = "the inference API token is invalid; check REPLICATE_API_TOKEN or generate a new one";

#[derive(Deserialize, Default)]
struct UpstreamErrorBody {
    detail: Option<String>,
    message: Option<String>,
}

fn upstream_detail(body: &str) -> String {
    let parsed: UpstreamErrorBody = serde_json::from_str(body).unwrap_or_default();
    parsed
        .detail
        .or(parsed.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| "unknown error".to_string())
}

impl RelayError {
    // Turn a non-success response to job creation into a diagnostic the user can act on.
    pub fn from_prediction_failure(status: u16, body: &str) -> RelayError {
        let detail = upstream_detail(body);
        let message = if status == 401 {
            INVALID_TOKEN.to_string()
        } else if status == 404 || detail.contains("version does not exist") {
            format!("the configured model version no longer exists; update replicate.model_version ({})", detail)
        } else {
            detail
        };
        RelayError::Upstream {
            service: "prediction",
            status,
            message,
        }
    }

    // Same for status checks and cancel requests on an existing job.
    pub fn from_poll_failure(status: u16, body: &str) -> RelayError {
        let detail = upstream_detail(body);
        let message = match status {
            401 => INVALID_TOKEN.to_string(),
            404 => format!("prediction not found; it may have expired upstream ({})", detail),
            _ => detail,
        };
        RelayError::Upstream {
            service: "prediction",
            status,
            message,
        }
    }

    // Raw upstream text carried alongside the message, when there is one.
    pub fn detail(&self) -> Option<String> {
        match self {
            RelayError::JobFailed(text) => Some(text.clone()),
            RelayError::HostRejected(text) => Some(text.clone()),
            RelayError::UnexpectedOutput(raw) => Some(raw.clone()),
            _ => None,
        }
    }
}

impl ResponseError for RelayError {
    fn status_code(&self) -> StatusCode {
        match self {
            RelayError::MissingCredential(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RelayError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            RelayError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            RelayError::HostRejected(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RelayError::JobFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RelayError::UnexpectedOutput(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RelayError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            RelayError::Cancelled => {
                StatusCode::from_u16(CLIENT_CLOSED_REQUEST).unwrap_or(StatusCode::BAD_REQUEST)
            }
            RelayError::Network(_) => StatusCode::BAD_GATEWAY,
            RelayError::Decode { .. } => StatusCode::BAD_GATEWAY,
            RelayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            message: self.to_string(),
            error: self.detail(),
        })
    }
}
