//! HTTP error responses

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::warn;

use crate::gateway::GatewayError;

pub const MODEL_LOADING: &str = "Model is loading, please try again in a moment";

/// Everything a handler can answer with besides success
#[derive(Debug)]
pub enum ApiError {
    /// 400 `{error}` or `{error, details}`
    BadRequest { error: String, details: Option<String> },

    /// 405 `{error: "Method not allowed"}`
    MethodNotAllowed,

    /// 503 while the upstream model cold-starts
    ModelLoading { estimated_time: Option<f64> },

    /// 500 `{error, details}` for any other upstream failure
    Upstream { summary: &'static str, details: String },
}

impl ApiError {
    pub fn required(what: &str) -> Self {
        ApiError::BadRequest {
            error: format!("{} is required", what),
            details: None,
        }
    }

    pub fn invalid(error: &str, details: impl ToString) -> Self {
        ApiError::BadRequest {
            error: error.to_string(),
            details: Some(details.to_string()),
        }
    }

    /// Map a speech gateway failure, keeping cold starts as 503
    pub fn from_speech(summary: &'static str, err: GatewayError) -> Self {
        match err {
            GatewayError::ServiceUnavailable { estimated_time } => ApiError::ModelLoading { estimated_time },
            other => ApiError::Upstream {
                summary,
                details: other.to_string(),
            },
        }
    }

    /// Map a coach gateway failure; every kind is a 500
    pub fn from_coach(summary: &'static str, err: GatewayError) -> Self {
        ApiError::Upstream {
            summary,
            details: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest { error, details } => {
                let body = match details {
                    Some(details) => json!({ "error": error, "details": details }),
                    None => json!({ "error": error }),
                };
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            ApiError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                Json(json!({ "error": "Method not allowed" })),
            )
                .into_response(),
            ApiError::ModelLoading { estimated_time } => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "error": MODEL_LOADING, "estimated_time": estimated_time })),
            )
                .into_response(),
            ApiError::Upstream { summary, details } => {
                warn!(%summary, %details, "upstream failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": summary, "details": details })),
                )
                    .into_response()
            }
        }
    }
}
