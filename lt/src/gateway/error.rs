//! Gateway error types

use std::time::Duration;
use thiserror::Error;

use crate::llm::LlmError;

/// Failures talking to an external AI service
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The upstream model is cold-starting; `estimated_time` is in seconds
    #[error("Model is loading, please try again in a moment")]
    ServiceUnavailable { estimated_time: Option<f64> },

    #[error("Rate limited, retry after {0:?}")]
    RateLimited(Duration),

    #[error("Upstream returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid upstream response: {0}")]
    InvalidResponse(String),

    #[error("Upstream timed out after {0:?}")]
    Timeout(Duration),
}

impl GatewayError {
    /// Check if this is a cold-start (503) error
    pub fn is_cold_start(&self) -> bool {
        matches!(self, GatewayError::ServiceUnavailable { .. })
    }

    /// Upstream estimate for a cold start, in seconds
    pub fn estimated_time(&self) -> Option<f64> {
        match self {
            GatewayError::ServiceUnavailable { estimated_time } => *estimated_time,
            _ => None,
        }
    }

    /// Map a transport failure, keeping timeouts distinct
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            GatewayError::Timeout(timeout)
        } else {
            GatewayError::Network(err.to_string())
        }
    }
}

impl From<LlmError> for GatewayError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::RateLimited { retry_after } => GatewayError::RateLimited(retry_after),
            LlmError::ApiError { status: 503, .. } => GatewayError::ServiceUnavailable { estimated_time: None },
            LlmError::ApiError { status, message } => GatewayError::Upstream { status, message },
            LlmError::Network(e) => GatewayError::Network(e.to_string()),
            LlmError::InvalidResponse(msg) => GatewayError::InvalidResponse(msg),
            LlmError::Timeout(d) => GatewayError::Timeout(d),
        }
    }
}
