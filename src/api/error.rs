//! Mapping of ledger failures onto HTTP responses.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

use crate::domain::LedgerError;

/// JSON error body: `{"error": "<message>"}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Anything a handler can fail with.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Request could not be parsed (body, path or headers).
    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Ledger(err) => match err {
                LedgerError::Validation(_) | LedgerError::SameAccount(_) => {
                    StatusCode::BAD_REQUEST
                }
                LedgerError::AccountNotFound(_) | LedgerError::AccountNumberNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                LedgerError::InsufficientFunds { .. } => StatusCode::CONFLICT,
                LedgerError::StoreUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Client-facing message. Store internals stay in the logs.
    pub fn message(&self) -> String {
        match self {
            ApiError::Ledger(LedgerError::StoreUnavailable(_)) => "store unavailable".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        } else {
            warn!(status = status.as_u16(), error = %self, "Request rejected");
        }

        (status, Json(ErrorBody { error: self.message() })).into_response()
    }
}
