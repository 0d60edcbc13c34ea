use aivault_strategy::ServiceError;
use axum::extract::FromRequest;
use axum::extract::rejection::JsonRejection;
use axum::{Json, http::StatusCode, response::IntoResponse};
use thiserror::Error;

use crate::dto::ApiResponse;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("{message}")]
    Upstream {
        message: String,
        details: Option<String>,
    },
    #[error("Internal server error")]
    InternalServerError,
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(_) => Self::NotFound(err.to_string()),
            ServiceError::InvalidRequest(msg) => Self::BadRequest(msg),
            ServiceError::NotPending { .. } => Self::BadRequest(err.to_string()),
            ServiceError::Database(err) => Self::Upstream {
                message: "Database error".to_string(),
                details: Some(err.to_string()),
            },
            ServiceError::Chain(err) => Self::Upstream {
                message: "Blockchain request failed".to_string(),
                details: Some(err.to_string()),
            },
            ServiceError::ExecutionFailed {
                execution_id,
                tx_hash,
                message,
            } => Self::Upstream {
                message: format!("Execution {execution_id} failed"),
                details: Some(match tx_hash {
                    Some(hash) => format!("{message} (tx {hash})"),
                    None => message,
                }),
            },
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, msg, details) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            Self::Upstream { message, details } => {
                tracing::error!(%message, details = ?details, "Upstream failure");
                (StatusCode::INTERNAL_SERVER_ERROR, message, details)
            }
            Self::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
                None,
            ),
        };
        let response: ApiResponse<()> = ApiResponse::error(msg).with_details(details);
        (status, Json(response)).into_response()
    }
}

/// `Json` whose rejections use the error envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);
