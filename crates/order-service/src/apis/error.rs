//! Mapping of failures to HTTP responses.

use axum::{
	extract::rejection::JsonRejection,
	http::StatusCode,
	response::{IntoResponse, Json, Response},
};
use order_types::{DomainError, ErrorKind, ErrorResponse};
use thiserror::Error;
use validator::ValidationErrors;

/// Error returned by every handler.
#[derive(Debug, Error)]
pub enum ApiError {
	#[error(transparent)]
	Domain(#[from] DomainError),
	/// Unexpected failure. The detail is logged, never returned.
	#[error("Internal Server Error")]
	Internal(String),
}

/// Status code for each domain error kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
	match kind {
		ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
		ErrorKind::NotFound => StatusCode::NOT_FOUND,
		ErrorKind::Conflict => StatusCode::CONFLICT,
		ErrorKind::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
	}
}

impl From<JsonRejection> for ApiError {
	fn from(rejection: JsonRejection) -> Self {
		ApiError::Domain(DomainError::InvalidInput(rejection.body_text()))
	}
}

impl From<ValidationErrors> for ApiError {
	fn from(errors: ValidationErrors) -> Self {
		ApiError::Domain(DomainError::InvalidInput(errors.to_string()))
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let (status, message) = match &self {
			ApiError::Domain(e) => (status_for(e.kind()), e.message().to_string()),
			ApiError::Internal(detail) => {
				tracing::error!(error = %detail, "Internal error");
				(StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
			},
		};
		(status, Json(ErrorResponse::new(message))).into_response()
	}
}
