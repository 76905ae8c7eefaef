//! Translates `variant_core::err::Error` to a transport status, per the
//! mapping table in the specification. This is the facade's only
//! responsibility regarding errors — every handler propagates with `?`.
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use variant_core::err::Error as CoreError;

pub struct ApiError(pub CoreError);

impl From<CoreError> for ApiError {
	fn from(e: CoreError) -> Self {
		ApiError(e)
	}
}

#[derive(Serialize)]
struct ErrorBody {
	error: String,
	message: String,
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let (status, kind) = match &self.0 {
			CoreError::Validation(_) => (StatusCode::BAD_REQUEST, "validation"),
			CoreError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
			CoreError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
			CoreError::Integrity(_) => (StatusCode::BAD_REQUEST, "integrity"),
			CoreError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
			CoreError::Unauthorised(_) => (StatusCode::UNAUTHORIZED, "unauthorised"),
			CoreError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
			_ => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
		};
		if status == StatusCode::INTERNAL_SERVER_ERROR {
			tracing::error!(error = %self.0, "internal error handling request");
		}
		(status, Json(ErrorBody { error: kind.to_string(), message: self.0.to_string() })).into_response()
	}
}

pub type ApiResult<T> = Result<T, ApiError>;
