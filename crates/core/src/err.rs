//! The single classified error type shared by every engine in this crate.
//!
//! Every engine propagates this type via `?`; the `server` crate's only
//! responsibility for errors is translating the variant into a transport
//! status code (see the error-mapping table in the specification).
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
	#[error("validation error: {0}")]
	Validation(String),

	#[error("not found: {0}")]
	NotFound(String),

	#[error("conflict: {0}")]
	Conflict(String),

	#[error("integrity violation: {0}")]
	Integrity(String),

	#[error("forbidden: {0}")]
	Forbidden(String),

	#[error("unauthorised: {0}")]
	Unauthorised(String),

	#[error("internal error: {0}")]
	Internal(String),
}

impl Error {
	pub fn validation(msg: impl Into<String>) -> Self {
		Self::Validation(msg.into())
	}

	pub fn not_found(msg: impl Into<String>) -> Self {
		Self::NotFound(msg.into())
	}

	pub fn conflict(msg: impl Into<String>) -> Self {
		Self::Conflict(msg.into())
	}

	pub fn integrity(msg: impl Into<String>) -> Self {
		Self::Integrity(msg.into())
	}

	pub fn forbidden(msg: impl Into<String>) -> Self {
		Self::Forbidden(msg.into())
	}

	pub fn unauthorised(msg: impl Into<String>) -> Self {
		Self::Unauthorised(msg.into())
	}

	pub fn internal(msg: impl Into<String>) -> Self {
		Self::Internal(msg.into())
	}
}

impl From<sqlx::Error> for Error {
	fn from(e: sqlx::Error) -> Self {
		if let sqlx::Error::Database(db_err) = &e {
			// 23505 = unique_violation in Postgres
			if db_err.code().as_deref() == Some("23505") {
				return Error::Conflict(db_err.message().to_string());
			}
		}
		if matches!(e, sqlx::Error::RowNotFound) {
			return Error::NotFound("row not found".to_string());
		}
		Error::Internal(e.to_string())
	}
}

impl From<std::io::Error> for Error {
	fn from(e: std::io::Error) -> Self {
		Error::Internal(e.to_string())
	}
}

pub type Result<T> = std::result::Result<T, Error>;
