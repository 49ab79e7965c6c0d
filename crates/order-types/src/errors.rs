//! Domain error taxonomy.
//!
//! Every failure that crosses the lifecycle service boundary is one of the
//! four [`DomainError`] variants. Each carries a human-readable message that
//! is safe to return to callers. The transport layer maps [`ErrorKind`] to a
//! status code in exactly one place.

use thiserror::Error;

/// Discriminant of a [`DomainError`], used for status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	InvalidInput,
	NotFound,
	Conflict,
	StoreUnavailable,
}

/// Failure of an order use-case.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
	/// Caller-supplied data failed structural or semantic validation.
	#[error("{0}")]
	InvalidInput(String),
	/// The requested order does not exist.
	#[error("{0}")]
	NotFound(String),
	/// Reserved for transition-rule enforcement; no current use-case raises it.
	#[error("{0}")]
	Conflict(String),
	/// The persistence medium could not complete the operation.
	#[error("{0}")]
	StoreUnavailable(String),
}

impl DomainError {
	pub fn kind(&self) -> ErrorKind {
		match self {
			DomainError::InvalidInput(_) => ErrorKind::InvalidInput,
			DomainError::NotFound(_) => ErrorKind::NotFound,
			DomainError::Conflict(_) => ErrorKind::Conflict,
			DomainError::StoreUnavailable(_) => ErrorKind::StoreUnavailable,
		}
	}

	pub fn message(&self) -> &str {
		match self {
			DomainError::InvalidInput(message)
			| DomainError::NotFound(message)
			| DomainError::Conflict(message)
			| DomainError::StoreUnavailable(message) => message,
		}
	}
}
