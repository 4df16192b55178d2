// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use seat_server_db::DbError;
use thiserror::Error;

/// Errors from decoding or applying an identity event, or from a profile
/// operation.
#[derive(Debug, Error)]
pub enum SyncError {
	/// The payload is not a well-formed event or user snapshot.
	#[error("invalid payload: {0}")]
	Decode(String),

	#[error("user payload has no email address")]
	MissingEmail,

	#[error("user not found: {0}")]
	UserNotFound(String),

	#[error("validation failed: {0}")]
	Validation(String),

	#[error("conflict: {0}")]
	Conflict(String),

	#[error("store error: {0}")]
	Store(DbError),
}

impl From<DbError> for SyncError {
	fn from(err: DbError) -> Self {
		match err {
			DbError::Conflict(message) => SyncError::Conflict(message),
			DbError::NotFound(message) => SyncError::UserNotFound(message),
			other => SyncError::Store(other),
		}
	}
}

impl From<serde_json::Error> for SyncError {
	fn from(err: serde_json::Error) -> Self {
		SyncError::Decode(err.to_string())
	}
}

impl SyncError {
	/// True when the caller sent something unusable, as opposed to the
	/// server failing to apply it.
	pub fn is_client_error(&self) -> bool {
		matches!(
			self,
			SyncError::Decode(_) | SyncError::MissingEmail | SyncError::Validation(_)
		)
	}
}

pub type Result<T> = std::result::Result<T, SyncError>;
