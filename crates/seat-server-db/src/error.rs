// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

/// Failures from the user store.
///
/// `NotFound` and `Conflict` are expected outcomes the identity layer turns
/// into sync results; the rest are infrastructure failures.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
	#[error("Database error: {0}")]
	Sqlx(#[from] sqlx::Error),

	/// No active row matched.
	#[error("Not found: {0}")]
	NotFound(String),

	/// An active row already holds the external id or email.
	#[error("Conflict: {0}")]
	Conflict(String),

	/// A bad URL, or a stored value that does not parse.
	#[error("Internal: {0}")]
	Internal(String),
}

pub type Result<T> = std::result::Result<T, DbError>;
