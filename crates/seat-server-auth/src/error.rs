// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authentication errors.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
	#[error("Token has expired")]
	TokenExpired,

	#[error("Invalid token: {0}")]
	InvalidToken(String),

	#[error("Token issued for unauthorized party: {0}")]
	UnauthorizedParty(String),

	#[error("Signing key not found: {0}")]
	KeyNotFound(String),

	#[error("Invalid verification key: {0}")]
	InvalidKey(String),

	#[error("JWKS fetch failed: {0}")]
	JwksFetch(String),
}

impl AuthError {
	/// True when the failure is on our side rather than the caller's token.
	pub fn is_internal(&self) -> bool {
		matches!(
			self,
			AuthError::InvalidKey(_) | AuthError::JwksFetch(_)
		)
	}
}
