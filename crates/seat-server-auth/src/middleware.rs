// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Request header helpers for authentication.
//!
//! Token values are never logged; wrap them in `SecretString` if they need
//! to be stored.

use http::header::AUTHORIZATION;
use http::HeaderMap;
use tracing::instrument;

/// Extract a bearer token from the `Authorization` header.
///
/// Returns `None` when the header is absent, not valid ASCII, uses another
/// scheme, or carries an empty token.
#[instrument(level = "trace", skip_all)]
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
	let auth_header = headers.get(AUTHORIZATION)?;
	let auth_str = auth_header.to_str().ok()?;
	auth_str
		.strip_prefix("Bearer ")
		.map(str::trim)
		.filter(|token| !token.is_empty())
		.map(|token| token.to_string())
}
