// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Bearer authentication for user-facing routes.
//!
//! The identity provider owns sessions; this server only verifies the
//! session JWT the frontend forwards and trusts its `sub` as the external
//! user id.
//!
//! ```ignore
//! async fn handler(RequireAuth(claims): RequireAuth) -> impl IntoResponse {
//!     format!("Hello, {}!", claims.sub)
//! }
//! ```

use axum::{
	extract::FromRequestParts,
	http::request::Parts,
	response::{IntoResponse, Response},
};
use seat_server_auth::{extract_bearer_token, SessionClaims, SessionVerifier};
use tracing::instrument;

use crate::{
	api::AppState,
	api_response::{internal_error, unauthorized},
	error::ErrorResponse,
};

/// Extractor that rejects the request unless it carries a valid session
/// token.
///
/// - 401 when the `Authorization: Bearer` header is missing or the token
///   fails verification
/// - 500 when no session verifier is configured or keys cannot be fetched
pub struct RequireAuth(pub SessionClaims);

impl FromRequestParts<AppState> for RequireAuth {
	type Rejection = Response;

	#[instrument(name = "RequireAuth::from_request_parts", skip_all)]
	async fn from_request_parts(
		parts: &mut Parts,
		state: &AppState,
	) -> Result<Self, Self::Rejection> {
		let Some(verifier) = state.session_verifier.as_ref() else {
			tracing::error!("session verification requested but no verifier is configured");
			return Err(
				internal_error::<ErrorResponse>("Authentication is not configured").into_response(),
			);
		};

		let Some(token) = extract_bearer_token(&parts.headers) else {
			tracing::debug!("Authentication required: no bearer token");
			return Err(unauthorized::<ErrorResponse>("Authentication required").into_response());
		};

		match verifier.verify(&token).await {
			Ok(claims) => {
				tracing::debug!(external_user_id = %claims.sub, "Authentication required: success");
				Ok(RequireAuth(claims))
			}
			Err(e) if e.is_internal() => {
				tracing::error!(error = %e, "session verification unavailable");
				Err(internal_error::<ErrorResponse>("Authentication is unavailable").into_response())
			}
			Err(e) => {
				tracing::debug!(error = %e, "Authentication required: invalid token");
				Err(unauthorized::<ErrorResponse>(e.to_string()).into_response())
			}
		}
	}
}
