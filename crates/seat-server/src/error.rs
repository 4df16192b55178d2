// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Server error types and HTTP response conversions.

use axum::{
	http::StatusCode,
	response::{IntoResponse, Response},
	Json,
};
use seat_common_webhook::WebhookError;
use seat_server_db::DbError;
use seat_server_identity::SyncError;
use serde::Serialize;
use utoipa::ToSchema;

use crate::impl_api_error_response;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
	/// Database operation failed.
	#[error("Database error: {0}")]
	Db(#[from] DbError),

	#[error("Not found: {0}")]
	NotFound(String),

	#[error("Conflict: {0}")]
	Conflict(String),

	/// Invalid request payload.
	#[error("Invalid request: {0}")]
	BadRequest(String),

	/// Webhook signature, timestamp or header check failed.
	#[error("Invalid webhook signature: {0}")]
	InvalidSignature(#[from] WebhookError),

	/// Verified webhook body that is not a usable event.
	#[error("Invalid webhook payload: {0}")]
	InvalidPayload(String),

	/// Internal server error.
	#[error("Internal error: {0}")]
	Internal(String),
}

impl From<SyncError> for ServerError {
	fn from(err: SyncError) -> Self {
		match err {
			SyncError::Decode(msg) => ServerError::InvalidPayload(msg),
			SyncError::MissingEmail => {
				ServerError::BadRequest("user payload has no email address".to_string())
			}
			SyncError::Validation(msg) => ServerError::BadRequest(msg),
			SyncError::UserNotFound(_) => ServerError::NotFound("user not found".to_string()),
			SyncError::Conflict(msg) => ServerError::Conflict(msg),
			SyncError::Store(e) => ServerError::Db(e),
		}
	}
}

/// Error response body.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
	pub error: String,
	pub message: String,
}

impl_api_error_response!(ErrorResponse);

impl IntoResponse for ServerError {
	fn into_response(self) -> Response {
		let (status, error, message) = match &self {
			ServerError::Db(e) => {
				tracing::error!(error = %e, "database error");
				(
					StatusCode::INTERNAL_SERVER_ERROR,
					"database_error",
					"A database error occurred".to_string(),
				)
			}
			ServerError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
			ServerError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
			ServerError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
			ServerError::InvalidSignature(e) => {
				tracing::warn!(error = %e, "webhook verification failed");
				(
					StatusCode::BAD_REQUEST,
					"invalid_signature",
					"Webhook verification failed".to_string(),
				)
			}
			ServerError::InvalidPayload(msg) => {
				tracing::warn!(error = %msg, "invalid webhook payload");
				(StatusCode::BAD_REQUEST, "invalid_payload", msg.clone())
			}
			ServerError::Internal(msg) => {
				tracing::error!(error = %msg, "internal error");
				(
					StatusCode::INTERNAL_SERVER_ERROR,
					"internal_error",
					"An internal error occurred".to_string(),
				)
			}
		};

		(
			status,
			Json(ErrorResponse {
				error: error.to_string(),
				message,
			}),
		)
			.into_response()
	}
}
