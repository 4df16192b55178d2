// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Inbound identity provider webhooks.
//!
//! Status codes double as retry control for the provider: a failed
//! `user.created` answers 500 so the delivery is retried, while failed
//! `user.updated` and `user.deleted` deliveries answer 200 with the error in
//! the body so they are not.

use axum::{
	body::Bytes,
	extract::State,
	http::{HeaderMap, StatusCode},
	response::{IntoResponse, Response},
	Json,
};
use seat_server_identity::{EventKind, SyncError, WebhookEvent};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{api::AppState, error::ServerError};

/// Result of processing a verified webhook.
#[derive(Debug, Serialize, ToSchema)]
pub struct WebhookResponse {
	pub message: String,

	/// `created`, `already_exists`, `email_conflict`, `updated`, `deleted` or
	/// `ignored`.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub outcome: Option<String>,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/webhooks/clerk",
    request_body(content = String, description = "Raw Svix-signed event body", content_type = "application/json"),
    responses(
        (status = 200, description = "Event processed, ignored, or failed without retry", body = WebhookResponse),
        (status = 400, description = "Signature or payload rejected", body = crate::error::ErrorResponse),
        (status = 500, description = "Not configured, or user creation failed", body = WebhookResponse)
    ),
    tag = "webhooks"
)]
/// POST /api/webhooks/clerk - Apply a user lifecycle event.
#[tracing::instrument(skip(state, headers, body), fields(svix_id = tracing::field::Empty))]
pub async fn clerk_webhook(
	State(state): State<AppState>,
	headers: HeaderMap,
	body: Bytes,
) -> Result<Response, ServerError> {
	let verifier = state
		.webhook_verifier
		.as_ref()
		.ok_or_else(|| ServerError::Internal("webhook secret is not configured".to_string()))?;

	if let Some(id) = headers
		.get(seat_common_webhook::HEADER_ID)
		.and_then(|v| v.to_str().ok())
	{
		tracing::Span::current().record("svix_id", id);
	}

	verifier.verify(&headers, &body)?;
	let event = WebhookEvent::decode(&body)?;
	let kind = event.kind();

	match state.identity_sync.apply(&event).await {
		Ok(outcome) => Ok((
			StatusCode::OK,
			Json(WebhookResponse {
				message: format!("{kind} processed"),
				outcome: Some(outcome.as_str().to_string()),
				error: None,
			}),
		)
			.into_response()),
		Err(SyncError::Decode(msg)) => Err(ServerError::InvalidPayload(msg)),
		Err(e) => {
			let status = if kind == EventKind::UserCreated {
				StatusCode::INTERNAL_SERVER_ERROR
			} else {
				StatusCode::OK
			};
			let error = match &e {
				SyncError::Store(_) => "internal error".to_string(),
				other => other.to_string(),
			};
			Ok((
				status,
				Json(WebhookResponse {
					message: format!("failed to process {kind}"),
					outcome: None,
					error: Some(error),
				}),
			)
				.into_response())
		}
	}
}
