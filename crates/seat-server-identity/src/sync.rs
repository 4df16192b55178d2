// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Reconciliation of provider user lifecycle events with the local store.

use std::sync::Arc;

use chrono::Utc;
use seat_server_auth::User;
use seat_server_db::{DbError, UserStore};
use serde::Serialize;

use crate::classify::classify;
use crate::error::{Result, SyncError};
use crate::event::{email_local_part, EventKind, UserSnapshot, WebhookEvent};

/// What applying an event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
	Created,
	AlreadyExists,
	/// The signup was dropped because another active user holds its email.
	EmailConflict,
	Updated,
	Deleted,
	Ignored,
}

impl SyncOutcome {
	pub fn as_str(&self) -> &'static str {
		match self {
			SyncOutcome::Created => "created",
			SyncOutcome::AlreadyExists => "already_exists",
			SyncOutcome::EmailConflict => "email_conflict",
			SyncOutcome::Updated => "updated",
			SyncOutcome::Deleted => "deleted",
			SyncOutcome::Ignored => "ignored",
		}
	}
}

impl std::fmt::Display for SyncOutcome {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Applies verified webhook events to the user store.
#[derive(Clone)]
pub struct IdentitySync {
	store: Arc<dyn UserStore>,
}

impl IdentitySync {
	pub fn new(store: Arc<dyn UserStore>) -> Self {
		Self { store }
	}

	/// Dispatch on the event type. Unknown types are [`SyncOutcome::Ignored`].
	#[tracing::instrument(skip(self, event), fields(event_type = %event.event_type))]
	pub async fn apply(&self, event: &WebhookEvent) -> Result<SyncOutcome> {
		let result = match event.kind() {
			EventKind::UserCreated => self.user_created(&event.user_snapshot()?).await,
			EventKind::UserUpdated => self.user_updated(&event.user_snapshot()?).await,
			EventKind::UserDeleted => self.user_deleted(&event.user_snapshot()?.id).await,
			EventKind::Other(tag) => {
				tracing::debug!(event_type = %tag, "ignoring unhandled event type");
				Ok(SyncOutcome::Ignored)
			}
		};

		match &result {
			Ok(outcome) => tracing::info!(outcome = %outcome, "identity event applied"),
			Err(SyncError::Store(e)) => tracing::error!(error = %e, "identity event failed"),
			Err(e) => tracing::warn!(error = %e, "identity event rejected"),
		}
		result
	}

	/// Create the local record for a new provider user. Creating a user that
	/// already exists is a successful no-op, as is a signup whose email is
	/// held by another active user.
	pub async fn user_created(&self, snapshot: &UserSnapshot) -> Result<SyncOutcome> {
		if self
			.store
			.get_user_by_external_id(&snapshot.id)
			.await?
			.is_some()
		{
			return Ok(SyncOutcome::AlreadyExists);
		}

		let email = snapshot
			.primary_email()
			.filter(|e| !e.trim().is_empty())
			.ok_or(SyncError::MissingEmail)?;
		let name = snapshot
			.display_name()
			.unwrap_or_else(|| email_local_part(email).to_string());

		let user = User::new(
			snapshot.id.as_str(),
			email,
			name,
			avatar_from(snapshot),
			classify(snapshot),
		);
		validate_user(&user)?;

		match self.store.create_user(&user).await {
			Ok(()) => Ok(SyncOutcome::Created),
			Err(DbError::Conflict(message)) => {
				// A concurrent delivery for the same user won the race.
				if self
					.store
					.get_user_by_external_id(&snapshot.id)
					.await?
					.is_some()
				{
					tracing::info!(external_user_id = %snapshot.id, "user created concurrently");
					return Ok(SyncOutcome::AlreadyExists);
				}
				tracing::warn!(
					external_user_id = %snapshot.id,
					%message,
					"signup dropped: email belongs to another active user"
				);
				Ok(SyncOutcome::EmailConflict)
			}
			Err(e) => Err(e.into()),
		}
	}

	/// Merge the snapshot into the existing record.
	pub async fn user_updated(&self, snapshot: &UserSnapshot) -> Result<SyncOutcome> {
		let mut user = self
			.store
			.get_user_by_external_id(&snapshot.id)
			.await?
			.ok_or_else(|| SyncError::UserNotFound(snapshot.id.clone()))?;

		if let Some(email) = snapshot.primary_email() {
			user.email = email.to_string();
		}
		if let Some(name) = snapshot.display_name() {
			user.name = name;
		}
		user.avatar_url = avatar_from(snapshot);
		user.primary_auth_provider = classify(snapshot);
		user.updated_at = Utc::now();

		validate_user(&user)?;
		self.store.update_user(&user).await?;
		Ok(SyncOutcome::Updated)
	}

	pub async fn user_deleted(&self, external_user_id: &str) -> Result<SyncOutcome> {
		let user = self
			.store
			.get_user_by_external_id(external_user_id)
			.await?
			.ok_or_else(|| SyncError::UserNotFound(external_user_id.to_string()))?;

		self.store.soft_delete_user(&user.id).await?;
		Ok(SyncOutcome::Deleted)
	}
}

/// Reject records the store would accept but the product cannot use.
pub fn validate_user(user: &User) -> Result<()> {
	if user.email.trim().is_empty() {
		return Err(SyncError::Validation("email is required".to_string()));
	}
	if user.name.trim().is_empty() {
		return Err(SyncError::Validation("name is required".to_string()));
	}
	Ok(())
}

fn avatar_from(snapshot: &UserSnapshot) -> Option<String> {
	snapshot
		.image_url
		.as_deref()
		.filter(|url| !url.is_empty())
		.map(str::to_string)
}
