// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Self-service profile operations for an authenticated user.

use std::sync::Arc;

use chrono::Utc;
use seat_server_auth::{PrivacySetting, User};
use seat_server_db::UserStore;
use serde::Deserialize;

use crate::error::{Result, SyncError};
use crate::sync::validate_user;

/// Fields a user may change on their own record. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProfileUpdate {
	pub name: Option<String>,

	/// An empty string clears the avatar.
	pub avatar_url: Option<String>,

	/// Parsed against [`PrivacySetting`]; unknown values are rejected.
	pub default_privacy_setting: Option<String>,
}

#[derive(Clone)]
pub struct ProfileService {
	store: Arc<dyn UserStore>,
}

impl ProfileService {
	pub fn new(store: Arc<dyn UserStore>) -> Self {
		Self { store }
	}

	/// Look up the active user behind a verified session subject.
	pub async fn current_user(&self, external_user_id: &str) -> Result<User> {
		self.store
			.get_user_by_external_id(external_user_id)
			.await?
			.ok_or_else(|| SyncError::UserNotFound(external_user_id.to_string()))
	}

	/// Record a login. Failures are logged and swallowed.
	pub async fn touch_last_login(&self, user: &User) {
		if let Err(e) = self.store.update_last_login(&user.id).await {
			tracing::warn!(user_id = %user.id, error = %e, "failed to update last login");
		}
	}

	#[tracing::instrument(skip(self, update))]
	pub async fn update_profile(
		&self,
		external_user_id: &str,
		update: ProfileUpdate,
	) -> Result<User> {
		let mut user = self.current_user(external_user_id).await?;

		if let Some(name) = update.name {
			let name = name.trim();
			if name.is_empty() {
				return Err(SyncError::Validation("name cannot be empty".to_string()));
			}
			user.name = name.to_string();
		}

		if let Some(avatar_url) = update.avatar_url {
			user.avatar_url = if avatar_url.trim().is_empty() {
				None
			} else {
				Some(avatar_url)
			};
		}

		if let Some(privacy) = update.default_privacy_setting {
			user.default_privacy_setting = privacy
				.parse::<PrivacySetting>()
				.map_err(|e| SyncError::Validation(e.to_string()))?;
		}

		user.updated_at = Utc::now();
		validate_user(&user)?;
		self.store.update_user(&user).await?;

		tracing::info!(user_id = %user.id, "profile updated");
		Ok(user)
	}

	/// Page through active users, newest first.
	pub async fn list_users(&self, limit: i64, offset: i64) -> Result<Vec<User>> {
		Ok(self.store.list_users(limit, offset).await?)
	}
}
