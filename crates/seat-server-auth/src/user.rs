// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The locally owned user record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{AuthProvider, PrivacySetting, UserId};

/// A user mirrored from the identity provider.
///
/// `external_user_id` is the provider's id and the join key for every
/// webhook. At most one active record exists per external id and per email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
	/// Local identifier. Never changes after creation.
	pub id: UserId,

	/// The identity provider's user id.
	pub external_user_id: String,

	pub email: String,

	/// Display name.
	pub name: String,

	pub avatar_url: Option<String>,

	pub primary_auth_provider: AuthProvider,

	pub default_privacy_setting: PrivacySetting,

	/// Last time the user fetched their own profile.
	pub last_login_at: Option<DateTime<Utc>>,

	pub created_at: DateTime<Utc>,

	pub updated_at: DateTime<Utc>,

	/// When the user was soft-deleted, if applicable.
	/// Users with a deleted_at timestamp are excluded from every lookup.
	pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
	/// Build a fresh record with a new id, private defaults and equal
	/// creation and update timestamps.
	pub fn new(
		external_user_id: impl Into<String>,
		email: impl Into<String>,
		name: impl Into<String>,
		avatar_url: Option<String>,
		primary_auth_provider: AuthProvider,
	) -> Self {
		let now = Utc::now();
		Self {
			id: UserId::generate(),
			external_user_id: external_user_id.into(),
			email: email.into(),
			name: name.into(),
			avatar_url,
			primary_auth_provider,
			default_privacy_setting: PrivacySetting::default(),
			last_login_at: None,
			created_at: now,
			updated_at: now,
			deleted_at: None,
		}
	}
}
