// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Identity provider webhook envelopes.
//!
//! The envelope is decoded eagerly but `data` is kept as raw JSON until the
//! event type is known, so unknown event types never fail on their payload.

use serde::Deserialize;
use serde_json::value::RawValue;

use crate::error::{Result, SyncError};

pub const USER_CREATED: &str = "user.created";
pub const USER_UPDATED: &str = "user.updated";
pub const USER_DELETED: &str = "user.deleted";

/// The event types this service reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
	UserCreated,
	UserUpdated,
	UserDeleted,
	Other(String),
}

impl EventKind {
	pub fn as_str(&self) -> &str {
		match self {
			EventKind::UserCreated => USER_CREATED,
			EventKind::UserUpdated => USER_UPDATED,
			EventKind::UserDeleted => USER_DELETED,
			EventKind::Other(tag) => tag,
		}
	}
}

impl From<&str> for EventKind {
	fn from(tag: &str) -> Self {
		match tag {
			USER_CREATED => EventKind::UserCreated,
			USER_UPDATED => EventKind::UserUpdated,
			USER_DELETED => EventKind::UserDeleted,
			other => EventKind::Other(other.to_string()),
		}
	}
}

impl std::fmt::Display for EventKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A verified webhook body.
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
	#[serde(rename = "type")]
	pub event_type: String,

	#[serde(default)]
	pub object: Option<String>,

	pub data: Box<RawValue>,
}

impl WebhookEvent {
	/// Parse the envelope. Missing `type` or `data` is a decode error.
	pub fn decode(body: &[u8]) -> Result<Self> {
		Ok(serde_json::from_slice(body)?)
	}

	pub fn kind(&self) -> EventKind {
		EventKind::from(self.event_type.as_str())
	}

	/// Decode `data` as a user snapshot. The snapshot must carry a non-empty
	/// `id`.
	pub fn user_snapshot(&self) -> Result<UserSnapshot> {
		let snapshot: UserSnapshot = serde_json::from_str(self.data.get())?;
		if snapshot.id.trim().is_empty() {
			return Err(SyncError::Decode("user payload has an empty id".to_string()));
		}
		Ok(snapshot)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EmailAddress {
	pub email_address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExternalAccount {
	/// Provider tag such as `oauth_google`.
	#[serde(default)]
	pub provider: String,
}

/// The provider's view of a user as carried in `data`.
///
/// Everything but `id` defaults, so the sparse `user.deleted` payload
/// (`{"id": .., "deleted": true}`) decodes too.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UserSnapshot {
	pub id: String,

	#[serde(default)]
	pub email_addresses: Vec<EmailAddress>,

	#[serde(default)]
	pub first_name: Option<String>,

	#[serde(default)]
	pub last_name: Option<String>,

	#[serde(default)]
	pub image_url: Option<String>,

	#[serde(default)]
	pub external_accounts: Vec<ExternalAccount>,

	#[serde(default)]
	pub password_enabled: bool,

	#[serde(default)]
	pub deleted: bool,
}

impl UserSnapshot {
	/// The first listed address, which the provider treats as primary.
	pub fn primary_email(&self) -> Option<&str> {
		self.email_addresses
			.first()
			.map(|e| e.email_address.as_str())
	}

	pub fn display_name(&self) -> Option<String> {
		display_name(self.first_name.as_deref(), self.last_name.as_deref())
	}
}

/// `"first last"` when both are present, otherwise whichever is. Blank
/// parts count as absent.
pub fn display_name(first: Option<&str>, last: Option<&str>) -> Option<String> {
	let first = first.map(str::trim).filter(|s| !s.is_empty());
	let last = last.map(str::trim).filter(|s| !s.is_empty());

	match (first, last) {
		(Some(f), Some(l)) => Some(format!("{f} {l}")),
		(Some(f), None) => Some(f.to_string()),
		(None, Some(l)) => Some(l.to_string()),
		(None, None) => None,
	}
}

/// The part of an address before `@`.
pub fn email_local_part(email: &str) -> &str {
	email.split('@').next().unwrap_or(email)
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn decodes_created_envelope() {
		let body = br#"{
			"type": "user.created",
			"object": "event",
			"data": {
				"id": "user_2abc",
				"email_addresses": [{"email_address": "a@x.com", "id": "idn_1"}],
				"first_name": "Ann",
				"last_name": null,
				"image_url": "https://img.clerk.com/a.png",
				"external_accounts": [],
				"password_enabled": true
			}
		}"#;

		let event = WebhookEvent::decode(body).unwrap();
		assert_eq!(event.kind(), EventKind::UserCreated);
		assert_eq!(event.object.as_deref(), Some("event"));

		let snapshot = event.user_snapshot().unwrap();
		assert_eq!(snapshot.id, "user_2abc");
		assert_eq!(snapshot.primary_email(), Some("a@x.com"));
		assert_eq!(snapshot.display_name().as_deref(), Some("Ann"));
		assert_eq!(snapshot.image_url.as_deref(), Some("https://img.clerk.com/a.png"));
		assert!(snapshot.password_enabled);
	}

	#[test]
	fn decodes_sparse_deleted_payload() {
		let body = br#"{"type":"user.deleted","data":{"id":"user_2abc","deleted":true}}"#;

		let event = WebhookEvent::decode(body).unwrap();
		assert_eq!(event.kind(), EventKind::UserDeleted);

		let snapshot = event.user_snapshot().unwrap();
		assert!(snapshot.deleted);
		assert!(snapshot.email_addresses.is_empty());
		assert!(!snapshot.password_enabled);
	}

	#[test]
	fn unknown_type_with_odd_data_still_decodes() {
		let body = br#"{"type":"session.created","data":[1,2,3]}"#;

		let event = WebhookEvent::decode(body).unwrap();
		assert_eq!(event.kind(), EventKind::Other("session.created".to_string()));
	}

	#[test]
	fn malformed_json_is_a_decode_error() {
		assert!(matches!(
			WebhookEvent::decode(b"{not json"),
			Err(SyncError::Decode(_))
		));
	}

	#[test]
	fn missing_envelope_fields_are_decode_errors() {
		assert!(matches!(
			WebhookEvent::decode(br#"{"data":{"id":"x"}}"#),
			Err(SyncError::Decode(_))
		));
		assert!(matches!(
			WebhookEvent::decode(br#"{"type":"user.created"}"#),
			Err(SyncError::Decode(_))
		));
	}

	#[test]
	fn snapshot_requires_non_empty_id() {
		let missing = WebhookEvent::decode(br#"{"type":"user.updated","data":{}}"#).unwrap();
		assert!(matches!(missing.user_snapshot(), Err(SyncError::Decode(_))));

		let empty =
			WebhookEvent::decode(br#"{"type":"user.updated","data":{"id":"  "}}"#).unwrap();
		assert!(matches!(empty.user_snapshot(), Err(SyncError::Decode(_))));
	}

	#[test]
	fn display_name_rule() {
		assert_eq!(display_name(Some("Ann"), Some("Lee")).as_deref(), Some("Ann Lee"));
		assert_eq!(display_name(Some("Ann"), None).as_deref(), Some("Ann"));
		assert_eq!(display_name(None, Some("Lee")).as_deref(), Some("Lee"));
		assert_eq!(display_name(Some("  "), Some("Lee")).as_deref(), Some("Lee"));
		assert_eq!(display_name(Some(""), Some("")), None);
		assert_eq!(display_name(None, None), None);
	}

	#[test]
	fn local_part() {
		assert_eq!(email_local_part("ann@example.com"), "ann");
		assert_eq!(email_local_part("no-at-sign"), "no-at-sign");
	}

	proptest! {
		/// **Property: display names are never blank**
		///
		/// Why: a `Some` result is written straight into a NOT NULL column
		/// that validation requires to be non-empty.
		#[test]
		fn display_name_is_none_or_non_blank(
			first in proptest::option::of("[ a-zA-Z]{0,12}"),
			last in proptest::option::of("[ a-zA-Z]{0,12}"),
		) {
			if let Some(name) = display_name(first.as_deref(), last.as_deref()) {
				prop_assert!(!name.trim().is_empty());
				prop_assert_eq!(name.trim(), name.as_str());
			}
		}
	}
}
