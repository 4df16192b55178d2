// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core type definitions for users.
//!
//! - **ID newtypes**: [`UserId`] wraps a ULID so identifiers sort by creation
//!   time, including ids minted within the same millisecond
//! - **Enums**: [`AuthProvider`] and [`PrivacySetting`], stored and
//!   serialized as lowercase strings

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, OnceLock};
use ulid::{Generator, Ulid};

// =============================================================================
// ID Newtypes
// =============================================================================

/// Process-wide monotonic generator. Within one millisecond the random part
/// is incremented, so ids minted by concurrent requests still sort in order.
fn next_ulid() -> Ulid {
	static GENERATOR: OnceLock<Mutex<Generator>> = OnceLock::new();

	let generator = GENERATOR.get_or_init(|| Mutex::new(Generator::new()));
	let mut generator = generator.lock().unwrap_or_else(|e| e.into_inner());
	// Overflow needs 2^80 ids in one millisecond; fall back to a fresh ULID.
	generator.generate().unwrap_or_else(|_| Ulid::new())
}

macro_rules! define_id_type {
	($name:ident, $doc:expr) => {
		#[doc = $doc]
		#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(transparent)]
		pub struct $name(Ulid);

		impl $name {
			/// Create a new ID from a ULID.
			pub fn new(id: Ulid) -> Self {
				Self(id)
			}

			/// Generate a new monotonic ID.
			pub fn generate() -> Self {
				Self(next_ulid())
			}

			/// Get the inner ULID value.
			pub fn into_inner(self) -> Ulid {
				self.0
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, "{}", self.0)
			}
		}

		impl FromStr for $name {
			type Err = ulid::DecodeError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Ulid::from_string(s).map(Self)
			}
		}

		impl From<Ulid> for $name {
			fn from(id: Ulid) -> Self {
				Self(id)
			}
		}

		impl From<$name> for Ulid {
			fn from(id: $name) -> Self {
				id.0
			}
		}
	};
}

define_id_type!(UserId, "Unique identifier for a locally stored user.");

// =============================================================================
// Enums
// =============================================================================

/// Returned when a stored or submitted string names no known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} '{value}'")]
pub struct ParseEnumError {
	pub kind: &'static str,
	pub value: String,
}

/// How the user primarily signs in, as inferred from the provider's record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
	/// Email and password.
	Email,
	/// Google OAuth.
	Google,
	#[default]
	Unknown,
}

impl AuthProvider {
	pub fn as_str(&self) -> &'static str {
		match self {
			AuthProvider::Email => "email",
			AuthProvider::Google => "google",
			AuthProvider::Unknown => "unknown",
		}
	}
}

impl fmt::Display for AuthProvider {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for AuthProvider {
	type Err = ParseEnumError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"email" => Ok(AuthProvider::Email),
			"google" => Ok(AuthProvider::Google),
			"unknown" => Ok(AuthProvider::Unknown),
			other => Err(ParseEnumError {
				kind: "auth provider",
				value: other.to_string(),
			}),
		}
	}
}

/// Who may see the user's activity by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivacySetting {
	Public,
	Friends,
	#[default]
	Private,
}

impl PrivacySetting {
	pub fn as_str(&self) -> &'static str {
		match self {
			PrivacySetting::Public => "public",
			PrivacySetting::Friends => "friends",
			PrivacySetting::Private => "private",
		}
	}
}

impl fmt::Display for PrivacySetting {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for PrivacySetting {
	type Err = ParseEnumError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"public" => Ok(PrivacySetting::Public),
			"friends" => Ok(PrivacySetting::Friends),
			"private" => Ok(PrivacySetting::Private),
			other => Err(ParseEnumError {
				kind: "privacy setting",
				value: other.to_string(),
			}),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	mod user_id {
		use super::*;

		#[test]
		fn generated_ids_are_strictly_increasing() {
			let ids: Vec<UserId> = (0..1000).map(|_| UserId::generate()).collect();
			assert!(ids.windows(2).all(|w| w[0] < w[1]));
		}

		#[test]
		fn string_form_sorts_like_the_id() {
			let a = UserId::generate();
			let b = UserId::generate();
			assert!(a.to_string() < b.to_string());
		}

		#[test]
		fn parses_its_display_form() {
			let id = UserId::generate();
			let parsed: UserId = id.to_string().parse().unwrap();
			assert_eq!(parsed, id);
			assert_eq!(id.to_string().len(), 26);
		}

		#[test]
		fn rejects_non_ulid_strings() {
			assert!("user_2abc".parse::<UserId>().is_err());
		}

		#[test]
		fn serializes_transparently() {
			let id = UserId::generate();
			let json = serde_json::to_string(&id).unwrap();
			assert_eq!(json, format!("\"{id}\""));
		}
	}

	mod enums {
		use super::*;

		#[test]
		fn privacy_defaults_to_private() {
			assert_eq!(PrivacySetting::default(), PrivacySetting::Private);
		}

		#[test]
		fn provider_defaults_to_unknown() {
			assert_eq!(AuthProvider::default(), AuthProvider::Unknown);
		}

		#[test]
		fn parsing_is_case_sensitive_and_closed() {
			assert!("Private".parse::<PrivacySetting>().is_err());
			assert!("everyone".parse::<PrivacySetting>().is_err());
			assert!("oauth_google".parse::<AuthProvider>().is_err());
		}

		#[test]
		fn serde_uses_lowercase_names() {
			assert_eq!(
				serde_json::to_string(&PrivacySetting::Friends).unwrap(),
				"\"friends\""
			);
			let provider: AuthProvider = serde_json::from_str("\"google\"").unwrap();
			assert_eq!(provider, AuthProvider::Google);
		}
	}

	proptest! {
		/// **Property: every variant survives its string form**
		#[test]
		fn display_then_parse_is_identity(i in 0usize..3, j in 0usize..3) {
			let privacy = [PrivacySetting::Public, PrivacySetting::Friends, PrivacySetting::Private][i];
			let provider = [AuthProvider::Email, AuthProvider::Google, AuthProvider::Unknown][j];
			prop_assert_eq!(privacy.to_string().parse::<PrivacySetting>(), Ok(privacy));
			prop_assert_eq!(provider.to_string().parse::<AuthProvider>(), Ok(provider));
		}
	}
}
