// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identity provider configuration: webhook signing secrets and the key
//! material used to verify session tokens.
//!
//! Secrets never come from the layer. They are loaded from the environment
//! (`VAR` or `VAR_FILE`) and handed to [`IdentityConfigLayer::finalize`].

use seat_common_config::SecretString;
use serde::Deserialize;

use crate::error::ConfigError;

pub const DEFAULT_CLERK_API_URL: &str = "https://api.clerk.com";
pub const DEFAULT_WEBHOOK_TOLERANCE_SECS: u64 = 300;

/// Secret inputs for the identity section.
#[derive(Debug, Clone, Default)]
pub struct IdentitySecrets {
	pub webhook_secret: Option<SecretString>,
	pub previous_webhook_secret: Option<SecretString>,
	pub jwt_key: Option<SecretString>,
	pub secret_key: Option<SecretString>,
}

/// Where session token verification keys come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionKeySource {
	/// A PEM encoded public key. No network access needed.
	Pem(SecretString),
	/// The provider's JWKS endpoint, authenticated with the secret key.
	Jwks { url: String, secret_key: SecretString },
}

/// Identity configuration (runtime, fully resolved).
#[derive(Debug, Clone)]
pub struct IdentityConfig {
	/// Current secret first, then the previous one while a rotation is in flight.
	pub webhook_secrets: Vec<SecretString>,
	pub webhook_tolerance_secs: u64,
	pub session_keys: SessionKeySource,
	/// Accepted `azp` claims. Empty disables the check.
	pub authorized_parties: Vec<String>,
}

/// Identity configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdentityConfigLayer {
	#[serde(default)]
	pub webhook_tolerance_secs: Option<u64>,
	#[serde(default)]
	pub api_url: Option<String>,
	#[serde(default)]
	pub authorized_parties: Option<Vec<String>>,
}

impl IdentityConfigLayer {
	pub fn merge(&mut self, other: IdentityConfigLayer) {
		if other.webhook_tolerance_secs.is_some() {
			self.webhook_tolerance_secs = other.webhook_tolerance_secs;
		}
		if other.api_url.is_some() {
			self.api_url = other.api_url;
		}
		if other.authorized_parties.is_some() {
			self.authorized_parties = other.authorized_parties;
		}
	}

	pub fn finalize(self, secrets: IdentitySecrets) -> Result<IdentityConfig, ConfigError> {
		let webhook_secret = secrets.webhook_secret.ok_or_else(|| {
			ConfigError::validation(
				"SEAT_SERVER_CLERK_WEBHOOK_SECRET is required to verify identity webhooks",
			)
		})?;

		let webhook_tolerance_secs = self
			.webhook_tolerance_secs
			.unwrap_or(DEFAULT_WEBHOOK_TOLERANCE_SECS);
		if webhook_tolerance_secs == 0 {
			return Err(ConfigError::invalid_value(
				"SEAT_SERVER_WEBHOOK_TOLERANCE_SECS",
				"must be greater than zero",
			));
		}

		let session_keys = match (secrets.jwt_key, secrets.secret_key) {
			(Some(pem), _) => SessionKeySource::Pem(pem),
			(None, Some(secret_key)) => {
				let api_url = self
					.api_url
					.unwrap_or_else(|| DEFAULT_CLERK_API_URL.to_string());
				SessionKeySource::Jwks {
					url: format!("{}/v1/jwks", api_url.trim_end_matches('/')),
					secret_key,
				}
			}
			(None, None) => {
				return Err(ConfigError::validation(
					"one of SEAT_SERVER_CLERK_JWT_KEY or SEAT_SERVER_CLERK_SECRET_KEY is required \
					 to verify session tokens",
				))
			}
		};

		let mut webhook_secrets = vec![webhook_secret];
		webhook_secrets.extend(secrets.previous_webhook_secret);

		let authorized_parties = self
			.authorized_parties
			.unwrap_or_default()
			.into_iter()
			.map(|party| party.trim().trim_end_matches('/').to_string())
			.filter(|party| !party.is_empty())
			.collect();

		Ok(IdentityConfig {
			webhook_secrets,
			webhook_tolerance_secs,
			session_keys,
			authorized_parties,
		})
	}
}
