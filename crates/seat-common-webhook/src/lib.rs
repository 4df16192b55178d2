// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Svix-style webhook signature verification.
//!
//! The identity provider signs every delivery with HMAC-SHA256 over
//! `"{svix-id}.{svix-timestamp}.{body}"` and sends the result in the
//! `svix-signature` header as a space separated list of
//! `<version>,<base64>` entries. Only `v1` entries are considered.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use http::HeaderMap;
use seat_common_config::Secret;
use sha2::Sha256;
use thiserror::Error;
use tracing::{debug, warn};

type HmacSha256 = Hmac<Sha256>;

pub const HEADER_ID: &str = "svix-id";
pub const HEADER_TIMESTAMP: &str = "svix-timestamp";
pub const HEADER_SIGNATURE: &str = "svix-signature";

pub const SECRET_PREFIX: &str = "whsec_";
pub const SIGNATURE_VERSION: &str = "v1";

/// Maximum distance between the signed timestamp and the local clock.
pub const DEFAULT_TOLERANCE: Duration = Duration::from_secs(300);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WebhookError {
	#[error("missing or empty header: {0}")]
	MissingHeader(&'static str),

	#[error("invalid timestamp header: {0}")]
	InvalidTimestamp(String),

	#[error("timestamp {timestamp} outside tolerance (now {now})")]
	TimestampOutOfTolerance { timestamp: i64, now: i64 },

	#[error("invalid webhook secret: {0}")]
	InvalidSecret(String),

	#[error("no webhook secrets configured")]
	NoSecrets,

	#[error("no v1 signatures present")]
	NoSignatures,

	#[error("signature mismatch")]
	SignatureMismatch,
}

/// A decoded signing key. Construct with [`WebhookSecret::parse`].
#[derive(Clone)]
pub struct WebhookSecret {
	key: Secret<Vec<u8>>,
}

impl WebhookSecret {
	/// Parse a `whsec_<base64>` secret. The prefix is optional.
	pub fn parse(raw: &str) -> Result<Self, WebhookError> {
		let trimmed = raw.trim();
		let encoded = trimmed.strip_prefix(SECRET_PREFIX).unwrap_or(trimmed);
		if encoded.is_empty() {
			return Err(WebhookError::InvalidSecret("secret is empty".to_string()));
		}

		let key = STANDARD
			.decode(encoded)
			.map_err(|e| WebhookError::InvalidSecret(format!("not valid base64: {e}")))?;
		if key.is_empty() {
			return Err(WebhookError::InvalidSecret("secret is empty".to_string()));
		}

		Ok(Self::from_bytes(key))
	}

	pub fn from_bytes(key: Vec<u8>) -> Self {
		Self {
			key: Secret::new(key),
		}
	}

	fn mac(&self) -> HmacSha256 {
		HmacSha256::new_from_slice(self.key.expose()).expect("HMAC can take key of any size")
	}
}

impl std::fmt::Debug for WebhookSecret {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("WebhookSecret").field("key", &self.key).finish()
	}
}

/// Compute the `v1,<base64>` signature for a delivery.
///
/// Useful for tests and for replaying captured deliveries.
pub fn sign(secret: &WebhookSecret, msg_id: &str, timestamp: i64, body: &[u8]) -> String {
	let mut mac = secret.mac();
	mac.update(signed_prefix(msg_id, timestamp).as_bytes());
	mac.update(body);
	let digest = mac.finalize().into_bytes();
	format!("{SIGNATURE_VERSION},{}", STANDARD.encode(digest))
}

fn signed_prefix(msg_id: &str, timestamp: impl std::fmt::Display) -> String {
	format!("{msg_id}.{timestamp}.")
}

/// Verifies deliveries against one or more secrets.
///
/// More than one secret is accepted so a signing key can be rotated without
/// dropping deliveries signed with the previous one.
#[derive(Debug, Clone)]
pub struct WebhookVerifier {
	secrets: Vec<WebhookSecret>,
	tolerance: Duration,
}

impl WebhookVerifier {
	pub fn new(secret: WebhookSecret) -> Self {
		Self {
			secrets: vec![secret],
			tolerance: DEFAULT_TOLERANCE,
		}
	}

	pub fn with_secrets(secrets: Vec<WebhookSecret>) -> Result<Self, WebhookError> {
		if secrets.is_empty() {
			return Err(WebhookError::NoSecrets);
		}
		Ok(Self {
			secrets,
			tolerance: DEFAULT_TOLERANCE,
		})
	}

	pub fn with_tolerance(mut self, tolerance: Duration) -> Self {
		self.tolerance = tolerance;
		self
	}

	pub fn tolerance(&self) -> Duration {
		self.tolerance
	}

	/// Verify a delivery against the local clock.
	pub fn verify(&self, headers: &HeaderMap, body: &[u8]) -> Result<(), WebhookError> {
		self.verify_at(headers, body, chrono::Utc::now().timestamp())
	}

	/// Verify a delivery as if the local clock read `now` (unix seconds).
	pub fn verify_at(&self, headers: &HeaderMap, body: &[u8], now: i64) -> Result<(), WebhookError> {
		let msg_id = header(headers, HEADER_ID)?;
		let raw_timestamp = header(headers, HEADER_TIMESTAMP)?;
		let signatures = header(headers, HEADER_SIGNATURE)?;

		let timestamp: i64 = raw_timestamp
			.parse()
			.map_err(|_| WebhookError::InvalidTimestamp(raw_timestamp.to_string()))?;

		if now.abs_diff(timestamp) > self.tolerance.as_secs() {
			warn!(msg_id, timestamp, now, "webhook timestamp outside tolerance");
			return Err(WebhookError::TimestampOutOfTolerance { timestamp, now });
		}

		let candidates: Vec<Vec<u8>> = signatures
			.split_whitespace()
			.filter_map(|entry| entry.split_once(','))
			.filter(|(version, _)| *version == SIGNATURE_VERSION)
			.filter_map(|(_, encoded)| STANDARD.decode(encoded).ok())
			.collect();

		if candidates.is_empty() {
			warn!(msg_id, "webhook carried no usable v1 signatures");
			return Err(WebhookError::NoSignatures);
		}

		let prefix = signed_prefix(msg_id, raw_timestamp);
		for secret in &self.secrets {
			for candidate in &candidates {
				let mut mac = secret.mac();
				mac.update(prefix.as_bytes());
				mac.update(body);
				if mac.verify_slice(candidate).is_ok() {
					debug!(msg_id, "webhook signature verified");
					return Ok(());
				}
			}
		}

		warn!(msg_id, "webhook signature verification failed");
		Err(WebhookError::SignatureMismatch)
	}
}

fn header<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<&'a str, WebhookError> {
	headers
		.get(name)
		.and_then(|v| v.to_str().ok())
		.map(str::trim)
		.filter(|v| !v.is_empty())
		.ok_or(WebhookError::MissingHeader(name))
}
