// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Verification of session tokens issued by the identity provider.
//!
//! The provider signs short-lived RS256 JWTs whose `sub` claim is the
//! provider's user id. Two verifiers are available:
//!
//! - [`JwtSessionVerifier`]: a static key, either the PEM public key from the
//!   provider dashboard or a shared HMAC secret for local development
//! - [`JwksSessionVerifier`]: keys fetched from the provider's JWKS endpoint
//!   and cached by `kid`, refetched when an unknown `kid` shows up but at
//!   most once per [`DEFAULT_JWKS_REFRESH_INTERVAL`]

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use seat_common_config::SecretString;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, instrument, warn};

use crate::error::AuthError;

/// Clock skew tolerated on `exp` and `nbf`.
pub const DEFAULT_LEEWAY_SECS: u64 = 5;

const JWKS_TIMEOUT: Duration = Duration::from_secs(10);

/// Minimum gap between JWKS fetches triggered by unknown `kid`s.
pub const DEFAULT_JWKS_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Claims the server relies on. Unknown claims are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
	/// The provider's user id.
	pub sub: String,
	pub exp: i64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub nbf: Option<i64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub iat: Option<i64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub iss: Option<String>,
	/// Origin of the frontend that requested the token.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub azp: Option<String>,
	/// Provider session id.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub sid: Option<String>,
}

/// Checks applied to every token regardless of where the key came from.
#[derive(Debug, Clone)]
pub struct SessionPolicy {
	pub leeway_secs: u64,
	/// Accepted `azp` values. Empty accepts any.
	pub authorized_parties: Vec<String>,
}

impl Default for SessionPolicy {
	fn default() -> Self {
		Self {
			leeway_secs: DEFAULT_LEEWAY_SECS,
			authorized_parties: Vec::new(),
		}
	}
}

impl SessionPolicy {
	pub fn with_authorized_parties(mut self, parties: Vec<String>) -> Self {
		self.authorized_parties = parties;
		self
	}

	fn validation(&self, algorithm: Algorithm) -> Validation {
		let mut validation = Validation::new(algorithm);
		validation.leeway = self.leeway_secs;
		validation.validate_nbf = true;
		validation.validate_aud = false;
		validation.set_required_spec_claims(&["exp", "sub"]);
		validation
	}

	fn decode(
		&self,
		token: &str,
		key: &DecodingKey,
		algorithm: Algorithm,
	) -> Result<SessionClaims, AuthError> {
		let data = decode::<SessionClaims>(token, key, &self.validation(algorithm))
			.map_err(map_jwt_error)?;
		let claims = data.claims;

		if claims.sub.trim().is_empty() {
			return Err(AuthError::InvalidToken("empty subject".to_string()));
		}

		if !self.authorized_parties.is_empty() {
			if let Some(azp) = &claims.azp {
				if !self.authorized_parties.iter().any(|p| p == azp) {
					warn!(azp = %azp, "session token issued for unauthorized party");
					return Err(AuthError::UnauthorizedParty(azp.clone()));
				}
			}
		}

		Ok(claims)
	}
}

fn map_jwt_error(err: jsonwebtoken::errors::Error) -> AuthError {
	match err.kind() {
		ErrorKind::ExpiredSignature => AuthError::TokenExpired,
		ErrorKind::ImmatureSignature => AuthError::InvalidToken("token not yet valid".to_string()),
		_ => AuthError::InvalidToken(err.to_string()),
	}
}

/// Resolves a bearer token to its verified claims.
#[async_trait]
pub trait SessionVerifier: Send + Sync {
	async fn verify(&self, token: &str) -> Result<SessionClaims, AuthError>;
}

/// Verifies tokens against a single, fixed key.
pub struct JwtSessionVerifier {
	key: DecodingKey,
	algorithm: Algorithm,
	policy: SessionPolicy,
}

impl JwtSessionVerifier {
	/// RS256 with a PEM encoded RSA public key (PKCS#1 or SPKI).
	pub fn from_rsa_pem(pem: &str, policy: SessionPolicy) -> Result<Self, AuthError> {
		let key = DecodingKey::from_rsa_pem(pem.as_bytes())
			.map_err(|e| AuthError::InvalidKey(format!("Invalid RSA public key: {e}")))?;
		Ok(Self {
			key,
			algorithm: Algorithm::RS256,
			policy,
		})
	}

	/// HS256 with a shared secret. Only for local development and tests.
	pub fn from_secret(secret: &[u8], policy: SessionPolicy) -> Self {
		Self {
			key: DecodingKey::from_secret(secret),
			algorithm: Algorithm::HS256,
			policy,
		}
	}
}

#[async_trait]
impl SessionVerifier for JwtSessionVerifier {
	#[instrument(name = "JwtSessionVerifier::verify", skip_all)]
	async fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
		self.policy.decode(token, &self.key, self.algorithm)
	}
}

/// Verifies RS256 tokens against keys published at a JWKS endpoint.
pub struct JwksSessionVerifier {
	url: String,
	secret_key: SecretString,
	http: reqwest::Client,
	keys: RwLock<HashMap<String, DecodingKey>>,
	/// Held while refetching; records when the last fetch was attempted.
	last_fetch: Mutex<Option<Instant>>,
	refresh_interval: Duration,
	policy: SessionPolicy,
}

impl JwksSessionVerifier {
	/// `secret_key` authenticates the JWKS request as a bearer token.
	pub fn new(
		url: impl Into<String>,
		secret_key: SecretString,
		policy: SessionPolicy,
	) -> Result<Self, AuthError> {
		let http = reqwest::Client::builder()
			.timeout(JWKS_TIMEOUT)
			.build()
			.map_err(|e| AuthError::JwksFetch(format!("Failed to create HTTP client: {e}")))?;

		Ok(Self {
			url: url.into(),
			secret_key,
			http,
			keys: RwLock::new(HashMap::new()),
			last_fetch: Mutex::new(None),
			refresh_interval: DEFAULT_JWKS_REFRESH_INTERVAL,
			policy,
		})
	}

	pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
		self.refresh_interval = interval;
		self
	}

	/// Replace the cached key set with a fresh copy from the endpoint.
	#[instrument(skip(self), fields(url = %self.url))]
	pub async fn refresh(&self) -> Result<usize, AuthError> {
		let response = self
			.http
			.get(&self.url)
			.bearer_auth(self.secret_key.expose())
			.send()
			.await
			.map_err(|e| AuthError::JwksFetch(format!("Request failed: {e}")))?;

		if !response.status().is_success() {
			return Err(AuthError::JwksFetch(format!("HTTP {}", response.status())));
		}

		let set: JwkSet = response
			.json()
			.await
			.map_err(|e| AuthError::JwksFetch(format!("Invalid JSON: {e}")))?;

		let mut keys = HashMap::new();
		for jwk in &set.keys {
			let Some(kid) = jwk.common.key_id.clone() else {
				continue;
			};
			match DecodingKey::from_jwk(jwk) {
				Ok(key) => {
					keys.insert(kid, key);
				}
				Err(e) => warn!(kid = %kid, error = %e, "skipping unusable JWK"),
			}
		}

		let count = keys.len();
		*self.keys.write().await = keys;
		debug!(keys = count, "refreshed JWKS");
		Ok(count)
	}

	async fn cached(&self, kid: &str) -> Option<DecodingKey> {
		self.keys.read().await.get(kid).cloned()
	}

	/// Resolve `kid`, refetching the key set when it is unknown. Unknown
	/// `kid`s are attacker controlled, so fetches are spaced at least
	/// `refresh_interval` apart whether or not they succeed.
	async fn key_for(&self, kid: &str) -> Result<DecodingKey, AuthError> {
		if let Some(key) = self.cached(kid).await {
			return Ok(key);
		}

		let mut last_fetch = self.last_fetch.lock().await;
		// Another request may have refreshed while we waited.
		if let Some(key) = self.cached(kid).await {
			return Ok(key);
		}
		if last_fetch.is_some_and(|at| at.elapsed() < self.refresh_interval) {
			debug!(kid = %kid, "unknown kid within refresh interval");
			return Err(AuthError::KeyNotFound(kid.to_string()));
		}

		*last_fetch = Some(Instant::now());
		self.refresh().await?;
		drop(last_fetch);

		self.cached(kid)
			.await
			.ok_or_else(|| AuthError::KeyNotFound(kid.to_string()))
	}
}

impl std::fmt::Debug for JwksSessionVerifier {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("JwksSessionVerifier")
			.field("url", &self.url)
			.field("refresh_interval", &self.refresh_interval)
			.field("policy", &self.policy)
			.finish()
	}
}

#[async_trait]
impl SessionVerifier for JwksSessionVerifier {
	#[instrument(name = "JwksSessionVerifier::verify", skip_all)]
	async fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
		let header = decode_header(token).map_err(map_jwt_error)?;
		let kid = header
			.kid
			.ok_or_else(|| AuthError::InvalidToken("missing kid header".to_string()))?;

		let key = self.key_for(&kid).await?;
		self.policy.decode(token, &key, Algorithm::RS256)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use jsonwebtoken::{encode, EncodingKey, Header};
	use wiremock::matchers::{header, method, path};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	const PRIVATE_PEM: &str = include_str!("../testdata/rsa_private.pem");
	const PUBLIC_PEM: &str = include_str!("../testdata/rsa_public.pem");
	const JWKS: &str = include_str!("../testdata/jwks.json");
	const KID: &str = "ins_test_key_1";

	fn now() -> i64 {
		chrono::Utc::now().timestamp()
	}

	fn claims(sub: &str) -> SessionClaims {
		SessionClaims {
			sub: sub.to_string(),
			exp: now() + 60,
			nbf: Some(now() - 10),
			iat: Some(now() - 10),
			iss: Some("https://clerk.example.com".to_string()),
			azp: Some("https://seats.example.com".to_string()),
			sid: Some("sess_123".to_string()),
		}
	}

	fn rs256(claims: &SessionClaims, kid: Option<&str>) -> String {
		let mut header = Header::new(Algorithm::RS256);
		header.kid = kid.map(str::to_string);
		let key = EncodingKey::from_rsa_pem(PRIVATE_PEM.as_bytes()).unwrap();
		encode(&header, claims, &key).unwrap()
	}

	fn pem_verifier() -> JwtSessionVerifier {
		JwtSessionVerifier::from_rsa_pem(PUBLIC_PEM, SessionPolicy::default()).unwrap()
	}

	mod static_key {
		use super::*;

		#[tokio::test]
		async fn accepts_valid_token() {
			let verified = pem_verifier().verify(&rs256(&claims("user_ann"), None)).await;
			assert_eq!(verified.unwrap().sub, "user_ann");
		}

		#[tokio::test]
		async fn rejects_expired_token() {
			let mut c = claims("user_ann");
			c.exp = now() - 120;
			let result = pem_verifier().verify(&rs256(&c, None)).await;
			assert_eq!(result, Err(AuthError::TokenExpired));
		}

		#[tokio::test]
		async fn tolerates_small_clock_skew() {
			let mut c = claims("user_ann");
			c.exp = now() - 2;
			assert!(pem_verifier().verify(&rs256(&c, None)).await.is_ok());
		}

		#[tokio::test]
		async fn rejects_token_not_yet_valid() {
			let mut c = claims("user_ann");
			c.nbf = Some(now() + 600);
			c.exp = now() + 1200;
			let result = pem_verifier().verify(&rs256(&c, None)).await;
			assert!(matches!(result, Err(AuthError::InvalidToken(_))));
		}

		#[tokio::test]
		async fn rejects_tampered_token() {
			let token = rs256(&claims("user_ann"), None);
			let forged = rs256(&claims("user_mallory"), None);
			let mut parts: Vec<&str> = token.split('.').collect();
			let forged_parts: Vec<&str> = forged.split('.').collect();
			parts[1] = forged_parts[1];

			let result = pem_verifier().verify(&parts.join(".")).await;
			assert!(matches!(result, Err(AuthError::InvalidToken(_))));
		}

		#[tokio::test]
		async fn rejects_garbage() {
			let result = pem_verifier().verify("not-a-jwt").await;
			assert!(matches!(result, Err(AuthError::InvalidToken(_))));
		}

		#[tokio::test]
		async fn rejects_empty_subject() {
			let result = pem_verifier().verify(&rs256(&claims(" "), None)).await;
			assert!(matches!(result, Err(AuthError::InvalidToken(_))));
		}

		#[tokio::test]
		async fn enforces_authorized_parties() {
			let policy = SessionPolicy::default()
				.with_authorized_parties(vec!["https://other.example.com".to_string()]);
			let verifier = JwtSessionVerifier::from_rsa_pem(PUBLIC_PEM, policy).unwrap();

			let result = verifier.verify(&rs256(&claims("user_ann"), None)).await;
			assert_eq!(
				result,
				Err(AuthError::UnauthorizedParty(
					"https://seats.example.com".to_string()
				))
			);
		}

		#[tokio::test]
		async fn tokens_without_azp_pass_party_check() {
			let policy = SessionPolicy::default()
				.with_authorized_parties(vec!["https://seats.example.com".to_string()]);
			let verifier = JwtSessionVerifier::from_rsa_pem(PUBLIC_PEM, policy).unwrap();

			let mut c = claims("user_ann");
			c.azp = None;
			assert!(verifier.verify(&rs256(&c, None)).await.is_ok());
		}

		#[tokio::test]
		async fn hmac_verifier_rejects_rsa_tokens() {
			let verifier = JwtSessionVerifier::from_secret(b"dev-secret", SessionPolicy::default());
			let result = verifier.verify(&rs256(&claims("user_ann"), None)).await;
			assert!(matches!(result, Err(AuthError::InvalidToken(_))));
		}

		#[tokio::test]
		async fn hmac_verifier_accepts_its_own_tokens() {
			let verifier = JwtSessionVerifier::from_secret(b"dev-secret", SessionPolicy::default());
			let token = encode(
				&Header::default(),
				&claims("user_dev"),
				&EncodingKey::from_secret(b"dev-secret"),
			)
			.unwrap();
			assert_eq!(verifier.verify(&token).await.unwrap().sub, "user_dev");
		}

		#[test]
		fn invalid_pem_is_an_internal_error() {
			let err = JwtSessionVerifier::from_rsa_pem("not a key", SessionPolicy::default())
				.err()
				.unwrap();
			assert!(err.is_internal());
		}
	}

	mod jwks {
		use super::*;

		async fn serve_jwks(expected_calls: u64) -> MockServer {
			let server = MockServer::start().await;
			Mock::given(method("GET"))
				.and(path("/v1/jwks"))
				.and(header("authorization", "Bearer sk_test_123"))
				.respond_with(ResponseTemplate::new(200).set_body_raw(JWKS, "application/json"))
				.expect(expected_calls)
				.mount(&server)
				.await;
			server
		}

		fn verifier(server: &MockServer) -> JwksSessionVerifier {
			JwksSessionVerifier::new(
				format!("{}/v1/jwks", server.uri()),
				SecretString::from("sk_test_123"),
				SessionPolicy::default(),
			)
			.unwrap()
		}

		#[tokio::test]
		async fn fetches_keys_once_and_caches_them() {
			let server = serve_jwks(1).await;
			let verifier = verifier(&server);

			for _ in 0..3 {
				let claims = verifier
					.verify(&rs256(&claims("user_ann"), Some(KID)))
					.await
					.unwrap();
				assert_eq!(claims.sub, "user_ann");
			}
		}

		#[tokio::test]
		async fn unknown_kid_is_rejected_after_refetch() {
			let server = serve_jwks(1).await;
			let result = verifier(&server)
				.verify(&rs256(&claims("user_ann"), Some("ins_rotated")))
				.await;
			assert_eq!(result, Err(AuthError::KeyNotFound("ins_rotated".to_string())));
		}

		#[tokio::test]
		async fn unknown_kids_do_not_refetch_within_interval() {
			let server = serve_jwks(1).await;
			let verifier = verifier(&server);

			for i in 0..20 {
				let kid = format!("ins_bogus_{i}");
				let result = verifier.verify(&rs256(&claims("user_ann"), Some(&kid))).await;
				assert_eq!(result, Err(AuthError::KeyNotFound(kid)));
			}

			let claims = verifier
				.verify(&rs256(&claims("user_ann"), Some(KID)))
				.await
				.unwrap();
			assert_eq!(claims.sub, "user_ann");
		}

		#[tokio::test]
		async fn unknown_kid_refetches_once_interval_elapsed() {
			let server = serve_jwks(2).await;
			let verifier = verifier(&server).with_refresh_interval(Duration::ZERO);

			for kid in ["ins_rotated_a", "ins_rotated_b"] {
				let result = verifier.verify(&rs256(&claims("user_ann"), Some(kid))).await;
				assert!(matches!(result, Err(AuthError::KeyNotFound(_))));
			}
		}

		#[tokio::test]
		async fn failed_fetch_also_starts_interval() {
			let server = MockServer::start().await;
			Mock::given(method("GET"))
				.and(path("/v1/jwks"))
				.respond_with(ResponseTemplate::new(503))
				.expect(1)
				.mount(&server)
				.await;
			let verifier = verifier(&server);

			let first = verifier.verify(&rs256(&claims("user_ann"), Some("ins_a"))).await;
			assert!(matches!(first, Err(AuthError::JwksFetch(_))));
			let second = verifier.verify(&rs256(&claims("user_ann"), Some("ins_b"))).await;
			assert_eq!(second, Err(AuthError::KeyNotFound("ins_b".to_string())));
		}

		#[tokio::test]
		async fn token_without_kid_is_rejected_without_fetching() {
			let server = serve_jwks(0).await;
			let result = verifier(&server).verify(&rs256(&claims("user_ann"), None)).await;
			assert!(matches!(result, Err(AuthError::InvalidToken(_))));
		}

		#[tokio::test]
		async fn endpoint_failure_is_internal() {
			let server = MockServer::start().await;
			Mock::given(method("GET"))
				.and(path("/v1/jwks"))
				.respond_with(ResponseTemplate::new(503))
				.mount(&server)
				.await;

			let err = verifier(&server)
				.verify(&rs256(&claims("user_ann"), Some(KID)))
				.await
				.unwrap_err();
			assert!(matches!(err, AuthError::JwksFetch(_)));
			assert!(err.is_internal());
		}

		#[tokio::test]
		async fn refresh_reports_usable_key_count() {
			let server = serve_jwks(1).await;
			assert_eq!(verifier(&server).refresh().await.unwrap(), 1);
		}
	}
}
