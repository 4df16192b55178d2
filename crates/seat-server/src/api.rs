// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Router and shared application state.

use std::sync::Arc;
use std::time::Duration;

use axum::{
	http::{header, HeaderValue, Method},
	routing::{get, post},
	Json, Router,
};
use seat_common_webhook::{WebhookError, WebhookSecret, WebhookVerifier};
use seat_server_auth::{
	AuthError, JwksSessionVerifier, JwtSessionVerifier, SessionPolicy, SessionVerifier,
};
use seat_server_config::{CorsConfig, IdentityConfig, SessionKeySource};
use seat_server_db::UserRepository;
use seat_server_identity::{IdentitySync, ProfileService};
use sqlx::sqlite::SqlitePool;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;

use crate::{api_docs::ApiDoc, routes};

/// Shared state for every handler.
///
/// Verifiers are optional so a misconfigured deployment answers with 500
/// instead of accepting unverified input.
#[derive(Clone)]
pub struct AppState {
	pub user_repo: Arc<UserRepository>,
	pub identity_sync: IdentitySync,
	pub profile_service: ProfileService,
	pub webhook_verifier: Option<Arc<WebhookVerifier>>,
	pub session_verifier: Option<Arc<dyn SessionVerifier>>,
}

impl AppState {
	/// State over `pool` with no verifiers installed.
	pub fn new(pool: SqlitePool) -> Self {
		let user_repo = Arc::new(UserRepository::new(pool));
		Self {
			identity_sync: IdentitySync::new(user_repo.clone()),
			profile_service: ProfileService::new(user_repo.clone()),
			user_repo,
			webhook_verifier: None,
			session_verifier: None,
		}
	}

	pub fn with_webhook_verifier(mut self, verifier: WebhookVerifier) -> Self {
		self.webhook_verifier = Some(Arc::new(verifier));
		self
	}

	pub fn with_session_verifier(mut self, verifier: Arc<dyn SessionVerifier>) -> Self {
		self.session_verifier = Some(verifier);
		self
	}
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
	#[error("invalid webhook configuration: {0}")]
	Webhook(#[from] WebhookError),

	#[error("invalid session key configuration: {0}")]
	Session(#[from] AuthError),
}

/// Build the full application state from resolved identity configuration.
pub fn create_app_state(
	pool: SqlitePool,
	identity: &IdentityConfig,
) -> Result<AppState, StateError> {
	let state = AppState::new(pool)
		.with_webhook_verifier(webhook_verifier_from_config(identity)?)
		.with_session_verifier(session_verifier_from_config(identity)?);
	Ok(state)
}

pub fn webhook_verifier_from_config(
	identity: &IdentityConfig,
) -> Result<WebhookVerifier, WebhookError> {
	let secrets = identity
		.webhook_secrets
		.iter()
		.map(|s| WebhookSecret::parse(s.expose()))
		.collect::<Result<Vec<_>, _>>()?;

	Ok(WebhookVerifier::with_secrets(secrets)?
		.with_tolerance(Duration::from_secs(identity.webhook_tolerance_secs)))
}

pub fn session_verifier_from_config(
	identity: &IdentityConfig,
) -> Result<Arc<dyn SessionVerifier>, AuthError> {
	let policy =
		SessionPolicy::default().with_authorized_parties(identity.authorized_parties.clone());

	let verifier: Arc<dyn SessionVerifier> = match &identity.session_keys {
		SessionKeySource::Pem(pem) => {
			Arc::new(JwtSessionVerifier::from_rsa_pem(pem.expose(), policy)?)
		}
		SessionKeySource::Jwks { url, secret_key } => {
			Arc::new(JwksSessionVerifier::new(url.clone(), secret_key.clone(), policy)?)
		}
	};
	Ok(verifier)
}

/// CORS for the browser frontend.
///
/// Only the configured frontend origin is allowed, with credentials. Without
/// one no origin is allowed and browsers stay same-origin.
pub fn cors_layer(config: &CorsConfig) -> Result<CorsLayer, header::InvalidHeaderValue> {
	let layer = CorsLayer::new()
		.allow_methods([
			Method::GET,
			Method::POST,
			Method::PUT,
			Method::PATCH,
			Method::DELETE,
			Method::OPTIONS,
		])
		.allow_headers([header::ORIGIN, header::CONTENT_TYPE, header::AUTHORIZATION])
		.expose_headers([header::CONTENT_LENGTH]);

	Ok(match &config.frontend_url {
		Some(url) => layer
			.allow_origin(HeaderValue::from_str(url)?)
			.allow_credentials(true),
		None => layer,
	})
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
	Json(ApiDoc::openapi())
}

pub fn create_router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(routes::health::health_check))
		.route("/api/openapi.json", get(openapi_json))
		.route("/api/webhooks/clerk", post(routes::webhooks::clerk_webhook))
		.route(
			"/api/users/me",
			get(routes::users::get_current_user).put(routes::users::update_current_user),
		)
		.with_state(state)
}

#[cfg(test)]
mod tests {
	use super::*;
	use seat_common_config::SecretString;

	fn identity(keys: SessionKeySource) -> IdentityConfig {
		IdentityConfig {
			webhook_secrets: vec![SecretString::from("whsec_MfKQ9r8GKYqrTwjUPD8ILPZIo2LaLaSw")],
			webhook_tolerance_secs: 120,
			session_keys: keys,
			authorized_parties: Vec::new(),
		}
	}

	#[test]
	fn webhook_verifier_uses_configured_tolerance() {
		let config = identity(SessionKeySource::Jwks {
			url: "https://api.clerk.com/v1/jwks".to_string(),
			secret_key: SecretString::from("sk_test_123"),
		});

		let verifier = webhook_verifier_from_config(&config).unwrap();
		assert_eq!(verifier.tolerance(), Duration::from_secs(120));
	}

	#[test]
	fn bad_webhook_secret_is_rejected() {
		let mut config = identity(SessionKeySource::Jwks {
			url: "https://api.clerk.com/v1/jwks".to_string(),
			secret_key: SecretString::from("sk_test_123"),
		});
		config.webhook_secrets = vec![SecretString::from("whsec_!!!not-base64!!!")];

		assert!(webhook_verifier_from_config(&config).is_err());
	}

	#[test]
	fn bad_pem_is_rejected() {
		let config = identity(SessionKeySource::Pem(SecretString::from("not a pem")));
		assert!(session_verifier_from_config(&config).is_err());
	}

	#[test]
	fn cors_accepts_frontend_origin() {
		let config = CorsConfig {
			frontend_url: Some("https://seat.example.com".to_string()),
		};
		assert!(cors_layer(&config).is_ok());
		assert!(cors_layer(&CorsConfig::default()).is_ok());
	}
}
