// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
	body::Body,
	http::{header, Method, Request, StatusCode},
	response::Response,
	Router,
};
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use seat_common_webhook::{sign, WebhookSecret, WebhookVerifier, HEADER_ID, HEADER_SIGNATURE, HEADER_TIMESTAMP};
use seat_server::{create_router, AppState};
use seat_server_auth::{JwtSessionVerifier, SessionClaims, SessionPolicy};
use tempfile::TempDir;
use tower::ServiceExt;

pub const WEBHOOK_KEY: &[u8] = b"seat-test-webhook-signing-key";
pub const SESSION_SECRET: &[u8] = b"seat-test-session-secret";

pub struct TestApp {
	pub router: Router,
	pub state: AppState,
	_temp_dir: TempDir,
}

impl TestApp {
	/// App with both verifiers installed.
	pub async fn new() -> Self {
		Self::build(|state| {
			state
				.with_webhook_verifier(WebhookVerifier::new(WebhookSecret::from_bytes(
					WEBHOOK_KEY.to_vec(),
				)))
				.with_session_verifier(Arc::new(JwtSessionVerifier::from_secret(
					SESSION_SECRET,
					SessionPolicy::default(),
				)))
		})
		.await
	}

	/// App with no verifiers, as if configuration were missing.
	pub async fn unconfigured() -> Self {
		Self::build(|state| state).await
	}

	async fn build(configure: impl FnOnce(AppState) -> AppState) -> Self {
		let temp_dir = tempfile::tempdir().unwrap();
		let db_path = temp_dir.path().join("seat_test.db");
		let db_url = format!("sqlite:{}?mode=rwc", db_path.display());
		let pool = seat_server_db::create_pool(&db_url).await.unwrap();
		seat_server_db::run_migrations(&pool).await.unwrap();

		let state = configure(AppState::new(pool));
		let router = create_router(state.clone());

		Self {
			router,
			state,
			_temp_dir: temp_dir,
		}
	}

	pub async fn send(&self, request: Request<Body>) -> Response {
		self.router.clone().oneshot(request).await.unwrap()
	}

	/// POST a webhook body signed with the test key at the current time.
	pub async fn post_webhook(&self, body: &str) -> Response {
		self.send(signed_webhook_request(body, "msg_test", Utc::now().timestamp()))
			.await
	}

	pub async fn get(&self, path: &str, token: Option<&str>) -> Response {
		self.send(request(Method::GET, path, token, None)).await
	}

	pub async fn put_json(&self, path: &str, token: Option<&str>, body: serde_json::Value) -> Response {
		self.send(request(Method::PUT, path, token, Some(body.to_string())))
			.await
	}
}

pub fn request(method: Method, path: &str, token: Option<&str>, body: Option<String>) -> Request<Body> {
	let mut builder = Request::builder().method(method).uri(path);
	if let Some(token) = token {
		builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
	}
	match body {
		Some(body) => builder
			.header(header::CONTENT_TYPE, "application/json")
			.body(Body::from(body))
			.unwrap(),
		None => builder.body(Body::empty()).unwrap(),
	}
}

pub fn signed_webhook_request(body: &str, msg_id: &str, timestamp: i64) -> Request<Body> {
	let secret = WebhookSecret::from_bytes(WEBHOOK_KEY.to_vec());
	let signature = sign(&secret, msg_id, timestamp, body.as_bytes());

	Request::builder()
		.method(Method::POST)
		.uri("/api/webhooks/clerk")
		.header(header::CONTENT_TYPE, "application/json")
		.header(HEADER_ID, msg_id)
		.header(HEADER_TIMESTAMP, timestamp.to_string())
		.header(HEADER_SIGNATURE, signature)
		.body(Body::from(body.to_string()))
		.unwrap()
}

/// HS256 session token for `sub`, valid for an hour.
pub fn session_token(sub: &str) -> String {
	let now = Utc::now().timestamp();
	let claims = SessionClaims {
		sub: sub.to_string(),
		exp: now + 3600,
		nbf: Some(now - 10),
		iat: Some(now),
		iss: Some("https://clerk.seat.test".to_string()),
		azp: None,
		sid: Some("sess_test".to_string()),
	};
	encode(&Header::default(), &claims, &EncodingKey::from_secret(SESSION_SECRET)).unwrap()
}

pub fn expired_session_token(sub: &str) -> String {
	let now = Utc::now().timestamp();
	let claims = SessionClaims {
		sub: sub.to_string(),
		exp: now - 3600,
		nbf: None,
		iat: Some(now - 7200),
		iss: None,
		azp: None,
		sid: None,
	};
	encode(&Header::default(), &claims, &EncodingKey::from_secret(SESSION_SECRET)).unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
	let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
		.await
		.unwrap();
	serde_json::from_slice(&bytes).unwrap()
}

pub async fn assert_status(response: Response, expected: StatusCode) -> serde_json::Value {
	let status = response.status();
	let body = body_json(response).await;
	assert_eq!(status, expected, "unexpected status, body: {body}");
	body
}

pub fn user_created_body(external_id: &str, email: &str, first_name: &str) -> String {
	serde_json::json!({
		"type": "user.created",
		"object": "event",
		"data": {
			"id": external_id,
			"email_addresses": [{"email_address": email}],
			"first_name": first_name,
			"password_enabled": true,
			"external_accounts": []
		}
	})
	.to_string()
}
