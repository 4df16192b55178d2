// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Current user profile routes.

use axum::{
	extract::{rejection::JsonRejection, State},
	Json,
};
use chrono::{DateTime, Utc};
use seat_server_auth::User;
use seat_server_identity::ProfileUpdate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{api::AppState, auth_middleware::RequireAuth, error::ServerError};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
	pub id: String,
	pub external_user_id: String,
	pub email: String,
	pub name: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub avatar_url: Option<String>,
	/// `email`, `google` or `unknown`.
	pub primary_auth_provider: String,
	/// `public`, `friends` or `private`.
	pub default_privacy_setting: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub last_login_at: Option<DateTime<Utc>>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
	fn from(user: User) -> Self {
		Self {
			id: user.id.to_string(),
			external_user_id: user.external_user_id,
			email: user.email,
			name: user.name,
			avatar_url: user.avatar_url,
			primary_auth_provider: user.primary_auth_provider.to_string(),
			default_privacy_setting: user.default_privacy_setting.to_string(),
			last_login_at: user.last_login_at,
			created_at: user.created_at,
			updated_at: user.updated_at,
		}
	}
}

/// Fields the user may change. Omitted fields are left untouched.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
	pub name: Option<String>,
	/// An empty string removes the avatar.
	pub avatar_url: Option<String>,
	/// `public`, `friends` or `private`.
	pub default_privacy_setting: Option<String>,
}

impl From<UpdateProfileRequest> for ProfileUpdate {
	fn from(req: UpdateProfileRequest) -> Self {
		Self {
			name: req.name,
			avatar_url: req.avatar_url,
			default_privacy_setting: req.default_privacy_setting,
		}
	}
}

#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "The authenticated user", body = UserResponse),
        (status = 401, description = "Missing or invalid session token", body = crate::error::ErrorResponse),
        (status = 404, description = "No local user for this session", body = crate::error::ErrorResponse)
    ),
    tag = "users"
)]
/// GET /api/users/me - Current user profile. Records the login time.
pub async fn get_current_user(
	State(state): State<AppState>,
	RequireAuth(claims): RequireAuth,
) -> Result<Json<UserResponse>, ServerError> {
	let user = state.profile_service.current_user(&claims.sub).await?;
	state.profile_service.touch_last_login(&user).await;
	Ok(Json(UserResponse::from(user)))
}

#[utoipa::path(
    put,
    path = "/api/users/me",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserResponse),
        (status = 400, description = "Invalid field value", body = crate::error::ErrorResponse),
        (status = 401, description = "Missing or invalid session token", body = crate::error::ErrorResponse),
        (status = 404, description = "No local user for this session", body = crate::error::ErrorResponse),
        (status = 409, description = "Conflicts with another user", body = crate::error::ErrorResponse)
    ),
    tag = "users"
)]
/// PUT /api/users/me - Update name, avatar or default privacy.
pub async fn update_current_user(
	State(state): State<AppState>,
	RequireAuth(claims): RequireAuth,
	payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<Json<UserResponse>, ServerError> {
	let Json(payload) = payload.map_err(|e| ServerError::BadRequest(e.body_text()))?;

	let user = state
		.profile_service
		.update_profile(&claims.sub, payload.into())
		.await?;
	Ok(Json(UserResponse::from(user)))
}
