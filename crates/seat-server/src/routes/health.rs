// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Health HTTP handler.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
	pub status: String,
	pub database: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Server and database are reachable", body = HealthResponse),
        (status = 503, description = "Database is unreachable", body = HealthResponse)
    ),
    tag = "health"
)]
/// GET /health - Liveness plus a database round trip.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
	match sqlx::query("SELECT 1")
		.execute(state.user_repo.pool())
		.await
	{
		Ok(_) => (
			StatusCode::OK,
			Json(HealthResponse {
				status: "ok".to_string(),
				database: "connected".to_string(),
			}),
		),
		Err(e) => {
			tracing::error!(error = %e, "health check database ping failed");
			(
				StatusCode::SERVICE_UNAVAILABLE,
				Json(HealthResponse {
					status: "unavailable".to_string(),
					database: "disconnected".to_string(),
				}),
			)
		}
	}
}
