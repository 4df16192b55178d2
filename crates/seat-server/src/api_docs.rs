// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! OpenAPI documentation for seat-server, served at `/api/openapi.json`.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Seat Server API",
        version = "1.0.0",
        description = "User identity sync and profile API for the seat management app.",
        license(name = "Proprietary")
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    tags(
        (name = "health", description = "Health checks"),
        (name = "webhooks", description = "Identity provider webhooks"),
        (name = "users", description = "User profile management")
    ),
    paths(
        crate::routes::health::health_check,
        crate::routes::webhooks::clerk_webhook,
        crate::routes::users::get_current_user,
        crate::routes::users::update_current_user,
    ),
    components(
        schemas(
            crate::error::ErrorResponse,
            crate::routes::health::HealthResponse,
            crate::routes::webhooks::WebhookResponse,
            crate::routes::users::UserResponse,
            crate::routes::users::UpdateProfileRequest,
        )
    )
)]
pub struct ApiDoc;
