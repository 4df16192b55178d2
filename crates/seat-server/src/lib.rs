// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Seat identity server.
//!
//! Receives signed user lifecycle webhooks from the identity provider,
//! mirrors users into SQLite, and serves the authenticated user's profile.

pub mod api;
pub mod api_docs;
pub mod api_response;
pub mod auth_middleware;
pub mod error;
pub mod routes;

pub use api::{create_app_state, create_router, cors_layer, AppState, StateError};
pub use api_docs::ApiDoc;
pub use auth_middleware::RequireAuth;
pub use error::{ErrorResponse, ServerError};
pub use seat_server_config::ServerConfig;
