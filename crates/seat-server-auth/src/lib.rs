// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Users and authentication for the seat server.
//!
//! - [`types`]: identifier newtypes and the small enums stored on a user
//! - [`user`]: the locally owned [`User`] record mirrored from the identity
//!   provider
//! - [`session`]: verification of provider-issued session tokens, either
//!   against a static key or the provider's JWKS endpoint
//! - [`middleware`]: request header helpers

pub mod error;
pub mod middleware;
pub mod session;
pub mod types;
pub mod user;

pub use error::AuthError;
pub use middleware::extract_bearer_token;
pub use session::{
	JwksSessionVerifier, JwtSessionVerifier, SessionClaims, SessionPolicy, SessionVerifier,
	DEFAULT_JWKS_REFRESH_INTERVAL, DEFAULT_LEEWAY_SECS,
};
pub use types::{AuthProvider, ParseEnumError, PrivacySetting, UserId};
pub use user::User;
