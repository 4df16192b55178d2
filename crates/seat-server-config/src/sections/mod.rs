// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections. Each has a resolved `*Config` and a partial
//! `*ConfigLayer` that sources produce and merge.

mod cors;
mod database;
mod http;
mod identity;
mod logging;

pub use cors::{CorsConfig, CorsConfigLayer};
pub use database::{DatabaseConfig, DatabaseConfigLayer};
pub use http::{HttpConfig, HttpConfigLayer};
pub use identity::{
	IdentityConfig, IdentityConfigLayer, IdentitySecrets, SessionKeySource, DEFAULT_CLERK_API_URL,
	DEFAULT_WEBHOOK_TOLERANCE_SECS,
};
pub use logging::{LogFormat, LoggingConfig, LoggingConfigLayer, DEFAULT_LOG_LEVEL};
