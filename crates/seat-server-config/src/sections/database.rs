// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! User store location.

use serde::Deserialize;

use crate::error::ConfigError;

const DEFAULT_DATABASE_URL: &str = "sqlite:./seat.db";

/// The user store is SQLite only.
const SQLITE_SCHEME: &str = "sqlite:";

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
	/// A `sqlite:` URL. The file is created on first start.
	pub url: String,
}

impl Default for DatabaseConfig {
	fn default() -> Self {
		Self {
			url: DEFAULT_DATABASE_URL.to_string(),
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseConfigLayer {
	#[serde(default)]
	pub url: Option<String>,
}

impl DatabaseConfigLayer {
	pub fn merge(&mut self, other: DatabaseConfigLayer) {
		if other.url.is_some() {
			self.url = other.url;
		}
	}

	/// Resolve the URL, rejecting anything the SQLite pool cannot open.
	pub fn finalize(self) -> Result<DatabaseConfig, ConfigError> {
		let url = match self.url {
			Some(url) => url.trim().to_string(),
			None => return Ok(DatabaseConfig::default()),
		};

		if !url.starts_with(SQLITE_SCHEME) || url.len() == SQLITE_SCHEME.len() {
			return Err(ConfigError::invalid_value(
				"database.url",
				format!("expected a sqlite: URL, got '{url}'"),
			));
		}

		Ok(DatabaseConfig { url })
	}
}
