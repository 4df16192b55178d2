// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Cross-origin configuration for the browser frontend.

use serde::Deserialize;

/// CORS configuration (runtime, fully resolved).
///
/// With no frontend origin configured the server sends no CORS headers and
/// browsers fall back to same-origin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorsConfig {
	pub frontend_url: Option<String>,
}

/// CORS configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CorsConfigLayer {
	#[serde(default)]
	pub frontend_url: Option<String>,
}

impl CorsConfigLayer {
	pub fn merge(&mut self, other: CorsConfigLayer) {
		if other.frontend_url.is_some() {
			self.frontend_url = other.frontend_url;
		}
	}

	/// Trailing slashes are dropped since browsers never send them in `Origin`.
	pub fn finalize(self) -> CorsConfig {
		CorsConfig {
			frontend_url: self
				.frontend_url
				.map(|url| url.trim().trim_end_matches('/').to_string())
				.filter(|url| !url.is_empty()),
		}
	}
}
