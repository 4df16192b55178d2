// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Secret loading from environment variables.
//!
//! Every secret `VAR` may instead be provided as a file path in `VAR_FILE`
//! (Docker and Kubernetes secret mounts). The file wins when both are set.
//! Empty values count as unset, so `CLERK_WEBHOOK_SECRET=` in a `.env`
//! template behaves like a missing secret rather than an empty key.

use std::path::PathBuf;
use std::{env, fs};

use thiserror::Error;

use crate::secret::SecretString;

#[derive(Debug, Error)]
pub enum SecretEnvError {
	#[error("failed to read secret file at {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("secret file path in {var} is empty")]
	EmptyPath { var: String },
}

/// Load `var` from `{var}_FILE` or `{var}`, in that order.
///
/// A single trailing newline is stripped from file contents. Returns
/// `Ok(None)` when neither variable carries a non-blank value.
pub fn load_secret_env(var: &str) -> Result<Option<SecretString>, SecretEnvError> {
	let file_var = format!("{var}_FILE");

	if let Ok(path_str) = env::var(&file_var) {
		if path_str.is_empty() {
			return Err(SecretEnvError::EmptyPath { var: file_var });
		}

		let path = PathBuf::from(&path_str);
		let content = fs::read_to_string(&path).map_err(|source| SecretEnvError::Io {
			path: path.clone(),
			source,
		})?;

		let value = content.strip_suffix('\n').unwrap_or(&content);
		return Ok(non_blank(value));
	}

	match env::var(var) {
		Ok(value) => Ok(non_blank(&value)),
		Err(_) => Ok(None),
	}
}

/// Load the first secret found among `vars`, checked in order.
///
/// Used where a namespaced variable (`SEAT_SERVER_CLERK_WEBHOOK_SECRET`) has a
/// conventional provider fallback (`CLERK_WEBHOOK_SECRET`).
pub fn load_first_secret_env(vars: &[&str]) -> Result<Option<SecretString>, SecretEnvError> {
	for var in vars {
		if let Some(secret) = load_secret_env(var)? {
			return Ok(Some(secret));
		}
	}
	Ok(None)
}

fn non_blank(value: &str) -> Option<SecretString> {
	if value.trim().is_empty() {
		None
	} else {
		Some(SecretString::new(value.to_string()))
	}
}
