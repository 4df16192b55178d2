// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Layered configuration for the seat server.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`SEAT_SERVER_*`)
//!
//! # Usage
//!
//! ```ignore
//! use seat_server_config::load_config;
//!
//! let config = load_config()?;
//! println!("Server listening on {}", config.socket_addr());
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::ServerConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use seat_common_config::{load_first_secret_env, SecretString};
use tracing::{debug, info};

/// Fully resolved server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
	pub http: HttpConfig,
	pub database: DatabaseConfig,
	pub cors: CorsConfig,
	pub identity: IdentityConfig,
	pub logging: LoggingConfig,
}

impl ServerConfig {
	/// Get the socket address string for binding.
	pub fn socket_addr(&self) -> String {
		format!("{}:{}", self.http.host, self.http.port)
	}
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`SEAT_SERVER_*`)
/// 2. Config file (`/etc/seat/server.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

/// Load configuration from environment only (for testing or simple deployments).
pub fn load_config_from_env() -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![Box::new(EnvSource)])
}

fn load_from_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<ServerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ServerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config, pulling secrets from
/// the environment.
fn finalize(layer: ServerConfigLayer) -> Result<ServerConfig, ConfigError> {
	let secrets = IdentitySecrets {
		webhook_secret: secret_env(&["SEAT_SERVER_CLERK_WEBHOOK_SECRET", "CLERK_WEBHOOK_SECRET"])?,
		previous_webhook_secret: secret_env(&["SEAT_SERVER_CLERK_WEBHOOK_PREVIOUS_SECRET"])?,
		jwt_key: secret_env(&["SEAT_SERVER_CLERK_JWT_KEY", "CLERK_JWT_KEY"])?,
		secret_key: secret_env(&["SEAT_SERVER_CLERK_SECRET_KEY", "CLERK_SECRET_KEY"])?,
	};

	resolve(layer, secrets)
}

fn secret_env(vars: &[&str]) -> Result<Option<SecretString>, ConfigError> {
	load_first_secret_env(vars).map_err(|e| ConfigError::Secret(e.to_string()))
}

fn resolve(layer: ServerConfigLayer, secrets: IdentitySecrets) -> Result<ServerConfig, ConfigError> {
	let http = layer.http.unwrap_or_default().finalize();
	let database = layer.database.unwrap_or_default().finalize()?;
	let cors = layer.cors.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();
	let identity = layer.identity.unwrap_or_default().finalize(secrets)?;

	validate_config(&cors)?;

	info!(
		host = %http.host,
		port = http.port,
		database = %database.url,
		frontend_url = cors.frontend_url.as_deref().unwrap_or("-"),
		webhook_secrets = identity.webhook_secrets.len(),
		session_keys = match identity.session_keys {
			SessionKeySource::Pem(_) => "pem",
			SessionKeySource::Jwks { .. } => "jwks",
		},
		log_format = %logging.format,
		"Server configuration loaded"
	);

	Ok(ServerConfig {
		http,
		database,
		cors,
		identity,
		logging,
	})
}

/// Validate cross-field configuration rules.
fn validate_config(cors: &CorsConfig) -> Result<(), ConfigError> {
	if let Some(origin) = &cors.frontend_url {
		if !(origin.starts_with("http://") || origin.starts_with("https://")) {
			return Err(ConfigError::Validation(format!(
				"SEAT_SERVER_FRONTEND_URL must be an http(s) origin, got '{origin}'"
			)));
		}
	}

	Ok(())
}
