// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Seat identity server binary.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use seat_server::{cors_layer, create_app_state, create_router};
use seat_server_config::LogFormat;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Seat server - identity sync and profile API.
#[derive(Parser, Debug)]
#[command(name = "seat-server", about = "Seat identity server", version)]
struct Args {
	/// TOML config file, replacing /etc/seat/server.toml
	#[arg(long, env = "SEAT_SERVER_CONFIG")]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Show version information
	Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	if let Some(Command::Version) = args.command {
		println!("seat-server version: {}", env!("CARGO_PKG_VERSION"));
		return Ok(());
	}

	// Load .env file if present
	dotenvy::dotenv().ok();

	let config = match &args.config {
		Some(path) => seat_server_config::load_config_with_file(path)?,
		None => seat_server_config::load_config()?,
	};

	let filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| config.logging.level.clone().into());
	let registry = tracing_subscriber::registry().with(filter);
	match config.logging.format {
		LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
		LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
	}

	tracing::info!(
			host = %config.http.host,
			port = config.http.port,
			database = %config.database.url,
			"starting seat-server"
	);

	let pool = seat_server_db::create_pool(&config.database.url).await?;
	seat_server_db::run_migrations(&pool).await?;

	let state = create_app_state(pool, &config.identity)?;
	let cors = cors_layer(&config.cors).context("invalid frontend URL for CORS")?;

	let app = create_router(state)
		.layer(TraceLayer::new_for_http())
		.layer(cors);

	let addr = config.socket_addr();
	tracing::info!("listening on {}", addr);

	let listener = tokio::net::TcpListener::bind(&addr).await?;

	tokio::select! {
		result = axum::serve(listener, app) => {
			if let Err(e) = result {
				tracing::error!(error = %e, "Server error");
			}
		}
		_ = tokio::signal::ctrl_c() => {
			tracing::info!("Received shutdown signal");
		}
	}

	tracing::info!("Server shutdown complete");
	Ok(())
}
