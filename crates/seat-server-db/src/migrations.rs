// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Embedded schema migrations.

use sqlx::sqlite::SqlitePool;

use crate::error::DbError;

const MIGRATIONS: &[(&str, &str)] = &[(
	"001_create_users",
	include_str!("../migrations/001_create_users.sql"),
)];

/// Apply every embedded migration in order.
///
/// Statements are idempotent (`IF NOT EXISTS`), so this is safe to run on
/// every start.
#[tracing::instrument(skip(pool))]
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), DbError> {
	for (name, sql) in MIGRATIONS {
		for statement in statements(sql) {
			sqlx::query(&statement).execute(pool).await?;
		}
		tracing::debug!(migration = name, "migration applied");
	}
	Ok(())
}

/// Split a migration file into executable statements, dropping `--` comment
/// lines and empty fragments.
fn statements(sql: &str) -> Vec<String> {
	sql.split(';')
		.map(|chunk| {
			chunk
				.lines()
				.filter(|line| !line.trim_start().starts_with("--"))
				.collect::<Vec<_>>()
				.join("\n")
		})
		.filter(|stmt| !stmt.trim().is_empty())
		.collect()
}
