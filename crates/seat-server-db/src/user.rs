// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! User repository for database operations.
//!
//! Rows are never hard-deleted. A non-null `deleted_at` hides the row from
//! every lookup here, and the partial unique indexes on `external_user_id`
//! and `email` only cover active rows, so a deleted user can sign up again.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use seat_server_auth::{AuthProvider, PrivacySetting, User, UserId};
use sqlx::{sqlite::SqlitePool, Row};

use crate::error::DbError;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

const USER_COLUMNS: &str = "id, external_user_id, email, name, avatar_url, primary_auth_provider, \
	default_privacy_setting, last_login_at, created_at, updated_at, deleted_at";

#[async_trait]
pub trait UserStore: Send + Sync {
	async fn create_user(&self, user: &User) -> Result<(), DbError>;
	async fn get_user_by_external_id(&self, external_user_id: &str)
		-> Result<Option<User>, DbError>;
	async fn get_user_by_id(&self, id: &UserId) -> Result<Option<User>, DbError>;
	async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DbError>;
	async fn update_user(&self, user: &User) -> Result<(), DbError>;
	async fn update_last_login(&self, id: &UserId) -> Result<(), DbError>;
	async fn soft_delete_user(&self, id: &UserId) -> Result<(), DbError>;
	async fn list_users(&self, limit: i64, offset: i64) -> Result<Vec<User>, DbError>;
}

/// Normalise caller supplied paging: a limit outside `1..=100` becomes 20,
/// a negative offset becomes 0.
pub fn clamp_pagination(limit: i64, offset: i64) -> (i64, i64) {
	let limit = if limit <= 0 || limit > MAX_PAGE_SIZE {
		DEFAULT_PAGE_SIZE
	} else {
		limit
	};
	(limit, offset.max(0))
}

/// Repository for user database operations.
///
/// IDs are ULIDs and timestamps RFC3339 strings, both stored as TEXT.
#[derive(Clone)]
pub struct UserRepository {
	pool: SqlitePool,
}

impl UserRepository {
	/// Create a new repository with the given pool.
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	pub fn pool(&self) -> &SqlitePool {
		&self.pool
	}

	/// Insert a new user exactly as given.
	///
	/// # Errors
	/// Returns `DbError::Conflict` if an active user already has this external
	/// id or email.
	#[tracing::instrument(skip(self, user), fields(user_id = %user.id, external_user_id = %user.external_user_id))]
	pub async fn create_user(&self, user: &User) -> Result<(), DbError> {
		sqlx::query(
			r#"
			INSERT INTO users (id, external_user_id, email, name, avatar_url, primary_auth_provider,
				default_privacy_setting, last_login_at, created_at, updated_at, deleted_at)
			VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(user.id.to_string())
		.bind(&user.external_user_id)
		.bind(&user.email)
		.bind(&user.name)
		.bind(&user.avatar_url)
		.bind(user.primary_auth_provider.as_str())
		.bind(user.default_privacy_setting.as_str())
		.bind(user.last_login_at.map(|d| d.to_rfc3339()))
		.bind(user.created_at.to_rfc3339())
		.bind(user.updated_at.to_rfc3339())
		.bind(user.deleted_at.map(|d| d.to_rfc3339()))
		.execute(&self.pool)
		.await
		.map_err(|e| map_unique_violation(e, "user with this external id or email already exists"))?;

		tracing::debug!(user_id = %user.id, "user created");
		Ok(())
	}

	/// Get an active user by the identity provider's id.
	#[tracing::instrument(skip(self))]
	pub async fn get_user_by_external_id(
		&self,
		external_user_id: &str,
	) -> Result<Option<User>, DbError> {
		let row = sqlx::query(&format!(
			"SELECT {USER_COLUMNS} FROM users WHERE external_user_id = ? AND deleted_at IS NULL"
		))
		.bind(external_user_id)
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_user(&r)).transpose()
	}

	/// Get an active user by local id.
	#[tracing::instrument(skip(self), fields(user_id = %id))]
	pub async fn get_user_by_id(&self, id: &UserId) -> Result<Option<User>, DbError> {
		let row = sqlx::query(&format!(
			"SELECT {USER_COLUMNS} FROM users WHERE id = ? AND deleted_at IS NULL"
		))
		.bind(id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_user(&r)).transpose()
	}

	/// Get an active user by email.
	#[tracing::instrument(skip(self, email))]
	pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
		let row = sqlx::query(&format!(
			"SELECT {USER_COLUMNS} FROM users WHERE email = ? AND deleted_at IS NULL"
		))
		.bind(email)
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_user(&r)).transpose()
	}

	/// Overwrite every mutable column of an active user.
	///
	/// `id` and `created_at` are never written. `updated_at` is stored as
	/// given, so callers stamp it.
	///
	/// # Errors
	/// Returns `DbError::NotFound` if the user is missing or soft-deleted, and
	/// `DbError::Conflict` if the new external id or email is taken.
	#[tracing::instrument(skip(self, user), fields(user_id = %user.id))]
	pub async fn update_user(&self, user: &User) -> Result<(), DbError> {
		let result = sqlx::query(
			r#"
			UPDATE users
			SET external_user_id = ?, email = ?, name = ?, avatar_url = ?, primary_auth_provider = ?,
				default_privacy_setting = ?, last_login_at = ?, updated_at = ?
			WHERE id = ? AND deleted_at IS NULL
			"#,
		)
		.bind(&user.external_user_id)
		.bind(&user.email)
		.bind(&user.name)
		.bind(&user.avatar_url)
		.bind(user.primary_auth_provider.as_str())
		.bind(user.default_privacy_setting.as_str())
		.bind(user.last_login_at.map(|d| d.to_rfc3339()))
		.bind(user.updated_at.to_rfc3339())
		.bind(user.id.to_string())
		.execute(&self.pool)
		.await
		.map_err(|e| map_unique_violation(e, "another user already has this external id or email"))?;

		if result.rows_affected() == 0 {
			return Err(DbError::NotFound(format!("user {}", user.id)));
		}

		tracing::debug!(user_id = %user.id, "user updated");
		Ok(())
	}

	/// Stamp `last_login_at` (and `updated_at`) with the current time.
	#[tracing::instrument(skip(self), fields(user_id = %id))]
	pub async fn update_last_login(&self, id: &UserId) -> Result<(), DbError> {
		let now = Utc::now().to_rfc3339();
		let result = sqlx::query(
			r#"
			UPDATE users
			SET last_login_at = ?, updated_at = ?
			WHERE id = ? AND deleted_at IS NULL
			"#,
		)
		.bind(&now)
		.bind(&now)
		.bind(id.to_string())
		.execute(&self.pool)
		.await?;

		if result.rows_affected() == 0 {
			return Err(DbError::NotFound(format!("user {id}")));
		}

		tracing::debug!(user_id = %id, "last login updated");
		Ok(())
	}

	/// Soft-delete an active user.
	#[tracing::instrument(skip(self), fields(user_id = %id))]
	pub async fn soft_delete_user(&self, id: &UserId) -> Result<(), DbError> {
		let now = Utc::now().to_rfc3339();
		let result = sqlx::query(
			r#"
			UPDATE users
			SET deleted_at = ?, updated_at = ?
			WHERE id = ? AND deleted_at IS NULL
			"#,
		)
		.bind(&now)
		.bind(&now)
		.bind(id.to_string())
		.execute(&self.pool)
		.await?;

		if result.rows_affected() == 0 {
			return Err(DbError::NotFound(format!("user {id}")));
		}

		tracing::debug!(user_id = %id, "user soft-deleted");
		Ok(())
	}

	/// List active users, newest first. Arguments go through
	/// [`clamp_pagination`].
	#[tracing::instrument(skip(self))]
	pub async fn list_users(&self, limit: i64, offset: i64) -> Result<Vec<User>, DbError> {
		let (limit, offset) = clamp_pagination(limit, offset);
		let rows = sqlx::query(&format!(
			"SELECT {USER_COLUMNS} FROM users WHERE deleted_at IS NULL \
			 ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
		))
		.bind(limit)
		.bind(offset)
		.fetch_all(&self.pool)
		.await?;

		rows.iter().map(row_to_user).collect()
	}
}

#[async_trait]
impl UserStore for UserRepository {
	async fn create_user(&self, user: &User) -> Result<(), DbError> {
		self.create_user(user).await
	}

	async fn get_user_by_external_id(
		&self,
		external_user_id: &str,
	) -> Result<Option<User>, DbError> {
		self.get_user_by_external_id(external_user_id).await
	}

	async fn get_user_by_id(&self, id: &UserId) -> Result<Option<User>, DbError> {
		self.get_user_by_id(id).await
	}

	async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
		self.get_user_by_email(email).await
	}

	async fn update_user(&self, user: &User) -> Result<(), DbError> {
		self.update_user(user).await
	}

	async fn update_last_login(&self, id: &UserId) -> Result<(), DbError> {
		self.update_last_login(id).await
	}

	async fn soft_delete_user(&self, id: &UserId) -> Result<(), DbError> {
		self.soft_delete_user(id).await
	}

	async fn list_users(&self, limit: i64, offset: i64) -> Result<Vec<User>, DbError> {
		self.list_users(limit, offset).await
	}
}

fn map_unique_violation(err: sqlx::Error, message: &str) -> DbError {
	match err {
		sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
			DbError::Conflict(message.to_string())
		}
		other => DbError::Sqlx(other),
	}
}

fn parse_timestamp(value: &str, column: &str) -> Result<DateTime<Utc>, DbError> {
	DateTime::parse_from_rfc3339(value)
		.map(|dt| dt.with_timezone(&Utc))
		.map_err(|e| DbError::Internal(format!("Invalid {column}: {e}")))
}

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User, DbError> {
	let id: String = row.get("id");
	let provider: String = row.get("primary_auth_provider");
	let privacy: String = row.get("default_privacy_setting");
	let last_login_at: Option<String> = row.get("last_login_at");
	let created_at: String = row.get("created_at");
	let updated_at: String = row.get("updated_at");
	let deleted_at: Option<String> = row.get("deleted_at");

	Ok(User {
		id: id
			.parse::<UserId>()
			.map_err(|e| DbError::Internal(format!("Invalid user ID: {e}")))?,
		external_user_id: row.get("external_user_id"),
		email: row.get("email"),
		name: row.get("name"),
		avatar_url: row.get("avatar_url"),
		primary_auth_provider: provider
			.parse::<AuthProvider>()
			.map_err(|e| DbError::Internal(e.to_string()))?,
		default_privacy_setting: privacy
			.parse::<PrivacySetting>()
			.map_err(|e| DbError::Internal(e.to_string()))?,
		last_login_at: last_login_at
			.as_deref()
			.map(|v| parse_timestamp(v, "last_login_at"))
			.transpose()?,
		created_at: parse_timestamp(&created_at, "created_at")?,
		updated_at: parse_timestamp(&updated_at, "updated_at")?,
		deleted_at: deleted_at
			.as_deref()
			.map(|v| parse_timestamp(v, "deleted_at"))
			.transpose()?,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::create_test_pool;
	use proptest::prelude::*;

	async fn make_repo() -> UserRepository {
		UserRepository::new(create_test_pool().await)
	}

	fn make_user(external_id: &str, email: &str) -> User {
		User::new(
			external_id,
			email,
			"Test User",
			Some("https://img.example.com/a.png".to_string()),
			AuthProvider::Email,
		)
	}

	#[tokio::test]
	async fn create_then_get_round_trips_every_field() {
		let repo = make_repo().await;
		let user = make_user("user_ann", "ann@example.com");
		repo.create_user(&user).await.unwrap();

		let fetched = repo.get_user_by_external_id("user_ann").await.unwrap().unwrap();
		assert_eq!(fetched, user);
		assert_eq!(fetched.created_at, fetched.updated_at);
	}

	#[tokio::test]
	async fn lookups_by_id_and_email() {
		let repo = make_repo().await;
		let user = make_user("user_ann", "ann@example.com");
		repo.create_user(&user).await.unwrap();

		assert_eq!(repo.get_user_by_id(&user.id).await.unwrap(), Some(user.clone()));
		assert_eq!(
			repo.get_user_by_email("ann@example.com").await.unwrap(),
			Some(user)
		);
		assert_eq!(repo.get_user_by_email("bob@example.com").await.unwrap(), None);
	}

	#[tokio::test]
	async fn missing_user_is_none_not_error() {
		let repo = make_repo().await;
		assert!(repo.get_user_by_external_id("user_ghost").await.unwrap().is_none());
		assert!(repo.get_user_by_id(&UserId::generate()).await.unwrap().is_none());
	}

	#[tokio::test]
	async fn duplicate_external_id_conflicts() {
		let repo = make_repo().await;
		repo.create_user(&make_user("user_ann", "ann@example.com")).await.unwrap();

		let result = repo.create_user(&make_user("user_ann", "other@example.com")).await;
		assert!(matches!(result, Err(DbError::Conflict(_))));
	}

	#[tokio::test]
	async fn duplicate_email_conflicts() {
		let repo = make_repo().await;
		repo.create_user(&make_user("user_ann", "ann@example.com")).await.unwrap();

		let result = repo.create_user(&make_user("user_ann2", "ann@example.com")).await;
		assert!(matches!(result, Err(DbError::Conflict(_))));
	}

	#[tokio::test]
	async fn update_persists_mutable_fields() {
		let repo = make_repo().await;
		let mut user = make_user("user_ann", "ann@example.com");
		repo.create_user(&user).await.unwrap();

		user.email = "ann.lee@example.com".to_string();
		user.name = "Ann Lee".to_string();
		user.avatar_url = None;
		user.primary_auth_provider = AuthProvider::Google;
		user.default_privacy_setting = PrivacySetting::Friends;
		user.updated_at = Utc::now();
		repo.update_user(&user).await.unwrap();

		let fetched = repo.get_user_by_id(&user.id).await.unwrap().unwrap();
		assert_eq!(fetched, user);
	}

	#[tokio::test]
	async fn update_to_taken_email_conflicts() {
		let repo = make_repo().await;
		repo.create_user(&make_user("user_ann", "ann@example.com")).await.unwrap();
		let mut bob = make_user("user_bob", "bob@example.com");
		repo.create_user(&bob).await.unwrap();

		bob.email = "ann@example.com".to_string();
		let result = repo.update_user(&bob).await;
		assert!(matches!(result, Err(DbError::Conflict(_))));
	}

	#[tokio::test]
	async fn update_of_missing_user_is_not_found() {
		let repo = make_repo().await;
		let result = repo.update_user(&make_user("user_ghost", "ghost@example.com")).await;
		assert!(matches!(result, Err(DbError::NotFound(_))));
	}

	#[tokio::test]
	async fn update_last_login_sets_timestamp() {
		let repo = make_repo().await;
		let user = make_user("user_ann", "ann@example.com");
		repo.create_user(&user).await.unwrap();

		repo.update_last_login(&user.id).await.unwrap();

		let fetched = repo.get_user_by_id(&user.id).await.unwrap().unwrap();
		assert!(fetched.last_login_at.is_some());
		assert!(fetched.updated_at >= user.updated_at);
	}

	#[tokio::test]
	async fn soft_delete_hides_user_and_frees_unique_keys() {
		let repo = make_repo().await;
		let user = make_user("user_ann", "ann@example.com");
		repo.create_user(&user).await.unwrap();

		repo.soft_delete_user(&user.id).await.unwrap();

		assert!(repo.get_user_by_id(&user.id).await.unwrap().is_none());
		assert!(repo.get_user_by_external_id("user_ann").await.unwrap().is_none());
		assert!(repo.list_users(20, 0).await.unwrap().is_empty());

		let row_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
			.fetch_one(repo.pool())
			.await
			.unwrap();
		assert_eq!(row_count, 1);

		repo.create_user(&make_user("user_ann", "ann@example.com")).await.unwrap();
	}

	#[tokio::test]
	async fn soft_delete_twice_is_not_found() {
		let repo = make_repo().await;
		let user = make_user("user_ann", "ann@example.com");
		repo.create_user(&user).await.unwrap();

		repo.soft_delete_user(&user.id).await.unwrap();
		let result = repo.soft_delete_user(&user.id).await;
		assert!(matches!(result, Err(DbError::NotFound(_))));
	}

	#[tokio::test]
	async fn deleted_user_cannot_be_touched() {
		let repo = make_repo().await;
		let user = make_user("user_ann", "ann@example.com");
		repo.create_user(&user).await.unwrap();
		repo.soft_delete_user(&user.id).await.unwrap();

		assert!(matches!(
			repo.update_last_login(&user.id).await,
			Err(DbError::NotFound(_))
		));
	}

	#[tokio::test]
	async fn list_returns_newest_first_with_paging() {
		let repo = make_repo().await;
		let mut ids = Vec::new();
		for i in 0..5 {
			let user = make_user(&format!("user_{i}"), &format!("u{i}@example.com"));
			ids.push(user.id);
			repo.create_user(&user).await.unwrap();
		}

		let page: Vec<UserId> = repo
			.list_users(2, 1)
			.await
			.unwrap()
			.into_iter()
			.map(|u| u.id)
			.collect();
		assert_eq!(page, vec![ids[3], ids[2]]);
	}

	#[tokio::test]
	async fn list_clamps_bad_arguments() {
		let repo = make_repo().await;
		for i in 0..25 {
			repo.create_user(&make_user(&format!("user_{i}"), &format!("u{i}@example.com")))
				.await
				.unwrap();
		}

		assert_eq!(repo.list_users(0, -5).await.unwrap().len(), 20);
		assert_eq!(repo.list_users(500, 0).await.unwrap().len(), 20);
		assert_eq!(repo.list_users(100, 0).await.unwrap().len(), 25);
	}

	#[test]
	fn clamp_pagination_examples() {
		assert_eq!(clamp_pagination(0, 0), (20, 0));
		assert_eq!(clamp_pagination(-1, -1), (20, 0));
		assert_eq!(clamp_pagination(101, 7), (20, 7));
		assert_eq!(clamp_pagination(1, 0), (1, 0));
		assert_eq!(clamp_pagination(100, 0), (100, 0));
	}

	proptest! {
		/// **Property: clamped paging is always usable**
		///
		/// Why: the values are bound straight into `LIMIT ? OFFSET ?`.
		#[test]
		fn clamped_values_are_in_range(limit in any::<i64>(), offset in any::<i64>()) {
			let (l, o) = clamp_pagination(limit, offset);
			prop_assert!((1..=MAX_PAGE_SIZE).contains(&l));
			prop_assert!(o >= 0);
			if (1..=MAX_PAGE_SIZE).contains(&limit) {
				prop_assert_eq!(l, limit);
			}
		}
	}
}
