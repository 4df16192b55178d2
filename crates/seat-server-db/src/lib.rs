// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SQLite persistence for seat users.
//!
//! The [`UserStore`] trait is the seam the identity and HTTP layers depend
//! on; [`UserRepository`] is its sqlx implementation.

pub mod error;
pub mod migrations;
pub mod pool;
pub mod testing;
pub mod user;

pub use error::{DbError, Result};
pub use migrations::run_migrations;
pub use pool::create_pool;
pub use user::{clamp_pagination, UserRepository, UserStore, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
