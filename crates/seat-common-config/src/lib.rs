// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Configuration primitives shared across the seat workspace.
//!
//! - [`Secret<T>`]: holds webhook signing keys, provider API keys and token
//!   verification material without ever printing them
//! - [`load_secret_env`] / [`load_first_secret_env`]: read secrets from the
//!   environment, honouring the `*_FILE` convention used by container
//!   orchestrators

pub mod env;
pub mod secret;

pub use env::{load_first_secret_env, load_secret_env, SecretEnvError};
pub use secret::{Secret, SecretString, REDACTED};
