// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identity synchronisation between the external identity provider and the
//! local user store.
//!
//! - [`event`]: webhook envelope and user snapshot decoding
//! - [`classify`]: auth provider inference from a snapshot
//! - [`sync`]: the create/update/delete reconciliation engine
//! - [`profile`]: self-service profile reads and updates
//!
//! Signature verification happens before any of this, in
//! `seat-common-webhook`.

pub mod classify;
pub mod error;
pub mod event;
pub mod profile;
pub mod sync;

pub use classify::{classify, GOOGLE_OAUTH_PROVIDER};
pub use error::{Result, SyncError};
pub use event::{display_name, EventKind, UserSnapshot, WebhookEvent};
pub use profile::{ProfileService, ProfileUpdate};
pub use sync::{validate_user, IdentitySync, SyncOutcome};
