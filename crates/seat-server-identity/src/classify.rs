// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use seat_server_auth::AuthProvider;

use crate::event::UserSnapshot;

pub const GOOGLE_OAUTH_PROVIDER: &str = "oauth_google";

/// Infer how the user primarily signs in.
///
/// Only the first linked external account is considered: `oauth_google`
/// maps to [`AuthProvider::Google`], anything else to
/// [`AuthProvider::Unknown`]. Without external accounts a password login
/// means [`AuthProvider::Email`].
pub fn classify(snapshot: &UserSnapshot) -> AuthProvider {
	if let Some(account) = snapshot.external_accounts.first() {
		return if account.provider == GOOGLE_OAUTH_PROVIDER {
			AuthProvider::Google
		} else {
			AuthProvider::Unknown
		};
	}

	if snapshot.password_enabled {
		AuthProvider::Email
	} else {
		AuthProvider::Unknown
	}
}
