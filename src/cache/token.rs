use serde::{Deserialize, Serialize};

use crate::utils::constants::TOKEN_SAFETY_MARGIN_SECS;

/// Access token with the instant after which it must not be sent anymore.
///
/// Persisted as `{"access_token": "...", "expires_at": <unix seconds>}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedToken {
    pub access_token: String,
    pub expires_at: i64, // UNIX TIMESTAMP
}

impl CachedToken {
    pub fn new(access_token: String, expires_at: i64) -> Self {
        Self { access_token, expires_at }
    }

    /// Token issued at `now` with a server declared lifetime of `expires_in` seconds.
    pub fn issued_at(access_token: String, now: i64, expires_in: i64) -> Self {
        let expires_at = now
            .saturating_add(expires_in)
            .saturating_sub(TOKEN_SAFETY_MARGIN_SECS);
        Self::new(access_token, expires_at)
    }

    pub fn is_valid(&self, now: i64) -> bool {
        now < self.expires_at
    }
}
