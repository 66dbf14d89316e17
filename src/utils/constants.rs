//! Shared constants and invariants

/// Well-known token endpoint, default audience of the assertion.
pub const TOKEN_URL: &str = "https://api.box.com/oauth2/token";
pub const JWT_BEARER_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime of a signed assertion (replay window).
pub const ASSERTION_TTL_SECS: i64 = 30;
/// Subtracted from the server-declared lifetime of every access token.
pub const TOKEN_SAFETY_MARGIN_SECS: i64 = 5;

pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 5000;
