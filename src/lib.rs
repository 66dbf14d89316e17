//! # Box Token Agent Library
//!
//! Turns a long-lived service identity (RSA key pair plus application and
//! enterprise identifiers) into short-lived bearer tokens through the
//! JWT-bearer OAuth2 grant, and caches them on disk per subject type.
//!
//! Modules:
//! - `config` — identity, subject and settings configuration
//! - `sources` — assertion signing, token exchange and the issuer
//! - `cache` — file token cache and the caller-held credential context
//! - `observability` — process wide Prometheus metrics

pub mod cache;
pub mod config;
pub mod error;
pub mod helpers;
pub mod observability;
pub mod sources;
pub mod utils;

#[cfg(test)]
mod tests;

pub use crate::cache::token::CachedToken;
pub use crate::cache::token_context::CredentialContext;
pub use crate::config::credentials::{CredentialIdentity, ServiceConfig};
pub use crate::error::{CredentialError, Result};
pub use crate::sources::issuer::TokenIssuer;
pub use crate::sources::{Subject, SubjectKind};
