//! Access-token caching on top of a string-only secret store.
//!
//! Google access tokens are opaque, so their real expiry can't be inspected.
//! Instead every token we obtain is stamped with a conservative freshness
//! window (55 minutes by default, against the provider's usual hour) and
//! persisted alongside that expiry as a single encoded string:
//!
//! ```text
//! base64(<expiry as ISO-8601>):base64(<token>)
//! ```
//!
//! [`CredentialCache`] reads that string back, and when the window has
//! closed asks an [`IdentityProvider`] for a new token and writes it back.

mod cache;
pub mod codec;
mod gcloud;
mod memory;

pub use cache::{CacheError, CredentialCache, DEFAULT_FRESHNESS_WINDOW};
pub use codec::{DecodeError, EncodeError};
pub use gcloud::{GcloudCliProvider, ProviderConfig};
pub use memory::MemoryCredentialStore;

use std::fmt;

use anyhow::Result;
use chrono::{DateTime, Utc};
use secrecy::SecretString;

/// Location of a secret in the backing store: a service namespace plus the
/// identity (username) within it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SecretKey {
    pub service: String,
    pub username: String,
}

impl SecretKey {
    pub fn new(service: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            username: username.into(),
        }
    }
}

impl fmt::Display for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.service, self.username)
    }
}

/// A cached access token and the time we stop trusting it.
///
/// Both fields are absent when nothing usable was stored. Records are built
/// fresh on every lookup and never updated in place.
#[derive(Debug, Clone, Default)]
pub struct CredentialRecord {
    pub token: Option<SecretString>,
    pub expiry: Option<DateTime<Utc>>,
}

impl CredentialRecord {
    /// A record with neither token nor expiry.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(token: SecretString, expiry: DateTime<Utc>) -> Self {
        Self {
            token: Some(token),
            expiry: Some(expiry),
        }
    }

    /// True if the token is present and `now` has not passed the expiry.
    ///
    /// The boundary is inclusive: a token expiring exactly at `now` is
    /// still usable.
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        match (&self.token, self.expiry) {
            (Some(_), Some(expiry)) => expiry >= now,
            _ => false,
        }
    }

    /// The token, but only if the record is valid at `now`.
    pub fn valid_token(&self, now: DateTime<Utc>) -> Option<&SecretString> {
        if self.is_valid(now) {
            self.token.as_ref()
        } else {
            None
        }
    }
}

/// A key-value store for secrets that only understands string values.
///
/// Values are opaque to the store. The cache decides what they mean.
pub trait CredentialStore: Send + Sync {
    /// Retrieve a secret.
    ///
    /// Returns `Ok(None)` if nothing is stored under `key`.
    fn get(&self, key: &SecretKey) -> Result<Option<SecretString>>;

    /// Store a secret, replacing any previous value.
    fn set(&self, key: &SecretKey, value: SecretString) -> Result<()>;

    /// Remove a secret.
    fn delete(&self, key: &SecretKey) -> Result<()>;
}

/// The identity provider's local credential object.
///
/// `refresh` is where network I/O happens; the cache never retries it.
pub trait IdentityProvider: Send + Sync {
    /// Whether the provider's own notion of its credential has lapsed.
    fn is_expired(&self) -> bool;

    /// Mint a new token.
    fn refresh(&self) -> Result<()>;

    /// The provider's current token, if it has one.
    fn current_token(&self) -> Option<SecretString>;
}
