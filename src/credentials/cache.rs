use std::sync::Arc;

use chrono::Duration;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};

use super::codec::{self, EncodeError};
use super::{CredentialRecord, CredentialStore, IdentityProvider, SecretKey};

/// How long a freshly obtained token is trusted: one hour minus a margin.
pub const DEFAULT_FRESHNESS_WINDOW: Duration = Duration::minutes(55);

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("identity provider failed to refresh its credentials")]
    Refresh(#[source] anyhow::Error),

    #[error("identity provider has no access token after refresh")]
    MissingToken,

    #[error("failed to encode credential")]
    Encode(#[from] EncodeError),

    #[error("credential store operation failed")]
    Storage(#[source] anyhow::Error),

    #[error("freshness window {0} puts the expiry out of range")]
    ExpiryOutOfRange(Duration),
}

/// Hands out access tokens from a store, refreshing them through an
/// identity provider once the freshness window has closed.
///
/// The cache itself keeps no credential state between calls; everything is
/// re-read from the store each time.
pub struct CredentialCache {
    store: Arc<dyn CredentialStore>,
    provider: Arc<dyn IdentityProvider>,
    freshness_window: Duration,
    clock: Arc<dyn Clock>,
}

impl CredentialCache {
    pub fn new(store: Arc<dyn CredentialStore>, provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            store,
            provider,
            freshness_window: DEFAULT_FRESHNESS_WINDOW,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_freshness_window(mut self, window: Duration) -> Self {
        self.freshness_window = window;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn freshness_window(&self) -> Duration {
        self.freshness_window
    }

    /// Return a usable token for `key`.
    ///
    /// A valid stored token is returned without touching the provider.
    /// Otherwise a new token is obtained and written back; failing to write
    /// it back is logged but does not fail the lookup. Only provider
    /// failures are returned as errors.
    pub fn get(&self, key: &SecretKey) -> Result<SecretString, CacheError> {
        let stored = match self.store.get(key) {
            Ok(stored) => stored,
            Err(err) => {
                warn!(key = %key, error = %err, "Failed to read cached credential");
                None
            }
        };

        let record = codec::decode(stored.as_ref().map(|s| s.expose_secret()));
        if let Some(token) = record.valid_token(self.clock.now()) {
            debug!(key = %key, "Using cached access token");
            return Ok(token.clone());
        }

        debug!(key = %key, "Cached access token missing or stale, refreshing");
        let record = self.refresh()?;

        if let Some(encoded) = codec::encode(&record)? {
            match self.store.set(key, SecretString::from(encoded)) {
                Ok(()) => {
                    info!(key = %key, expiry = ?record.expiry, "Cached refreshed access token")
                }
                Err(err) => {
                    warn!(key = %key, error = %err, "Failed to cache refreshed access token")
                }
            }
        }

        record.token.ok_or(CacheError::MissingToken)
    }

    /// Store a token obtained elsewhere, stamped with a fresh expiry.
    ///
    /// If the record can't be encoded the raw token is stored instead.
    pub fn put(&self, key: &SecretKey, token: SecretString) -> Result<(), CacheError> {
        let record = CredentialRecord::new(token, self.fresh_expiry()?);

        let encoded = match codec::encode(&record) {
            Ok(encoded) => encoded.map(SecretString::from),
            Err(err) => {
                warn!(key = %key, error = %err, "Storing credential without expiry");
                None
            }
        };
        let Some(value) = encoded.or(record.token) else {
            return Ok(());
        };

        self.store.set(key, value).map_err(CacheError::Storage)
    }

    pub fn delete(&self, key: &SecretKey) -> Result<(), CacheError> {
        self.store.delete(key).map_err(CacheError::Storage)
    }

    fn refresh(&self) -> Result<CredentialRecord, CacheError> {
        if self.provider.is_expired() {
            self.provider.refresh().map_err(CacheError::Refresh)?;
        }

        let token = self
            .provider
            .current_token()
            .ok_or(CacheError::MissingToken)?;

        Ok(CredentialRecord::new(token, self.fresh_expiry()?))
    }

    fn fresh_expiry(&self) -> Result<chrono::DateTime<chrono::Utc>, CacheError> {
        self.clock
            .now()
            .checked_add_signed(self.freshness_window)
            .ok_or(CacheError::ExpiryOutOfRange(self.freshness_window))
    }
}
