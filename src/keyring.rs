//! Keyring-style front end over a backend credential store.
//!
//! Lookups the [`InterceptionPolicy`] selects are served by the
//! [`CredentialCache`]; everything else reads and writes the backend
//! unchanged.

use std::sync::Arc;

use anyhow::Result;
use secrecy::SecretString;

use crate::clock::Clock;
use crate::config::Config;
use crate::credentials::{
    CredentialCache, CredentialStore, GcloudCliProvider, IdentityProvider, SecretKey,
};
use crate::policy::InterceptionPolicy;

pub struct GcloudKeyring {
    backend: Arc<dyn CredentialStore>,
    policy: Arc<dyn InterceptionPolicy>,
    cache: CredentialCache,
}

impl GcloudKeyring {
    pub fn new(
        backend: Arc<dyn CredentialStore>,
        provider: Arc<dyn IdentityProvider>,
        policy: Arc<dyn InterceptionPolicy>,
    ) -> Self {
        let cache = CredentialCache::new(backend.clone(), provider);
        Self {
            backend,
            policy,
            cache,
        }
    }

    /// Build a keyring that refreshes tokens through the `gcloud` CLI.
    pub fn from_config(config: &Config, backend: Arc<dyn CredentialStore>) -> Self {
        let provider = Arc::new(GcloudCliProvider::new(config.provider.clone()));
        let policy = Arc::new(config.interception.clone());
        let cache = CredentialCache::new(backend.clone(), provider)
            .with_freshness_window(config.freshness_window);
        Self {
            backend,
            policy,
            cache,
        }
    }

    /// Replace the cache's clock. Only affects intercepted lookups.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.cache = self.cache.with_clock(clock);
        self
    }

    pub fn cache(&self) -> &CredentialCache {
        &self.cache
    }

    pub fn get_password(&self, service: &str, username: &str) -> Result<Option<SecretString>> {
        let key = SecretKey::new(service, username);
        if !self.policy.should_intercept(&key) {
            return self.backend.get(&key);
        }

        Ok(Some(self.cache.get(&key)?))
    }

    pub fn set_password(
        &self,
        service: &str,
        username: &str,
        password: SecretString,
    ) -> Result<()> {
        let key = SecretKey::new(service, username);
        if !self.policy.should_intercept(&key) {
            return self.backend.set(&key, password);
        }

        self.cache.put(&key, password)?;
        Ok(())
    }

    pub fn delete_password(&self, service: &str, username: &str) -> Result<()> {
        self.cache.delete(&SecretKey::new(service, username))?;
        Ok(())
    }
}
