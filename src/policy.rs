//! Which secrets get the token cache and which pass straight through.

use serde::{Deserialize, Serialize};

use crate::credentials::SecretKey;

/// Set to any non-empty value to intercept every lookup.
pub const ALWAYS_INTERCEPT_ENV: &str = "KEYRING_GCLOUD_ON";

/// Overrides the username that marks a lookup as an access-token request.
pub const MATCH_IDENTITY_ENV: &str = "KEYRING_GCLOUD_USERNAME";

/// Username package registries use for access-token authentication.
pub const DEFAULT_MATCH_IDENTITY: &str = "oauth2accesstoken";

fn default_match_identity() -> String {
    DEFAULT_MATCH_IDENTITY.to_string()
}

/// Decides whether a lookup should go through the token cache.
pub trait InterceptionPolicy: Send + Sync {
    fn should_intercept(&self, key: &SecretKey) -> bool;
}

/// Interception settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterceptionConfig {
    /// Intercept every lookup regardless of username.
    pub always_intercept: bool,

    /// Intercept lookups for this username.
    #[serde(default = "default_match_identity")]
    pub match_identity: String,
}

impl Default for InterceptionConfig {
    fn default() -> Self {
        Self {
            always_intercept: false,
            match_identity: default_match_identity(),
        }
    }
}

impl InterceptionConfig {
    /// Defaults with the environment applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Apply `KEYRING_GCLOUD_ON` and `KEYRING_GCLOUD_USERNAME` on top of the
    /// current settings.
    pub fn apply_env(&mut self) {
        self.apply_vars(|name| std::env::var(name).ok());
    }

    fn apply_vars(&mut self, var: impl Fn(&str) -> Option<String>) {
        if var(ALWAYS_INTERCEPT_ENV).is_some_and(|v| !v.is_empty()) {
            self.always_intercept = true;
        }
        if let Some(identity) = var(MATCH_IDENTITY_ENV) {
            self.match_identity = identity;
        }
    }
}

impl InterceptionPolicy for InterceptionConfig {
    fn should_intercept(&self, key: &SecretKey) -> bool {
        self.always_intercept || key.username == self.match_identity
    }
}
