//! In-memory credential store for tests and ephemeral sessions.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;
use secrecy::SecretString;

use super::{CredentialStore, SecretKey};

pub struct MemoryCredentialStore {
    secrets: Mutex<HashMap<SecretKey, SecretString>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self {
            secrets: Mutex::new(HashMap::new()),
        }
    }

    /// Create a store holding a single value.
    pub fn with_secret(key: SecretKey, value: impl Into<String>) -> Self {
        let store = Self::new();
        store
            .secrets
            .lock()
            .expect("secret store lock poisoned")
            .insert(key, SecretString::from(value.into()));
        store
    }

    pub fn len(&self) -> usize {
        self.secrets.lock().expect("secret store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, key: &SecretKey) -> Result<Option<SecretString>> {
        let secrets = self.secrets.lock().expect("secret store lock poisoned");
        Ok(secrets.get(key).cloned())
    }

    fn set(&self, key: &SecretKey, value: SecretString) -> Result<()> {
        let mut secrets = self.secrets.lock().expect("secret store lock poisoned");
        secrets.insert(key.clone(), value);
        Ok(())
    }

    fn delete(&self, key: &SecretKey) -> Result<()> {
        let mut secrets = self.secrets.lock().expect("secret store lock poisoned");
        secrets.remove(key);
        Ok(())
    }
}
