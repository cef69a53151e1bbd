#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use keyring_gcloud::clock::ManualClock;
use keyring_gcloud::credentials::{
    CredentialStore, IdentityProvider, MemoryCredentialStore, SecretKey,
};
use secrecy::SecretString;

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 5, 12, 0, 0).unwrap()
}

pub fn manual_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(start_time()))
}

pub fn token_key() -> SecretKey {
    SecretKey::new("https://us-python.pkg.dev", "oauth2accesstoken")
}

/// Identity provider whose behaviour is set up front and whose calls are counted.
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    expired: AtomicBool,
    fail_refresh: bool,
    token: Mutex<Option<String>>,
    refreshed_token: Option<String>,
    pub expiry_checks: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    pub token_reads: AtomicUsize,
}

impl ScriptedProvider {
    /// A provider that already holds `token` and reports it as current.
    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_string())),
            ..Self::default()
        }
    }

    /// A provider whose credential has lapsed and yields `token` once refreshed.
    pub fn expired_then(token: &str) -> Self {
        Self {
            expired: AtomicBool::new(true),
            refreshed_token: Some(token.to_string()),
            ..Self::default()
        }
    }

    /// A provider whose credential has lapsed and whose refresh fails.
    pub fn failing() -> Self {
        Self {
            expired: AtomicBool::new(true),
            fail_refresh: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.expiry_checks.load(Ordering::SeqCst)
            + self.refresh_calls.load(Ordering::SeqCst)
            + self.token_reads.load(Ordering::SeqCst)
    }
}

impl IdentityProvider for ScriptedProvider {
    fn is_expired(&self) -> bool {
        self.expiry_checks.fetch_add(1, Ordering::SeqCst);
        self.expired.load(Ordering::SeqCst)
    }

    fn refresh(&self) -> Result<()> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_refresh {
            anyhow::bail!("simulated network error");
        }
        *self.token.lock().unwrap() = self.refreshed_token.clone();
        self.expired.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn current_token(&self) -> Option<SecretString> {
        self.token_reads.fetch_add(1, Ordering::SeqCst);
        self.token.lock().unwrap().clone().map(SecretString::from)
    }
}

/// Memory store whose reads or writes can be made to fail.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryCredentialStore,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
    pub writes: AtomicUsize,
}

impl FlakyStore {
    pub fn failing_writes() -> Self {
        Self {
            fail_writes: AtomicBool::new(true),
            ..Self::default()
        }
    }

    pub fn failing_reads() -> Self {
        Self {
            fail_reads: AtomicBool::new(true),
            ..Self::default()
        }
    }
}

impl CredentialStore for FlakyStore {
    fn get(&self, key: &SecretKey) -> Result<Option<SecretString>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            anyhow::bail!("backend locked");
        }
        self.inner.get(key)
    }

    fn set(&self, key: &SecretKey, value: SecretString) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            anyhow::bail!("backend is read-only");
        }
        self.inner.set(key, value)
    }

    fn delete(&self, key: &SecretKey) -> Result<()> {
        self.inner.delete(key)
    }
}
