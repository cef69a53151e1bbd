//! Identity provider backed by the `gcloud` CLI.
//!
//! Runs `gcloud auth print-access-token` (or a configured equivalent) and
//! hands the printed token to the cache.

use std::process::Command;
use std::sync::Mutex;

use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use super::IdentityProvider;

fn default_command() -> String {
    "gcloud".to_string()
}

fn default_args() -> Vec<String> {
    vec!["auth".to_string(), "print-access-token".to_string()]
}

/// Configuration for the command-line identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Program to run.
    pub command: String,

    /// Arguments passed to `command`. Its trimmed stdout is the token.
    pub args: Vec<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            args: default_args(),
        }
    }
}

/// Provider that asks the `gcloud` CLI for a token on every refresh.
///
/// It keeps no expiry of its own. The cache only consults a provider once
/// its freshness window has closed, so the last printed token is always
/// reported as expired and the command runs again.
pub struct GcloudCliProvider {
    config: ProviderConfig,
    current: Mutex<Option<SecretString>>,
}

impl GcloudCliProvider {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            config,
            current: Mutex::new(None),
        }
    }

    fn print_access_token(&self) -> Result<String> {
        let output = Command::new(&self.config.command)
            .args(&self.config.args)
            .output()
            .with_context(|| format!("Failed to run {}", self.config.command))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("{} command failed: {}", self.config.command, stderr.trim());
        }

        let stdout = String::from_utf8(output.stdout)
            .with_context(|| format!("Invalid UTF-8 in {} output", self.config.command))?;
        let token = stdout.trim();
        if token.is_empty() {
            anyhow::bail!("{} printed no access token", self.config.command);
        }

        Ok(token.to_string())
    }
}

impl IdentityProvider for GcloudCliProvider {
    fn is_expired(&self) -> bool {
        true
    }

    fn refresh(&self) -> Result<()> {
        let token = self.print_access_token()?;
        tracing::debug!(command = %self.config.command, "Fetched new access token");

        *self.current.lock().expect("provider lock poisoned") = Some(SecretString::from(token));
        Ok(())
    }

    fn current_token(&self) -> Option<SecretString> {
        self.current.lock().expect("provider lock poisoned").clone()
    }
}
