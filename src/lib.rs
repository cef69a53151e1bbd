//! A keyring proxy that hands out cached Google Cloud access tokens.
//!
//! See [`keyring::GcloudKeyring`] for the entry point and
//! [`credentials::CredentialCache`] for the refresh logic.

pub mod clock;
pub mod config;
pub mod credentials;
pub mod duration;
pub mod keyring;
pub mod policy;
