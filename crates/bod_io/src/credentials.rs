//! crates/bod_io/src/credentials.rs
//! Secrets named by the config and held in the process environment (optionally
//! populated from a `.env` file by the binary). Resolved at point of use; a
//! missing or malformed value fails with the variable's name.
//!
//! Every resolver has a `*_with` twin taking a lookup function so tests never
//! touch the real environment.

use core::fmt;

use serde_json::Value;

use crate::config::UpdateType;
use crate::IoError;

fn env_lookup(var: &str) -> Option<String> {
    std::env::var(var).ok()
}

/// Service-account key used for the spreadsheet API.
#[derive(Clone)]
pub struct ServiceAccount {
    var: String,
    json: Value,
}

impl ServiceAccount {
    pub fn from_env(var: &str) -> Result<Self, IoError> {
        Self::from_env_with(var, env_lookup)
    }

    pub fn from_env_with(var: &str, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, IoError> {
        let missing = || IoError::MissingCredential { var: var.to_string() };
        let raw = lookup(var).filter(|s| !s.trim().is_empty()).ok_or_else(missing)?;
        // Keys pasted into .env files keep literal newlines inside the PEM block.
        let json: Value = serde_json::from_str(&raw.replace('\n', "\\n")).map_err(|_| missing())?;
        let ok = json.get("client_email").and_then(Value::as_str).is_some()
            && json.get("private_key").and_then(Value::as_str).is_some();
        if !ok {
            return Err(missing());
        }
        Ok(Self { var: var.to_string(), json })
    }

    /// Environment variable the key was read from.
    pub fn var(&self) -> &str {
        &self.var
    }

    pub fn client_email(&self) -> &str {
        self.json.get("client_email").and_then(Value::as_str).unwrap_or_default()
    }

    /// Full key document, as handed to the OAuth token exchange.
    pub fn json(&self) -> &Value {
        &self.json
    }
}

impl fmt::Debug for ServiceAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccount")
            .field("var", &self.var)
            .field("client_email", &self.client_email())
            .finish_non_exhaustive()
    }
}

/// Object-storage keys for drafts whose raw data lives in a bucket.
#[derive(Clone, PartialEq, Eq)]
pub struct S3Credentials {
    pub bucket: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl S3Credentials {
    /// `Ok(None)` for web-sourced drafts.
    pub fn resolve(update_type: &UpdateType) -> Result<Option<Self>, IoError> {
        Self::resolve_with(update_type, env_lookup)
    }

    pub fn resolve_with(
        update_type: &UpdateType,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Option<Self>, IoError> {
        let UpdateType::S3 { bucket, access_key_id_var, secret_access_key_var } = update_type else {
            return Ok(None);
        };
        let get = |var: &str| {
            lookup(var)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| IoError::MissingCredential { var: var.to_string() })
        };
        Ok(Some(Self {
            bucket: bucket.clone(),
            access_key_id: get(access_key_id_var)?,
            secret_access_key: get(secret_access_key_var)?,
        }))
    }
}

impl fmt::Debug for S3Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Credentials")
            .field("bucket", &self.bucket)
            .field("access_key_id", &"<redacted>")
            .field("secret_access_key", &"<redacted>")
            .finish()
    }
}
