//! crates/bod_sheets/src/auth.rs
//! Bearer tokens for the Sheets/Drive APIs.
//!
//! `yup-oauth2` is async; the rest of the job is blocking, so the token
//! exchange runs on a private current-thread runtime owned by the source.

use serde_json::Value;
use tracing::debug;
use yup_oauth2::{AccessToken, ServiceAccountAuthenticator, ServiceAccountKey};

use crate::SheetsError;

pub const SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive.readonly",
];

pub trait TokenSource {
    fn access_token(&mut self) -> Result<String, SheetsError>;
}

/// Service-account JWT flow with an in-process token cache.
pub struct ServiceAccountToken {
    key: ServiceAccountKey,
    runtime: tokio::runtime::Runtime,
    cached: Option<AccessToken>,
}

impl ServiceAccountToken {
    /// `key` is the parsed service-account JSON document.
    pub fn from_json(key: &Value) -> Result<Self, SheetsError> {
        let key: ServiceAccountKey = serde_json::from_value(key.clone())
            .map_err(|e| SheetsError::Auth(format!("malformed service-account key: {e}")))?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| SheetsError::Auth(e.to_string()))?;
        Ok(Self { key, runtime, cached: None })
    }

    fn fetch(&self) -> Result<AccessToken, SheetsError> {
        let key = self.key.clone();
        self.runtime.block_on(async move {
            let auth = ServiceAccountAuthenticator::builder(key)
                .build()
                .await
                .map_err(|e| SheetsError::Auth(e.to_string()))?;
            auth.token(&SCOPES).await.map_err(|e| SheetsError::Auth(e.to_string()))
        })
    }
}

impl TokenSource for ServiceAccountToken {
    fn access_token(&mut self) -> Result<String, SheetsError> {
        if let Some(tok) = self.cached.as_ref().filter(|t| !t.is_expired()) {
            if let Some(s) = tok.token() {
                return Ok(s.to_string());
            }
        }
        let fresh = self.fetch()?;
        let token = fresh
            .token()
            .ok_or_else(|| SheetsError::Auth("token response carried no access token".into()))?
            .to_string();
        debug!(client_email = %self.key.client_email, "access token refreshed");
        self.cached = Some(fresh);
        Ok(token)
    }
}

/// Fixed token, for callers that already hold one.
#[derive(Clone, Debug)]
pub struct StaticToken(pub String);

impl TokenSource for StaticToken {
    fn access_token(&mut self) -> Result<String, SheetsError> {
        Ok(self.0.clone())
    }
}
