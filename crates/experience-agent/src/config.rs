// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration loading from environment variables.

use std::net::SocketAddr;

/// Credentials for the hosted record store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`.
    pub url: String,
    /// Service API key.
    pub api_key: String,
}

/// Credentials for the transactional email provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailConfig {
    /// Provider API key.
    pub api_key: String,
    /// Verified sender address.
    pub sender: String,
}

/// Shared-secret access control settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessConfig {
    /// Secret expected in the `x-api-key` header.
    pub api_key: Option<String>,
    /// Disables the check even when a secret is set.
    pub allow_insecure: bool,
}

impl AccessConfig {
    /// Whether gated routes must present the secret.
    pub fn enforced(&self) -> bool {
        self.api_key.is_some() && !self.allow_insecure
    }
}

/// Experience agent configuration.
///
/// Built once at startup; every optional collaborator is represented by an `Option`
/// so components can be constructed with any combination in tests.
#[derive(Debug, Clone)]
pub struct Config {
    /// Record store credentials, `None` when store-backed features are off.
    pub store: Option<StoreConfig>,
    /// Email credentials, `None` when course emails are not sent.
    pub email: Option<EmailConfig>,
    /// Access control for gated routes.
    pub access: AccessConfig,
    /// HTTP listen address.
    pub http_addr: SocketAddr,
    /// Deployment environment name (logged only).
    pub environment: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: None,
            email: None,
            access: AccessConfig::default(),
            http_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            environment: "development".to_string(),
        }
    }
}

/// Read a variable, treating empty values as unset.
fn var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Optional:
    /// - `SUPABASE_URL` + `SUPABASE_API_KEY`: record store (both required to enable)
    /// - `SENDGRID_API_KEY` + `SENDGRID_SENDER`: course emails (both required to enable)
    /// - `BIZFLOW_API_KEY`: shared secret for gated routes
    /// - `BIZFLOW_ALLOW_INSECURE`: `true` disables the secret check
    /// - `PORT`: HTTP port (default: 3000)
    /// - `BIZFLOW_ENV`: environment name (default: development)
    pub fn from_env() -> Result<Self, ConfigError> {
        let store = match (var("SUPABASE_URL"), var("SUPABASE_API_KEY")) {
            (Some(url), Some(api_key)) => Some(StoreConfig { url, api_key }),
            _ => None,
        };

        let email = match (var("SENDGRID_API_KEY"), var("SENDGRID_SENDER")) {
            (Some(api_key), Some(sender)) => Some(EmailConfig { api_key, sender }),
            _ => None,
        };

        let access = AccessConfig {
            api_key: var("BIZFLOW_API_KEY"),
            allow_insecure: std::env::var("BIZFLOW_ALLOW_INSECURE").as_deref() == Ok("true"),
        };

        let port: u16 = var("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("PORT", "must be a valid port number"))?;

        let environment = var("BIZFLOW_ENV").unwrap_or_else(|| "development".to_string());

        Ok(Self {
            store,
            email,
            access,
            http_addr: SocketAddr::from(([0, 0, 0, 0], port)),
            environment,
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable has an invalid value.
    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, &'static str),
}
