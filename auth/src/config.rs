use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::AuthError;

/// Value deployments leave in place when no real cookie secret was provided.
pub const COOKIE_PASSWORD_PLACEHOLDER: &str = "@cookie_password";

/// Development-only cookie secret. Insecure for production: anyone who knows
/// it can forge or read outcome cookies.
pub const DEV_COOKIE_PASSWORD: &str = "abcdefghijklmnopqrstuvwxyz1234567890";

/// Minimum secret length accepted by the cookie key derivation.
pub const MIN_COOKIE_PASSWORD_LEN: usize = 32;

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Public base URL of this server; provider callbacks land on `{location}/{provider}`
    #[serde(default = "default_location")]
    pub location: String,

    /// Outcome cookie configuration
    #[serde(default)]
    pub cookie: CookieConfig,

    /// Providers in display order
    #[serde(default = "default_providers")]
    pub providers: Vec<ProviderEntry>,

    /// OAuth client credentials keyed by provider name
    #[serde(default)]
    pub credentials: BTreeMap<String, ClientCredentials>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookieConfig {
    /// Shared secret used to encrypt outcome cookies
    pub password: Option<String>,

    /// Cookie domain; host-only cookies when unset
    pub domain: Option<String>,

    /// Secure cookie (HTTPS only)
    #[serde(default = "default_secure")]
    pub secure: bool,
}

/// One registry entry as written in configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderEntry {
    pub name: String,

    /// Provider specific settings passed through to the OAuth client
    #[serde(default)]
    pub config: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientCredentials {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

fn default_location() -> String {
    "http://localhost:3002".to_string()
}

fn default_secure() -> bool {
    true
}

fn default_providers() -> Vec<ProviderEntry> {
    let mut auth0 = serde_json::Map::new();
    auth0.insert("domain".to_string(), "example.auth0.com".into());

    vec![
        ProviderEntry::new("github"),
        ProviderEntry::new("facebook"),
        ProviderEntry::new("twitter"),
        ProviderEntry {
            name: "auth0".to_string(),
            config: auth0,
        },
    ]
}

impl ProviderEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: serde_json::Map::new(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            location: default_location(),
            cookie: CookieConfig::default(),
            providers: default_providers(),
            credentials: BTreeMap::new(),
        }
    }
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            password: None,
            domain: None,
            secure: default_secure(),
        }
    }
}

impl AuthConfig {
    /// Fill unset secrets from the process environment
    /// (`cookie_password`, `{provider}_id`, `{provider}_secret`).
    pub fn with_env_fallbacks(self) -> Self {
        self.with_fallbacks(|key| std::env::var(key).ok())
    }

    /// Fill unset secrets from `lookup`; explicitly configured values win.
    pub fn with_fallbacks(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if self.cookie.password.is_none() {
            self.cookie.password = lookup("cookie_password");
        }

        for provider in &self.providers {
            let entry = self
                .credentials
                .entry(provider.name.clone())
                .or_insert(ClientCredentials {
                    client_id: None,
                    client_secret: None,
                });
            if entry.client_id.is_none() {
                entry.client_id = lookup(&format!("{}_id", provider.name));
            }
            if entry.client_secret.is_none() {
                entry.client_secret = lookup(&format!("{}_secret", provider.name));
            }
        }

        self
    }

    /// Resolve the cookie secret, falling back to the development secret
    /// when none (or the placeholder) is configured.
    pub fn cookie_password(&self) -> Result<String, AuthError> {
        let password = match self.cookie.password.as_deref() {
            None | Some(COOKIE_PASSWORD_PLACEHOLDER) | Some("") => {
                tracing::warn!(
                    "No cookie password configured, using the development secret (insecure for production)"
                );
                DEV_COOKIE_PASSWORD
            }
            Some(password) => password,
        };

        if password.len() < MIN_COOKIE_PASSWORD_LEN {
            return Err(AuthError::ConfigError(format!(
                "cookie password must be at least {} bytes",
                MIN_COOKIE_PASSWORD_LEN
            )));
        }

        Ok(password.to_string())
    }

    /// Client id and secret for `provider`, if both are configured
    pub fn client_credentials(&self, provider: &str) -> Option<(&str, &str)> {
        let credentials = self.credentials.get(provider)?;
        match (&credentials.client_id, &credentials.client_secret) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => {
                Some((id.as_str(), secret.as_str()))
            }
            _ => None,
        }
    }
}
