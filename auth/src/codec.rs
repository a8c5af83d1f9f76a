//! Encrypted per-provider outcome cookies.
//!
//! Values are sealed with the `cookie` crate's private jar (AES-256-GCM, the
//! cookie name bound as associated data), so a value copied from one
//! provider's cookie into another's fails to open.

use axum_extra::extract::cookie::{Cookie, Key, SameSite};

use crate::config::CookieConfig;
use crate::error::AuthError;
use crate::outcome::{AuthOutcome, ProviderStatus};

/// Browsers silently drop cookies whose name and value exceed ~4 KiB.
pub const MAX_COOKIE_BYTES: usize = 4000;

#[derive(Clone)]
pub struct CookieCodec {
    key: Key,
    domain: Option<String>,
    secure: bool,
}

impl CookieCodec {
    /// `password` must be at least 32 bytes.
    pub fn new(password: &str, config: &CookieConfig) -> Result<Self, AuthError> {
        if password.len() < crate::config::MIN_COOKIE_PASSWORD_LEN {
            return Err(AuthError::ConfigError(
                "cookie password is too short".to_string(),
            ));
        }
        Ok(Self {
            key: Key::derive_from(password.as_bytes()),
            domain: config.domain.clone(),
            secure: config.secure,
        })
    }

    pub fn key(&self) -> Key {
        self.key.clone()
    }

    /// Encrypted cookie value for `outcome`
    pub fn encode_value(&self, name: &str, outcome: &AuthOutcome) -> Result<String, AuthError> {
        let json = serde_json::to_string(outcome)?;
        let mut jar = cookie::CookieJar::new();
        jar.private_mut(&self.key)
            .add(Cookie::new(name.to_string(), json));
        let value = jar
            .get(name)
            .map(|c| c.value().to_string())
            .ok_or_else(|| AuthError::ConfigError(format!("failed to seal cookie {}", name)))?;

        if name.len() + value.len() > MAX_COOKIE_BYTES {
            return Err(AuthError::CookieTooLarge(name.to_string()));
        }
        Ok(value)
    }

    /// Session cookie carrying `outcome` for provider `name`
    pub fn encode(&self, name: &str, outcome: &AuthOutcome) -> Result<Cookie<'static>, AuthError> {
        let value = self.encode_value(name, outcome)?;
        Ok(self.build(name, value))
    }

    /// Open a raw cookie value. Anything not produced by `encode` for this
    /// name and key yields `None`.
    pub fn decode(&self, name: &str, raw: &str) -> Option<AuthOutcome> {
        if raw.is_empty() {
            return None;
        }
        let mut jar = cookie::CookieJar::new();
        jar.add_original(Cookie::new(name.to_string(), raw.to_string()));
        let opened = jar.private(&self.key).get(name)?;
        serde_json::from_str(opened.value()).ok()
    }

    pub fn status(&self, name: &str, raw: Option<&str>) -> ProviderStatus {
        raw.and_then(|raw| self.decode(name, raw)).into()
    }

    /// Cookie that clears provider `name` on the client
    pub fn removal(&self, name: &str) -> Cookie<'static> {
        self.build(name, String::new())
    }

    fn build(&self, name: &str, value: String) -> Cookie<'static> {
        let mut cookie = Cookie::new(name.to_string(), value);
        cookie.set_path("/");
        cookie.set_http_only(true);
        cookie.set_secure(self.secure);
        cookie.set_same_site(SameSite::Strict);
        if let Some(domain) = &self.domain {
            cookie.set_domain(domain.clone());
        }
        cookie
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEV_COOKIE_PASSWORD;
    use crate::error::ErrorDescriptor;
    use serde_json::json;

    fn codec() -> CookieCodec {
        CookieCodec::new(DEV_COOKIE_PASSWORD, &CookieConfig::default()).unwrap()
    }

    fn alice() -> AuthOutcome {
        AuthOutcome::Authenticated {
            credentials: json!({ "name": "alice" }),
        }
    }

    #[test]
    fn test_round_trip() {
        let codec = codec();
        let failed = AuthOutcome::failed(&ErrorDescriptor::new("access_denied", None));
        for outcome in [alice(), failed] {
            let value = codec.encode_value("github", &outcome).unwrap();
            assert_eq!(codec.decode("github", &value), Some(outcome));
        }
    }

    #[test]
    fn test_value_is_not_plaintext() {
        let value = codec().encode_value("github", &alice()).unwrap();
        assert!(!value.contains("alice"));
    }

    #[test]
    fn test_foreign_values_decode_to_none() {
        let codec = codec();
        let value = codec.encode_value("github", &alice()).unwrap();

        assert_eq!(codec.decode("github", ""), None);
        assert_eq!(codec.decode("github", "not base64 at all!"), None);
        assert_eq!(codec.decode("github", "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA"), None);
        assert_eq!(codec.decode("github", &value[..value.len() / 2]), None);
        // bound to the cookie name
        assert_eq!(codec.decode("facebook", &value), None);

        let other = CookieCodec::new(
            "another-secret-that-is-long-enough-1234",
            &CookieConfig::default(),
        )
        .unwrap();
        assert_eq!(other.decode("github", &value), None);
    }

    #[test]
    fn test_tampered_value_decodes_to_none() {
        let codec = codec();
        let value = codec.encode_value("github", &alice()).unwrap();
        let mut bytes = value.into_bytes();
        let last = bytes.len() - 3;
        bytes[last] = if bytes[last] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(bytes).unwrap();
        assert_eq!(codec.decode("github", &tampered), None);
    }

    #[test]
    fn test_cookie_attributes() {
        let mut config = CookieConfig::default();
        config.domain = Some("signet.example.com".to_string());
        let codec = CookieCodec::new(DEV_COOKIE_PASSWORD, &config).unwrap();
        let cookie = codec.encode("github", &alice()).unwrap();

        assert_eq!(cookie.name(), "github");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.domain(), Some("signet.example.com"));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert!(cookie.max_age().is_none());
        assert!(cookie.expires().is_none());
    }

    #[test]
    fn test_status_of_missing_and_invalid() {
        let codec = codec();
        assert_eq!(codec.status("github", None), ProviderStatus::NotAttempted);
        assert_eq!(codec.status("github", Some("garbage")), ProviderStatus::NotAttempted);
    }

    #[test]
    fn test_short_password_rejected() {
        assert!(CookieCodec::new("short", &CookieConfig::default()).is_err());
    }

    #[test]
    fn test_oversized_outcome_rejected() {
        let huge = AuthOutcome::Authenticated {
            credentials: json!({ "blob": "x".repeat(MAX_COOKIE_BYTES) }),
        };
        assert!(matches!(
            codec().encode("github", &huge),
            Err(AuthError::CookieTooLarge(name)) if name == "github"
        ));
    }
}
