use serde::{Deserialize, Serialize};

/// Prefix of the cookie carrying in-flight OAuth state for one provider
pub const OAUTH_STATE_COOKIE_PREFIX: &str = "oauth_state_";

/// Lifetime of the in-flight OAuth state cookie
pub const OAUTH_STATE_TTL_SECONDS: i64 = 600;

pub fn oauth_state_cookie_name(provider: &str) -> String {
    format!("{}{}", OAUTH_STATE_COOKIE_PREFIX, provider)
}

/// State kept between the redirect to a provider and its callback.
/// Lives only in an encrypted cookie.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct OAuthTempState {
    pub provider: String,

    /// CSRF token echoed back by the provider in `state`
    pub csrf_state: String,

    /// PKCE verifier, cleared after token exchange
    pub pkce_verifier: Option<String>,

    /// Unix timestamp
    pub created_at: u64,
}

impl OAuthTempState {
    pub fn new(provider: &str, csrf_state: String, pkce_verifier: Option<String>) -> Self {
        Self {
            provider: provider.to_string(),
            csrf_state,
            pkce_verifier,
            created_at: unix_now(),
        }
    }

    pub fn is_expired(&self) -> bool {
        unix_now().saturating_sub(self.created_at) > OAUTH_STATE_TTL_SECONDS as u64
    }

    /// Whether a callback for `provider` carrying `state` belongs to this flow
    pub fn matches(&self, provider: &str, state: Option<&str>) -> bool {
        self.provider == provider && state == Some(self.csrf_state.as_str()) && !self.is_expired()
    }
}

fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
