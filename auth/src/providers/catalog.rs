//! Endpoints of well-known providers.
//!
//! Any provider may override `auth_url`, `token_url`, `profile_url` and
//! `scope` (space separated) through its config; providers missing from the
//! catalog must supply all three URLs.

use super::ProviderDescriptor;
use crate::error::AuthError;

/// How client credentials travel to the token endpoint
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClientAuth {
    BasicAuth,
    RequestBody,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderEndpoints {
    pub auth_url: String,
    pub token_url: String,
    pub profile_url: String,
    pub scopes: Vec<String>,
    pub pkce: bool,
    pub client_auth: ClientAuth,
}

impl ProviderEndpoints {
    fn new(
        auth_url: impl Into<String>,
        token_url: impl Into<String>,
        profile_url: impl Into<String>,
        scopes: &[&str],
    ) -> Self {
        Self {
            auth_url: auth_url.into(),
            token_url: token_url.into(),
            profile_url: profile_url.into(),
            scopes: scopes.iter().map(|s| s.to_string()).collect(),
            pkce: true,
            client_auth: ClientAuth::RequestBody,
        }
    }
}

fn builtin(provider: &ProviderDescriptor) -> Result<Option<ProviderEndpoints>, AuthError> {
    let endpoints = match provider.name() {
        "github" => ProviderEndpoints::new(
            "https://github.com/login/oauth/authorize",
            "https://github.com/login/oauth/access_token",
            "https://api.github.com/user",
            &["read:user", "user:email"],
        ),
        "facebook" => ProviderEndpoints {
            pkce: false,
            ..ProviderEndpoints::new(
                "https://www.facebook.com/v19.0/dialog/oauth",
                "https://graph.facebook.com/v19.0/oauth/access_token",
                "https://graph.facebook.com/v19.0/me?fields=id,name,email,picture",
                &["email"],
            )
        },
        "twitter" => ProviderEndpoints {
            client_auth: ClientAuth::BasicAuth,
            ..ProviderEndpoints::new(
                "https://twitter.com/i/oauth2/authorize",
                "https://api.twitter.com/2/oauth2/token",
                "https://api.twitter.com/2/users/me",
                &["users.read", "tweet.read"],
            )
        },
        "google" => ProviderEndpoints::new(
            "https://accounts.google.com/o/oauth2/v2/auth",
            "https://oauth2.googleapis.com/token",
            "https://openidconnect.googleapis.com/v1/userinfo",
            &["openid", "email", "profile"],
        ),
        "linkedin" => ProviderEndpoints {
            pkce: false,
            ..ProviderEndpoints::new(
                "https://www.linkedin.com/oauth/v2/authorization",
                "https://www.linkedin.com/oauth/v2/accessToken",
                "https://api.linkedin.com/v2/userinfo",
                &["openid", "profile", "email"],
            )
        },
        "auth0" => {
            let domain = provider.setting("domain").ok_or_else(|| {
                AuthError::ConfigError("auth0 provider requires a `domain` setting".to_string())
            })?;
            ProviderEndpoints::new(
                format!("https://{}/authorize", domain),
                format!("https://{}/oauth/token", domain),
                format!("https://{}/userinfo", domain),
                &["openid", "email", "profile"],
            )
        }
        _ => return Ok(None),
    };
    Ok(Some(endpoints))
}

/// Resolve the endpoints for `provider`, applying config overrides.
pub fn endpoints_for(provider: &ProviderDescriptor) -> Result<ProviderEndpoints, AuthError> {
    let overrides = (
        provider.setting("auth_url"),
        provider.setting("token_url"),
        provider.setting("profile_url"),
    );

    let mut endpoints = match (builtin(provider)?, overrides) {
        (Some(endpoints), _) => endpoints,
        (None, (Some(auth_url), Some(token_url), Some(profile_url))) => {
            ProviderEndpoints::new(auth_url, token_url, profile_url, &[])
        }
        (None, _) => {
            return Err(AuthError::ConfigError(format!(
                "provider {} is not in the catalog and does not configure auth_url, token_url and profile_url",
                provider.name()
            )))
        }
    };

    if let Some(auth_url) = overrides.0 {
        endpoints.auth_url = auth_url.to_string();
    }
    if let Some(token_url) = overrides.1 {
        endpoints.token_url = token_url.to_string();
    }
    if let Some(profile_url) = overrides.2 {
        endpoints.profile_url = profile_url.to_string();
    }
    if let Some(scope) = provider.setting("scope") {
        endpoints.scopes = scope.split_whitespace().map(str::to_string).collect();
    }
    if let Some(pkce) = provider.config().get("pkce").and_then(|v| v.as_bool()) {
        endpoints.pkce = pkce;
    }

    Ok(endpoints)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map, Value};

    fn provider(name: &str, config: Value) -> ProviderDescriptor {
        let config: Map<String, Value> = serde_json::from_value(config).unwrap();
        ProviderDescriptor::new(name, config).unwrap()
    }

    #[test]
    fn test_github_endpoints() {
        let endpoints = endpoints_for(&provider("github", json!({}))).unwrap();
        assert_eq!(endpoints.auth_url, "https://github.com/login/oauth/authorize");
        assert_eq!(endpoints.profile_url, "https://api.github.com/user");
        assert!(endpoints.pkce);
    }

    #[test]
    fn test_auth0_uses_domain() {
        let endpoints =
            endpoints_for(&provider("auth0", json!({ "domain": "tenant.auth0.com" }))).unwrap();
        assert_eq!(endpoints.auth_url, "https://tenant.auth0.com/authorize");
        assert_eq!(endpoints.token_url, "https://tenant.auth0.com/oauth/token");
    }

    #[test]
    fn test_auth0_without_domain_fails() {
        assert!(matches!(
            endpoints_for(&provider("auth0", json!({}))),
            Err(AuthError::ConfigError(_))
        ));
    }

    #[test]
    fn test_unknown_provider_needs_explicit_endpoints() {
        assert!(endpoints_for(&provider("gitlab", json!({}))).is_err());

        let endpoints = endpoints_for(&provider(
            "gitlab",
            json!({
                "auth_url": "https://gitlab.com/oauth/authorize",
                "token_url": "https://gitlab.com/oauth/token",
                "profile_url": "https://gitlab.com/api/v4/user",
                "scope": "read_user openid",
                "pkce": false
            }),
        ))
        .unwrap();
        assert_eq!(endpoints.scopes, vec!["read_user", "openid"]);
        assert!(!endpoints.pkce);
    }

    #[test]
    fn test_overrides_apply_to_builtin() {
        let endpoints = endpoints_for(&provider(
            "twitter",
            json!({ "token_url": "https://localhost:9000/token" }),
        ))
        .unwrap();
        assert_eq!(endpoints.token_url, "https://localhost:9000/token");
        assert_eq!(endpoints.client_auth, ClientAuth::BasicAuth);
    }
}
