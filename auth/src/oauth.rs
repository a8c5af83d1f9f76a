use async_trait::async_trait;
use oauth2::{
    basic::BasicClient, reqwest::async_http_client, AuthType, AuthUrl, AuthorizationCode,
    ClientId, ClientSecret, CsrfToken, PkceCodeChallenge, PkceCodeVerifier, RedirectUrl,
    RequestTokenError, Scope, TokenResponse, TokenUrl,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::providers::catalog::{endpoints_for, ClientAuth, ProviderEndpoints};
use crate::providers::{ProviderDescriptor, ProviderRegistry};
use crate::session::OAuthTempState;

const USER_AGENT: &str = "Signet-Auth";

/// Credentials returned by a successful exchange
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub provider: String,
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    /// Raw profile as returned by the provider
    pub profile: serde_json::Value,
}

/// Where to send the browser to start a flow, and what to remember meanwhile
#[derive(Clone, Debug)]
pub struct AuthorizationRequest {
    pub url: String,
    pub state: OAuthTempState,
}

/// The OAuth exchange, one implementation per deployment (or test).
#[async_trait]
pub trait OAuthClient: Send + Sync {
    /// Build the provider authorization URL for a fresh flow
    fn authorize(&self, provider: &ProviderDescriptor) -> Result<AuthorizationRequest, AuthError>;

    /// Trade an authorization code for credentials
    async fn exchange(
        &self,
        provider: &ProviderDescriptor,
        code: &str,
        state: &OAuthTempState,
    ) -> Result<Credentials, AuthError>;
}

struct ProviderClient {
    client: BasicClient,
    endpoints: ProviderEndpoints,
}

/// `OAuthClient` backed by the `oauth2` crate and reqwest
pub struct Oauth2Client {
    http: reqwest::Client,
    providers: HashMap<String, Option<ProviderClient>>,
}

impl Oauth2Client {
    pub fn new(config: &AuthConfig, registry: &ProviderRegistry) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        let location = config.location.trim_end_matches('/');

        let mut providers = HashMap::new();
        for provider in registry {
            let endpoints = endpoints_for(provider)?;
            let redirect_url = RedirectUrl::new(format!("{}{}", location, provider.path()))?;
            let auth_url = AuthUrl::new(endpoints.auth_url.clone())?;
            let token_url = TokenUrl::new(endpoints.token_url.clone())?;
            url::Url::parse(&endpoints.profile_url)?;

            let client = match config.client_credentials(provider.name()) {
                Some((client_id, client_secret)) => {
                    let auth_type = match endpoints.client_auth {
                        ClientAuth::BasicAuth => AuthType::BasicAuth,
                        ClientAuth::RequestBody => AuthType::RequestBody,
                    };
                    let client = BasicClient::new(
                        ClientId::new(client_id.to_string()),
                        Some(ClientSecret::new(client_secret.to_string())),
                        auth_url,
                        Some(token_url),
                    )
                    .set_redirect_uri(redirect_url)
                    .set_auth_type(auth_type);
                    Some(ProviderClient { client, endpoints })
                }
                None => {
                    tracing::warn!(
                        "No client id/secret for provider {}, its logins will fail",
                        provider.name()
                    );
                    None
                }
            };
            providers.insert(provider.name().to_string(), client);
        }

        Ok(Self { http, providers })
    }

    fn provider(&self, provider: &ProviderDescriptor) -> Result<&ProviderClient, AuthError> {
        self.providers
            .get(provider.name())
            .ok_or_else(|| AuthError::InvalidProvider(provider.name().to_string()))?
            .as_ref()
            .ok_or_else(|| AuthError::MissingCredentials(provider.name().to_string()))
    }

    async fn fetch_profile(
        &self,
        endpoints: &ProviderEndpoints,
        access_token: &str,
    ) -> Result<serde_json::Value, AuthError> {
        let profile = self
            .http
            .get(&endpoints.profile_url)
            .bearer_auth(access_token)
            .send()
            .await?
            .error_for_status()?
            .json::<serde_json::Value>()
            .await?;
        Ok(profile)
    }
}

#[async_trait]
impl OAuthClient for Oauth2Client {
    fn authorize(&self, provider: &ProviderDescriptor) -> Result<AuthorizationRequest, AuthError> {
        let ProviderClient { client, endpoints } = self.provider(provider)?;

        let mut request = client
            .authorize_url(CsrfToken::new_random)
            .add_scopes(endpoints.scopes.iter().cloned().map(Scope::new));

        let mut pkce_verifier = None;
        if endpoints.pkce {
            let (challenge, verifier) = PkceCodeChallenge::new_random_sha256();
            request = request.set_pkce_challenge(challenge);
            pkce_verifier = Some(verifier.secret().clone());
        }

        let (url, csrf_state) = request.url();

        Ok(AuthorizationRequest {
            url: url.to_string(),
            state: OAuthTempState::new(provider.name(), csrf_state.secret().clone(), pkce_verifier),
        })
    }

    async fn exchange(
        &self,
        provider: &ProviderDescriptor,
        code: &str,
        state: &OAuthTempState,
    ) -> Result<Credentials, AuthError> {
        let ProviderClient { client, endpoints } = self.provider(provider)?;

        let mut token_request = client.exchange_code(AuthorizationCode::new(code.to_string()));
        if let Some(verifier) = &state.pkce_verifier {
            token_request = token_request.set_pkce_verifier(PkceCodeVerifier::new(verifier.clone()));
        }

        let token = token_request
            .request_async(async_http_client)
            .await
            .map_err(|e| match e {
                RequestTokenError::ServerResponse(response) => AuthError::OAuthError {
                    code: response.error().to_string(),
                    description: response.error_description().cloned(),
                },
                other => AuthError::OAuthError {
                    code: "token_exchange_failed".to_string(),
                    description: Some(other.to_string()),
                },
            })?;

        let access_token = token.access_token().secret().clone();
        let profile = self.fetch_profile(endpoints, &access_token).await?;

        Ok(Credentials {
            provider: provider.name().to_string(),
            token: access_token,
            refresh_token: token.refresh_token().map(|t| t.secret().clone()),
            expires_in: token.expires_in().map(|d| d.as_secs()),
            profile,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClientCredentials, ProviderEntry};

    fn configured() -> (AuthConfig, ProviderRegistry) {
        let mut config = AuthConfig {
            location: "https://signet.example.com/".to_string(),
            providers: vec![ProviderEntry::new("github"), ProviderEntry::new("facebook")],
            ..AuthConfig::default()
        };
        config.credentials.insert(
            "github".to_string(),
            ClientCredentials {
                client_id: Some("gh-client".to_string()),
                client_secret: Some("gh-secret".to_string()),
            },
        );
        let registry = ProviderRegistry::from_entries(&config.providers).unwrap();
        (config, registry)
    }

    #[test]
    fn test_authorize_builds_provider_url() {
        let (config, registry) = configured();
        let client = Oauth2Client::new(&config, &registry).unwrap();
        let github = registry.get("github").unwrap();

        let request = client.authorize(github).unwrap();
        let url = url::Url::parse(&request.url).unwrap();
        let query: HashMap<_, _> = url.query_pairs().into_owned().collect();

        assert!(request.url.starts_with("https://github.com/login/oauth/authorize"));
        assert_eq!(query.get("client_id").map(String::as_str), Some("gh-client"));
        assert_eq!(
            query.get("redirect_uri").map(String::as_str),
            Some("https://signet.example.com/github")
        );
        assert_eq!(query.get("state"), Some(&request.state.csrf_state));
        assert!(query.contains_key("code_challenge"));
        assert!(request.state.pkce_verifier.is_some());
        assert_eq!(request.state.provider, "github");
    }

    #[test]
    fn test_missing_credentials_fail_per_request() {
        let (config, registry) = configured();
        let client = Oauth2Client::new(&config, &registry).unwrap();
        let facebook = registry.get("facebook").unwrap();

        assert!(matches!(
            client.authorize(facebook),
            Err(AuthError::MissingCredentials(name)) if name == "facebook"
        ));
    }

    #[test]
    fn test_unresolvable_provider_is_a_startup_error() {
        let config = AuthConfig {
            providers: vec![ProviderEntry::new("gitlab")],
            ..AuthConfig::default()
        };
        let registry = ProviderRegistry::from_entries(&config.providers).unwrap();
        assert!(matches!(
            Oauth2Client::new(&config, &registry),
            Err(AuthError::ConfigError(_))
        ));
    }

    #[test]
    fn test_credentials_serialize_camel_case() {
        let credentials = Credentials {
            provider: "github".to_string(),
            token: "t".to_string(),
            refresh_token: Some("r".to_string()),
            expires_in: Some(3600),
            profile: serde_json::json!({ "login": "alice" }),
        };
        assert_eq!(
            serde_json::to_value(&credentials).unwrap(),
            serde_json::json!({
                "provider": "github",
                "token": "t",
                "refreshToken": "r",
                "expiresIn": 3600,
                "profile": { "login": "alice" }
            })
        );
    }
}
