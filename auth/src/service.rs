use std::sync::Arc;

use axum_extra::extract::cookie::Key;

use crate::codec::CookieCodec;
use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::oauth::{OAuthClient, Oauth2Client};
use crate::outcome::ProviderStatus;
use crate::providers::{ProviderDescriptor, ProviderRegistry};
use crate::views::StatusPage;

/// Main authentication service. Immutable once built.
pub struct AuthService {
    pub config: AuthConfig,
    registry: ProviderRegistry,
    codec: CookieCodec,
    client: Arc<dyn OAuthClient>,
    page: StatusPage,
}

impl AuthService {
    /// Build the service with the `oauth2`-backed client.
    pub fn new(config: AuthConfig, page_template: &str) -> Result<Self, AuthError> {
        let registry = ProviderRegistry::from_entries(&config.providers)?;
        let client = Arc::new(Oauth2Client::new(&config, &registry)?);
        Self::build(config, registry, page_template, client)
    }

    pub fn with_client(
        config: AuthConfig,
        page_template: &str,
        client: Arc<dyn OAuthClient>,
    ) -> Result<Self, AuthError> {
        let registry = ProviderRegistry::from_entries(&config.providers)?;
        Self::build(config, registry, page_template, client)
    }

    fn build(
        config: AuthConfig,
        registry: ProviderRegistry,
        page_template: &str,
        client: Arc<dyn OAuthClient>,
    ) -> Result<Self, AuthError> {
        let password = config.cookie_password()?;
        let codec = CookieCodec::new(&password, &config.cookie)?;
        let page = StatusPage::new(page_template)?;

        Ok(Self {
            config,
            registry,
            codec,
            client,
            page,
        })
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn codec(&self) -> &CookieCodec {
        &self.codec
    }

    pub fn client(&self) -> &dyn OAuthClient {
        self.client.as_ref()
    }

    pub fn page(&self) -> &StatusPage {
        &self.page
    }

    /// Key for the private cookie jar holding in-flight OAuth state
    pub fn cookie_key(&self) -> Key {
        self.codec.key()
    }

    /// Classify every provider from raw cookie values, in registry order.
    pub fn statuses<'a, F>(&'a self, raw_cookie: F) -> Vec<(&'a ProviderDescriptor, ProviderStatus)>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.registry
            .iter()
            .map(|provider| {
                let raw = raw_cookie(provider.name());
                (provider, self.codec.status(provider.name(), raw.as_deref()))
            })
            .collect()
    }
}
