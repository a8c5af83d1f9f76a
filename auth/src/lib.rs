//! Signet authentication library
//!
//! Shows, for a fixed list of identity providers, whether the visitor is
//! authenticated with each of them. Every provider gets a login route that
//! drives an OAuth2 exchange and stores the outcome in an encrypted cookie
//! named after the provider; the status page reads those cookies back.
//!
//! No server-side session state is kept: outcomes and in-flight OAuth state
//! live entirely in encrypted browser cookies.
//!
//! # Example
//!
//! ```no_run
//! use signet_auth::{auth_routes, AuthConfig, AuthService, AuthState};
//! use std::sync::Arc;
//!
//! let config = AuthConfig::default().with_env_fallbacks();
//! let template = std::fs::read_to_string("server/static/index.html").unwrap();
//! let auth_service = Arc::new(AuthService::new(config, &template).unwrap());
//! let auth_state = AuthState::new(auth_service);
//! let app: axum::Router = auth_routes(auth_state.registry()).with_state(auth_state);
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod oauth;
pub mod outcome;
pub mod providers;
pub mod routes;
pub mod service;
pub mod session;
pub mod views;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use std::ops::Deref;
use std::sync::Arc;

// Re-export commonly used types
pub use codec::CookieCodec;
pub use config::AuthConfig;
pub use error::{AuthError, ErrorDescriptor};
pub use oauth::{AuthorizationRequest, Credentials, OAuthClient, Oauth2Client};
pub use outcome::{AuthOutcome, ProviderStatus};
pub use providers::{ProviderDescriptor, ProviderRegistry};
pub use routes::auth_routes;
pub use service::AuthService;
pub use session::OAuthTempState;

/// State wrapper for AuthService that implements FromRef for Key
/// This allows PrivateCookieJar to extract the cookie key from state
#[derive(Clone)]
pub struct AuthState {
    inner: Arc<AuthService>,
}

impl AuthState {
    pub fn new(auth_service: Arc<AuthService>) -> Self {
        Self {
            inner: auth_service,
        }
    }
}

impl Deref for AuthState {
    type Target = AuthService;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl From<Arc<AuthService>> for AuthState {
    fn from(service: Arc<AuthService>) -> Self {
        Self::new(service)
    }
}

/// Implement FromRef to allow PrivateCookieJar to extract Key from AuthState
impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key()
    }
}
