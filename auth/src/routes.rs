use axum::{
    extract::{Query, State},
    http::{StatusCode, Uri},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{any, get},
    Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, PrivateCookieJar, SameSite};
use serde::Deserialize;

use crate::error::{AuthError, ErrorDescriptor};
use crate::oauth::Credentials;
use crate::outcome::{AuthOutcome, ProviderStatus};
use crate::providers::{ProviderDescriptor, ProviderRegistry};
use crate::session::{oauth_state_cookie_name, OAuthTempState, OAUTH_STATE_TTL_SECONDS};
use crate::AuthState;

/// Query parameters a provider sends back to its route
#[derive(Debug, Default, Deserialize)]
struct AuthCallback {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Create the status page route plus one login route per provider
pub fn auth_routes(registry: &ProviderRegistry) -> Router<AuthState> {
    let mut router = Router::new().route("/", get(status_page));

    for provider in registry {
        let name = provider.name().to_string();
        router = router.route(
            &provider.path(),
            any(
                move |State(auth_state): State<AuthState>,
                      jar: CookieJar,
                      state_jar: PrivateCookieJar,
                      uri: Uri| {
                    let name = name.clone();
                    async move { authenticate(auth_state, &name, jar, state_jar, uri).await }
                },
            ),
        );
    }

    router
}

/// Render every provider's status from the request cookies.
/// Cookies that fail to decode are shown as not attempted and cleared.
pub async fn status_page(
    State(auth_state): State<AuthState>,
    mut jar: CookieJar,
) -> Result<(CookieJar, Html<String>), StatusCode> {
    let statuses = auth_state.statuses(|name| jar.get(name).map(|c| c.value().to_string()));

    for (provider, status) in &statuses {
        if *status == ProviderStatus::NotAttempted && jar.get(provider.name()).is_some() {
            tracing::debug!("Clearing invalid {} cookie", provider.name());
            jar = jar.remove(auth_state.codec().removal(provider.name()));
        }
    }

    let html = auth_state
        .page()
        .render(statuses.iter().map(|(provider, status)| (*provider, status)))
        .map_err(|e| {
            tracing::error!("Failed to render status page: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok((jar, Html(html)))
}

/// Drive the OAuth flow for one provider. Never rejects: every failure ends
/// up as a failed outcome cookie and a redirect to the status page.
async fn authenticate(
    auth_state: AuthState,
    name: &str,
    jar: CookieJar,
    state_jar: PrivateCookieJar,
    uri: Uri,
) -> Response {
    let Some(provider) = auth_state.registry().get(name) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let params = Query::<AuthCallback>::try_from_uri(&uri)
        .map(|Query(params)| params)
        .unwrap_or_default();

    let result = if let Some(error) = params.error {
        Err(AuthError::from_callback(&error, params.error_description.as_deref()))
    } else if let Some(code) = params.code {
        let temp_state = state_jar
            .get(&oauth_state_cookie_name(name))
            .and_then(|cookie| serde_json::from_str::<OAuthTempState>(cookie.value()).ok());
        match temp_state {
            Some(temp_state) if temp_state.matches(name, params.state.as_deref()) => {
                auth_state.client().exchange(provider, &code, &temp_state).await
            }
            _ => Err(AuthError::InvalidState),
        }
    } else {
        return match start_flow(&auth_state, provider, state_jar) {
            Ok(response) => response,
            Err((e, state_jar)) => finish(&auth_state, name, jar, state_jar, Err(e)),
        };
    };

    let state_jar = state_jar.remove(state_cookie(&auth_state, name, String::new()));
    finish(&auth_state, name, jar, state_jar, result)
}

/// In-flight state cookie; `SameSite=Lax` so it survives the cross-site
/// redirect back from the provider
fn state_cookie(auth_state: &AuthState, provider: &str, value: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(oauth_state_cookie_name(provider), value);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(auth_state.config.cookie.secure);
    cookie.set_same_site(SameSite::Lax);
    if let Some(domain) = &auth_state.config.cookie.domain {
        cookie.set_domain(domain.clone());
    }
    cookie
}

/// Redirect to the provider, remembering CSRF/PKCE state in a private cookie
fn start_flow(
    auth_state: &AuthState,
    provider: &ProviderDescriptor,
    state_jar: PrivateCookieJar,
) -> Result<Response, (AuthError, PrivateCookieJar)> {
    let request = match auth_state.client().authorize(provider) {
        Ok(request) => request,
        Err(e) => return Err((e, state_jar)),
    };
    let value = match serde_json::to_string(&request.state) {
        Ok(value) => value,
        Err(e) => return Err((e.into(), state_jar)),
    };

    let mut cookie = state_cookie(auth_state, provider.name(), value);
    cookie.set_max_age(time::Duration::seconds(OAUTH_STATE_TTL_SECONDS));

    tracing::debug!("Redirecting to {} for authorization", provider.name());
    Ok((state_jar.add(cookie), Redirect::to(&request.url)).into_response())
}

/// Store the outcome cookie and send the browser back to the status page
fn finish(
    auth_state: &AuthState,
    name: &str,
    jar: CookieJar,
    state_jar: PrivateCookieJar,
    result: Result<Credentials, AuthError>,
) -> Response {
    let outcome = match result {
        Ok(credentials) => {
            tracing::info!("{} authentication succeeded", name);
            AuthOutcome::authenticated(&credentials).unwrap_or_else(|e| {
                AuthOutcome::failed(&ErrorDescriptor::from(&AuthError::from(e)))
            })
        }
        Err(e) => {
            tracing::warn!("{} authentication failed: {}", name, e);
            AuthOutcome::failed(&ErrorDescriptor::from(&e))
        }
    };

    let cookie = auth_state.codec().encode(name, &outcome).or_else(|e| {
        tracing::error!("Failed to encode {} cookie: {}", name, e);
        let fallback = AuthOutcome::failed(&ErrorDescriptor::from(&e));
        auth_state.codec().encode(name, &fallback)
    });

    match cookie {
        Ok(cookie) => (jar.add(cookie), state_jar, Redirect::to("/")).into_response(),
        Err(e) => {
            tracing::error!("Failed to encode fallback {} cookie: {}", name, e);
            (state_jar, Redirect::to("/")).into_response()
        }
    }
}
