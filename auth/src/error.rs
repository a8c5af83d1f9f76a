use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("URL parsing error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Template error: {0}")]
    TemplateError(#[from] minijinja::Error),

    #[error("Invalid provider name: {0:?}")]
    InvalidProvider(String),

    #[error("Provider registered twice: {0}")]
    DuplicateProvider(String),

    #[error("Client id or secret not configured for provider {0}")]
    MissingCredentials(String),

    #[error("Outcome cookie for {0} exceeds the browser size limit")]
    CookieTooLarge(String),

    #[error("OAuth state missing or mismatched")]
    InvalidState,

    #[error("OAuth error: {code}")]
    OAuthError {
        code: String,
        description: Option<String>,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Code recorded when a callback carries an error code outside `[a-z_]`.
pub const PROVIDER_ERROR_CODE: &str = "provider_error";

impl AuthError {
    /// Error reported on the callback query string. Only RFC 6749 shaped
    /// values are kept: the code must be `[a-z_]+` and the description plain
    /// printable ASCII without markup characters.
    pub fn from_callback(code: &str, description: Option<&str>) -> Self {
        let code = if is_error_code(code) {
            code.to_string()
        } else {
            PROVIDER_ERROR_CODE.to_string()
        };
        let description = description
            .filter(|d| is_error_description(d))
            .map(str::to_string);
        AuthError::OAuthError { code, description }
    }

    /// Short machine-readable code stored in a failed outcome.
    pub fn code(&self) -> &str {
        match self {
            AuthError::NetworkError(_) => "network_error",
            AuthError::JsonError(_) => "invalid_response",
            AuthError::UrlError(_) | AuthError::ConfigError(_) => "configuration_error",
            AuthError::TemplateError(_) => "template_error",
            AuthError::InvalidProvider(_) | AuthError::DuplicateProvider(_) => "unknown_provider",
            AuthError::MissingCredentials(_) => "missing_credentials",
            AuthError::CookieTooLarge(_) => "cookie_too_large",
            AuthError::InvalidState => "invalid_state",
            AuthError::OAuthError { code, .. } => code,
        }
    }
}

fn is_error_code(code: &str) -> bool {
    !code.is_empty() && code.len() <= 64 && code.bytes().all(|b| b.is_ascii_lowercase() || b == b'_')
}

fn is_error_description(description: &str) -> bool {
    description.len() <= 512
        && description
            .bytes()
            .all(|b| (0x20..=0x7e).contains(&b) && !b"\"\\<>&".contains(&b))
}

/// Error payload persisted in a failed outcome cookie.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDescriptor {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ErrorDescriptor {
    pub fn new(code: impl Into<String>, description: Option<String>) -> Self {
        Self {
            code: code.into(),
            description,
        }
    }
}

impl From<&AuthError> for ErrorDescriptor {
    fn from(error: &AuthError) -> Self {
        let description = match error {
            AuthError::OAuthError { description, .. } => description.clone(),
            other => Some(other.to_string()),
        };
        Self::new(error.code(), description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_keeps_provider_error_code() {
        let error = AuthError::OAuthError {
            code: "access_denied".to_string(),
            description: Some("The user denied the request".to_string()),
        };
        let descriptor = ErrorDescriptor::from(&error);
        assert_eq!(descriptor.code, "access_denied");
        assert_eq!(
            descriptor.description.as_deref(),
            Some("The user denied the request")
        );
    }

    #[test]
    fn test_descriptor_for_missing_credentials() {
        let descriptor = ErrorDescriptor::from(&AuthError::MissingCredentials("github".into()));
        assert_eq!(descriptor.code, "missing_credentials");
        assert!(descriptor.description.unwrap().contains("github"));
    }

    #[test]
    fn test_descriptor_serialization_omits_empty_description() {
        let json = serde_json::to_value(ErrorDescriptor::new("invalid_state", None)).unwrap();
        assert_eq!(json, serde_json::json!({ "code": "invalid_state" }));
    }

    #[test]
    fn test_callback_error_keeps_well_formed_values() {
        let error = AuthError::from_callback("access_denied", Some("User cancelled the login"));
        let descriptor = ErrorDescriptor::from(&error);
        assert_eq!(descriptor.code, "access_denied");
        assert_eq!(descriptor.description.as_deref(), Some("User cancelled the login"));
    }

    #[test]
    fn test_callback_error_drops_markup() {
        let error = AuthError::from_callback(
            "<script>alert(1)</script>",
            Some("<img src=x onerror=alert(2)>"),
        );
        assert_eq!(
            ErrorDescriptor::from(&error),
            ErrorDescriptor::new(PROVIDER_ERROR_CODE, None)
        );

        let error = AuthError::from_callback("Access-Denied", Some("a \"quoted\" & escaped"));
        assert_eq!(
            ErrorDescriptor::from(&error),
            ErrorDescriptor::new(PROVIDER_ERROR_CODE, None)
        );
        assert_eq!(AuthError::from_callback("", None).code(), PROVIDER_ERROR_CODE);
    }
}
