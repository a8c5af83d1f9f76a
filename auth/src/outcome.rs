use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ErrorDescriptor;

/// Result of one authentication attempt, persisted per provider in a cookie.
///
/// Serialized as `{"credentials": ...}` or `{"error": ...}`; anything else
/// (both keys, neither, or a null payload) fails to deserialize.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "OutcomeRecord", into = "OutcomeRecord")]
pub enum AuthOutcome {
    Authenticated { credentials: Value },
    Failed { error: Value },
}

#[derive(Serialize, Deserialize)]
struct OutcomeRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    credentials: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<Value>,
}

impl TryFrom<OutcomeRecord> for AuthOutcome {
    type Error = &'static str;

    fn try_from(record: OutcomeRecord) -> Result<Self, Self::Error> {
        match (record.credentials, record.error) {
            (Some(credentials), None) => Ok(AuthOutcome::Authenticated { credentials }),
            (None, Some(error)) => Ok(AuthOutcome::Failed { error }),
            (Some(_), Some(_)) => Err("outcome holds both credentials and error"),
            (None, None) => Err("outcome holds neither credentials nor error"),
        }
    }
}

impl From<AuthOutcome> for OutcomeRecord {
    fn from(outcome: AuthOutcome) -> Self {
        match outcome {
            AuthOutcome::Authenticated { credentials } => OutcomeRecord {
                credentials: Some(credentials),
                error: None,
            },
            AuthOutcome::Failed { error } => OutcomeRecord {
                credentials: None,
                error: Some(error),
            },
        }
    }
}

impl AuthOutcome {
    pub fn authenticated(credentials: impl Serialize) -> Result<Self, serde_json::Error> {
        Ok(AuthOutcome::Authenticated {
            credentials: serde_json::to_value(credentials)?,
        })
    }

    pub fn failed(error: &ErrorDescriptor) -> Self {
        AuthOutcome::Failed {
            error: serde_json::to_value(error).unwrap_or(Value::Null),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthOutcome::Authenticated { .. })
    }
}

/// What the status page shows for one provider.
#[derive(Clone, Debug, PartialEq)]
pub enum ProviderStatus {
    Authenticated(AuthOutcome),
    Failed(AuthOutcome),
    NotAttempted,
}

impl From<Option<AuthOutcome>> for ProviderStatus {
    fn from(outcome: Option<AuthOutcome>) -> Self {
        match outcome {
            Some(outcome @ AuthOutcome::Authenticated { .. }) => ProviderStatus::Authenticated(outcome),
            Some(outcome @ AuthOutcome::Failed { .. }) => ProviderStatus::Failed(outcome),
            None => ProviderStatus::NotAttempted,
        }
    }
}

impl ProviderStatus {
    /// Display state: `auth`, `error` or `none`
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderStatus::Authenticated(_) => "auth",
            ProviderStatus::Failed(_) => "error",
            ProviderStatus::NotAttempted => "none",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProviderStatus::Authenticated(_) => "Authenticated",
            ProviderStatus::Failed(_) => "Authentication Error",
            ProviderStatus::NotAttempted => "Not Authenticated",
        }
    }

    /// Pretty-printed cookie object, `{}` when there is none
    pub fn dump(&self) -> String {
        let value = match self {
            ProviderStatus::Authenticated(outcome) | ProviderStatus::Failed(outcome) => {
                serde_json::to_value(outcome).unwrap_or_default()
            }
            ProviderStatus::NotAttempted => Value::Object(Default::default()),
        };
        serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string())
    }
}
