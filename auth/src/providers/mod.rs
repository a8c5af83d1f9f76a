pub mod catalog;

use serde_json::{Map, Value};

use crate::config::ProviderEntry;
use crate::error::AuthError;
use crate::session::OAUTH_STATE_COOKIE_PREFIX;

pub use catalog::ProviderEndpoints;

/// Path segments already taken by static assets.
const RESERVED_NAMES: &[&str] = &["css", "js", "health"];

/// A configured identity provider
#[derive(Clone, Debug, PartialEq)]
pub struct ProviderDescriptor {
    name: String,
    config: Map<String, Value>,
}

impl ProviderDescriptor {
    pub fn new(name: impl Into<String>, config: Map<String, Value>) -> Result<Self, AuthError> {
        let name = name.into();
        if !is_valid_name(&name) {
            return Err(AuthError::InvalidProvider(name));
        }
        Ok(Self { name, config })
    }

    /// Cookie name, route segment and catalog key
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &Map<String, Value> {
        &self.config
    }

    /// String setting from the provider config
    pub fn setting(&self, key: &str) -> Option<&str> {
        self.config.get(key).and_then(Value::as_str)
    }

    pub fn path(&self) -> String {
        format!("/{}", self.name)
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        && !RESERVED_NAMES.contains(&name)
        && !name.starts_with(OAUTH_STATE_COOKIE_PREFIX)
}

/// Ordered, immutable list of providers. Order is display order.
#[derive(Clone, Debug, Default)]
pub struct ProviderRegistry {
    providers: Vec<ProviderDescriptor>,
}

impl ProviderRegistry {
    pub fn new(providers: Vec<ProviderDescriptor>) -> Result<Self, AuthError> {
        for (index, provider) in providers.iter().enumerate() {
            if providers[..index].iter().any(|p| p.name == provider.name) {
                return Err(AuthError::DuplicateProvider(provider.name.clone()));
            }
        }
        Ok(Self { providers })
    }

    pub fn from_entries(entries: &[ProviderEntry]) -> Result<Self, AuthError> {
        let providers = entries
            .iter()
            .map(|entry| ProviderDescriptor::new(entry.name.clone(), entry.config.clone()))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(providers)
    }

    pub fn get(&self, name: &str) -> Option<&ProviderDescriptor> {
        self.providers.iter().find(|p| p.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProviderDescriptor> {
        self.providers.iter()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl<'a> IntoIterator for &'a ProviderRegistry {
    type Item = &'a ProviderDescriptor;
    type IntoIter = std::slice::Iter<'a, ProviderDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.providers.iter()
    }
}
