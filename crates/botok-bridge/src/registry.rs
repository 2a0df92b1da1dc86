//! Provider registry the host fills at startup.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::provider::{Language, TranslationProvider};

/// Registry of translation providers, indexed by name and preference key.
#[derive(Default)]
pub struct ProviderRegistry {
    /// Providers indexed by name.
    providers: HashMap<String, Arc<dyn TranslationProvider>>,
    /// Preference key to provider name mapping.
    preference_map: HashMap<String, String>,
}

/// Errors that can occur during registry operations.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryError {
    /// Provider has an empty name or preference key.
    InvalidProvider(String),
    /// Provider with this name already registered.
    AlreadyRegistered(String),
    /// Preference key already claimed by another provider.
    PreferenceKeyConflict { key: String, existing: String },
    /// Provider not found.
    NotFound(String),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidProvider(msg) => write!(f, "Invalid provider: {}", msg),
            Self::AlreadyRegistered(name) => write!(f, "Provider already registered: {}", name),
            Self::PreferenceKeyConflict { key, existing } => {
                write!(f, "Preference key '{}' already claimed by provider '{}'", key, existing)
            }
            Self::NotFound(name) => write!(f, "Provider not found: {}", name),
        }
    }
}

impl std::error::Error for RegistryError {}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .field("preference_map", &self.preference_map)
            .finish()
    }
}

impl ProviderRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a provider.
    pub fn register(&mut self, provider: Arc<dyn TranslationProvider>) -> Result<(), RegistryError> {
        let name = provider.name().to_string();
        let key = provider.preference_key().to_string();

        if name.trim().is_empty() {
            return Err(RegistryError::InvalidProvider("name is empty".to_string()));
        }
        if key.trim().is_empty() {
            return Err(RegistryError::InvalidProvider(format!(
                "'{}' has an empty preference key",
                name
            )));
        }

        if self.providers.contains_key(&name) {
            return Err(RegistryError::AlreadyRegistered(name));
        }
        if let Some(existing) = self.preference_map.get(&key) {
            return Err(RegistryError::PreferenceKeyConflict {
                key,
                existing: existing.clone(),
            });
        }

        tracing::debug!(provider = %name, preference_key = %key, "registered provider");
        self.preference_map.insert(key, name.clone());
        self.providers.insert(name, provider);
        Ok(())
    }

    /// Gets a provider by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn TranslationProvider>> {
        self.providers.get(name)
    }

    /// Gets the provider owning a preference key.
    pub fn get_by_preference(&self, key: &str) -> Option<&Arc<dyn TranslationProvider>> {
        self.preference_map
            .get(key)
            .and_then(|name| self.providers.get(name))
    }

    /// Lists all registered providers, sorted by name.
    pub fn list(&self) -> Vec<&Arc<dyn TranslationProvider>> {
        let mut providers: Vec<_> = self.providers.values().collect();
        providers.sort_by(|a, b| a.name().cmp(b.name()));
        providers
    }

    /// Unregisters a provider by name.
    pub fn unregister(&mut self, name: &str) -> Result<Arc<dyn TranslationProvider>, RegistryError> {
        let provider = self
            .providers
            .remove(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
        self.preference_map.remove(provider.preference_key());
        Ok(provider)
    }

    /// Returns the number of registered providers.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Returns true if no providers are registered.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Calls the provider owning `preference_key`, logging any failure and
    /// returning `None`.
    ///
    /// `None` means "no transformation applied"; the host keeps the segment
    /// as it was.
    pub fn translate_or_skip(
        &self,
        preference_key: &str,
        source: &Language,
        target: &Language,
        text: &str,
    ) -> Option<String> {
        let Some(provider) = self.get_by_preference(preference_key) else {
            tracing::error!(
                preference_key = %preference_key,
                "translation requested from unknown provider"
            );
            return None;
        };

        match provider.translate(source, target, text) {
            Ok(output) => Some(output),
            Err(e) => {
                tracing::error!(
                    provider = %provider.name(),
                    code = e.code(),
                    kind = e.kind().as_str(),
                    error = %e,
                    "provider failed; segment left unchanged"
                );
                None
            }
        }
    }
}
