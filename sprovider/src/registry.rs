//! Provider registry for runtime provider lookup and swapping.
//!
//! ```rust
//! use sprovider::{ProviderId, ProviderRegistry};
//!
//! let registry = ProviderRegistry::new();
//! assert!(registry.is_empty());
//! assert!(!registry.contains(ProviderId::Gemini));
//! ```

use std::sync::Arc;

use scommon::Registry;

use crate::{ProviderId, TextProvider};

#[derive(Default, Clone)]
pub struct ProviderRegistry {
    providers: Registry<ProviderId, Arc<dyn TextProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<P>(&mut self, provider: P)
    where
        P: TextProvider + 'static,
    {
        self.providers.insert(provider.id(), Arc::new(provider));
    }

    pub fn register_shared(&mut self, provider: Arc<dyn TextProvider>) {
        self.providers.insert(provider.id(), provider);
    }

    pub fn get(&self, provider_id: ProviderId) -> Option<Arc<dyn TextProvider>> {
        self.providers.get(&provider_id).cloned()
    }

    pub fn remove(&mut self, provider_id: ProviderId) -> Option<Arc<dyn TextProvider>> {
        self.providers.remove(&provider_id)
    }

    pub fn contains(&self, provider_id: ProviderId) -> bool {
        self.providers.contains_key(&provider_id)
    }

    /// Registered providers whose adapters report themselves usable.
    pub fn configured(&self) -> Vec<ProviderId> {
        let mut ids = self
            .providers
            .iter()
            .filter(|(_, provider)| provider.is_configured())
            .map(|(id, _)| *id)
            .collect::<Vec<_>>();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
