//! Capability registry
//!
//! Provides [`CapabilityRegistry`] for resolving population capabilities by
//! the identifiers named in chain metadata.

use super::{CallbackCapability, Capability, Completion, FnCapability, StaticCapability};
use crate::types::{OptionEntry, PopulateRequest};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

/// Registry of named population capabilities
///
/// Passed into the engine explicitly; nothing is resolved from global state.
#[derive(Default, Clone)]
pub struct CapabilityRegistry {
    capabilities: HashMap<String, Arc<dyn Capability>>,
}

impl CapabilityRegistry {
    /// Create new empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            capabilities: HashMap::new(),
        }
    }

    /// Register a capability under `name`, replacing any previous one
    pub fn register(&mut self, name: impl Into<String>, capability: Arc<dyn Capability>) {
        self.capabilities.insert(name.into(), capability);
    }

    /// Register an async function
    pub fn register_fn<F, Fut>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(PopulateRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Vec<OptionEntry>> + Send + 'static,
    {
        self.register(name, Arc::new(FnCapability::new(f)));
    }

    /// Register a callback-style function
    pub fn register_callback<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(PopulateRequest, Completion) + Send + Sync + 'static,
    {
        self.register(name, Arc::new(CallbackCapability::new(f)));
    }

    /// Register fixed lists
    pub fn register_static(&mut self, name: impl Into<String>, capability: StaticCapability) {
        self.register(name, Arc::new(capability));
    }

    /// Builder form of [`register`](Self::register)
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, capability: Arc<dyn Capability>) -> Self {
        self.register(name, capability);
        self
    }

    /// Look up a capability
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Capability>> {
        self.capabilities.get(name).cloned()
    }

    /// Check if capability exists
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.capabilities.contains_key(name)
    }

    /// Remove capability
    #[inline]
    pub fn remove(&mut self, name: &str) -> bool {
        self.capabilities.remove(name).is_some()
    }

    /// Registered names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.capabilities.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Get number of registered capabilities
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }
}

impl std::fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("capabilities", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authors() -> StaticCapability {
        StaticCapability::new(vec![
            OptionEntry::new("Hemmingway", "h"),
            OptionEntry::new("Cuelo", "c"),
        ])
    }

    #[test]
    fn registry_new_empty() {
        let registry = CapabilityRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn registry_register() {
        let mut registry = CapabilityRegistry::new();
        registry.register_static("populateAuthors", authors());
        registry.register_fn("populateBooks", |_request| async { Vec::<OptionEntry>::new() });
        registry.register_callback("populateChapters", |_request, done| done.complete(Vec::new()));

        assert_eq!(registry.len(), 3);
        assert!(registry.contains("populateAuthors"));
        assert_eq!(
            registry.names(),
            vec!["populateAuthors", "populateBooks", "populateChapters"]
        );
    }

    #[test]
    fn registry_remove() {
        let mut registry = CapabilityRegistry::new().with("populateAuthors", Arc::new(authors()));
        assert!(registry.remove("populateAuthors"));
        assert!(!registry.remove("populateAuthors"));
        assert!(registry.get("populateAuthors").is_none());
    }

    #[tokio::test]
    async fn registry_get_fetches() {
        let registry = CapabilityRegistry::new().with("populateAuthors", Arc::new(authors()));
        let capability = registry.get("populateAuthors").unwrap();
        let options = capability.fetch(PopulateRequest::Root).await;
        assert_eq!(options[0].label, "Hemmingway");
    }
}
