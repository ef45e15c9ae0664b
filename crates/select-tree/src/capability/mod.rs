//! Population capabilities
//!
//! A capability asynchronously produces the option list for one control.
//! Three shapes are provided:
//!
//! - [`FnCapability`]: an async function of the request
//! - [`CallbackCapability`]: callback style, handed a one-shot [`Completion`]
//! - [`StaticCapability`]: fixed lists, optionally keyed by parent value
//!
//! Capabilities are looked up by name in a [`CapabilityRegistry`].

mod registry;

pub use registry::CapabilityRegistry;

use crate::types::{OptionEntry, OptionValue, PopulateRequest};
use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use tokio::sync::oneshot;

/// Asynchronous producer of option lists
///
/// A capability is trusted to complete. One that never does leaves its
/// control unpopulated; there is no timeout.
#[async_trait]
pub trait Capability: Send + Sync {
    /// Produce the options for `request`
    async fn fetch(&self, request: PopulateRequest) -> Vec<OptionEntry>;
}

/// Capability backed by an async function
pub struct FnCapability<F> {
    f: F,
}

impl<F, Fut> FnCapability<F>
where
    F: Fn(PopulateRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Vec<OptionEntry>> + Send + 'static,
{
    /// Wrap an async function
    #[inline]
    #[must_use]
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut> Capability for FnCapability<F>
where
    F: Fn(PopulateRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Vec<OptionEntry>> + Send + 'static,
{
    async fn fetch(&self, request: PopulateRequest) -> Vec<OptionEntry> {
        (self.f)(request).await
    }
}

/// One-shot completion handed to callback-style capabilities
///
/// Completing consumes the handle, so a list can be delivered at most once.
/// Dropping it without completing means the population never completes.
#[derive(Debug)]
pub struct Completion {
    tx: oneshot::Sender<Vec<OptionEntry>>,
}

impl Completion {
    /// Deliver the option list
    pub fn complete(self, options: impl IntoIterator<Item = OptionEntry>) {
        // Receiver gone means the population was abandoned; nothing to do.
        let _ = self.tx.send(options.into_iter().collect());
    }

    /// Deliver `(label, value)` pairs
    pub fn complete_pairs<L, V>(self, pairs: impl IntoIterator<Item = (L, V)>)
    where
        L: Into<String>,
        V: Into<OptionValue>,
    {
        self.complete(pairs.into_iter().map(|(l, v)| OptionEntry::new(l, v)));
    }
}

/// Capability driven by a completion callback
pub struct CallbackCapability<F> {
    f: F,
}

impl<F> CallbackCapability<F>
where
    F: Fn(PopulateRequest, Completion) + Send + Sync,
{
    /// Wrap a callback-style function
    #[inline]
    #[must_use]
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> Capability for CallbackCapability<F>
where
    F: Fn(PopulateRequest, Completion) + Send + Sync,
{
    async fn fetch(&self, request: PopulateRequest) -> Vec<OptionEntry> {
        let (tx, rx) = oneshot::channel();
        (self.f)(request, Completion { tx });
        if let Ok(options) = rx.await {
            options
        } else {
            tracing::debug!("capability dropped its completion without delivering options");
            std::future::pending().await
        }
    }
}

/// Capability returning fixed lists
///
/// Child requests look up the parent value in `by_parent` and fall back to
/// the default list; root requests always get the default list.
#[derive(Debug, Clone, Default)]
pub struct StaticCapability {
    options: Vec<OptionEntry>,
    by_parent: HashMap<OptionValue, Vec<OptionEntry>>,
}

impl StaticCapability {
    /// Capability returning `options` for every request
    #[must_use]
    pub fn new(options: Vec<OptionEntry>) -> Self {
        Self {
            options,
            by_parent: HashMap::new(),
        }
    }

    /// Capability with no default list (unknown parents get nothing)
    #[must_use]
    pub fn keyed() -> Self {
        Self::default()
    }

    /// Add the list returned for one parent value
    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<OptionValue>, options: Vec<OptionEntry>) -> Self {
        self.by_parent.insert(parent.into(), options);
        self
    }

    /// Resolve the list for a request
    #[must_use]
    pub fn lookup(&self, request: &PopulateRequest) -> Vec<OptionEntry> {
        request
            .parent()
            .and_then(|parent| self.by_parent.get(parent))
            .unwrap_or(&self.options)
            .clone()
    }
}

#[async_trait]
impl Capability for StaticCapability {
    async fn fetch(&self, request: PopulateRequest) -> Vec<OptionEntry> {
        self.lookup(&request)
    }
}
