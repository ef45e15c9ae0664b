//! Public entry point
//!
//! [`SelectTree::attach`] discovers the chain, starts seeding and subscribes
//! the cascade handlers as one setup sequence, returning a [`TreeHandle`].

use crate::capability::CapabilityRegistry;
use crate::cascade::CascadeController;
use crate::chain::{Chain, ChainDiscoverer};
use crate::config::TreeOptions;
use crate::control::{ControlResolver, Subscription};
use crate::error::SelectTreeError;
use crate::metadata::MetadataSource;
use crate::populate::Populator;
use crate::seed::{SeedReport, Seeder};
use crate::types::ControlId;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Attaches chain behavior to root controls
#[derive(Clone)]
pub struct SelectTree {
    metadata: Arc<dyn MetadataSource>,
    controls: Arc<dyn ControlResolver>,
    registry: Arc<CapabilityRegistry>,
}

impl SelectTree {
    /// Create from a metadata source, control resolver and capability registry
    #[must_use]
    pub fn new(
        metadata: Arc<dyn MetadataSource>,
        controls: Arc<dyn ControlResolver>,
        registry: CapabilityRegistry,
    ) -> Self {
        Self {
            metadata,
            controls,
            registry: Arc::new(registry),
        }
    }

    /// Capability registry in use
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    /// Discover the chain rooted at `root` without attaching
    ///
    /// # Errors
    /// Returns `SelectTreeError::Config` if the chain metadata is invalid
    pub fn discover(&self, root: &ControlId) -> Result<Chain, SelectTreeError> {
        let discoverer =
            ChainDiscoverer::new(self.metadata.as_ref(), self.controls.as_ref(), &self.registry);
        Ok(discoverer.discover(root)?)
    }

    /// Attach chain behavior to `root`
    ///
    /// Must be called from within a tokio runtime. Seeding runs as a spawned
    /// task; use [`TreeHandle::wait_seeded`] to await it.
    ///
    /// # Errors
    /// - `SelectTreeError::Config` if discovery fails (nothing is attached)
    /// - `SelectTreeError::NoRuntime` outside a tokio runtime
    pub fn attach(
        &self,
        root: &ControlId,
        options: TreeOptions,
    ) -> Result<TreeHandle, SelectTreeError> {
        let chain = Arc::new(self.discover(root)?);
        let runtime = Handle::try_current().map_err(|_| SelectTreeError::NoRuntime)?;

        tracing::info!(
            "Attaching select tree at `{}` ({} links, {} initial values)",
            root,
            chain.len(),
            options.initial_values.len()
        );

        let populator = Arc::new(Populator::new(Arc::clone(&chain), &options));

        let seeder = Seeder::new(Arc::clone(&populator));
        let initial_values = options.initial_values;
        let seeding = runtime.spawn(async move { seeder.seed(&initial_values).await });

        let subscriptions =
            CascadeController::new(Arc::clone(&populator), runtime).subscribe();

        Ok(TreeHandle {
            chain,
            populator,
            subscriptions: Mutex::new(subscriptions),
            seeding: tokio::sync::Mutex::new(SeedState::Running(seeding)),
        })
    }
}

impl std::fmt::Debug for SelectTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectTree")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
enum SeedState {
    Running(JoinHandle<SeedReport>),
    Done(SeedReport),
}

/// Handle to an attached chain
///
/// Dropping the handle leaves the chain attached; call [`detach`](Self::detach)
/// to remove the change handlers.
#[derive(Debug)]
pub struct TreeHandle {
    chain: Arc<Chain>,
    populator: Arc<Populator>,
    subscriptions: Mutex<Vec<Subscription>>,
    seeding: tokio::sync::Mutex<SeedState>,
}

impl TreeHandle {
    /// Discovered chain
    #[inline]
    #[must_use]
    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    /// Populator driving this chain
    #[inline]
    #[must_use]
    pub fn populator(&self) -> &Arc<Populator> {
        &self.populator
    }

    /// Check whether change handlers are still registered
    #[must_use]
    pub fn is_attached(&self) -> bool {
        !self.subscriptions.lock().is_empty()
    }

    /// Unsubscribe every change handler; returns how many were removed
    ///
    /// Populations already in flight still complete.
    pub fn detach(&self) -> usize {
        let subscriptions = std::mem::take(&mut *self.subscriptions.lock());
        let removed = subscriptions
            .into_iter()
            .map(Subscription::cancel)
            .filter(|removed| *removed)
            .count();
        if removed > 0 {
            tracing::info!("Detached select tree at `{}`", self.chain.root().id());
        }
        removed
    }

    /// Wait for seeding to finish and return its report
    ///
    /// Never returns while a seeding capability that will not complete is
    /// pending.
    pub async fn wait_seeded(&self) -> SeedReport {
        let mut state = self.seeding.lock().await;
        let report = match &mut *state {
            SeedState::Done(report) => return report.clone(),
            SeedState::Running(task) => match task.await {
                Ok(report) => report,
                Err(err) => {
                    tracing::error!("Seeding task failed: {}", err);
                    SeedReport::default()
                }
            },
        };
        *state = SeedState::Done(report.clone());
        report
    }

    /// Wait until no population of this chain is in flight
    pub async fn settled(&self) {
        self.populator.settled().await;
    }
}
