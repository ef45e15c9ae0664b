//! Populator
//!
//! The single place where option lists are written. A population is issued
//! synchronously (claiming a new generation for its link) and completed
//! asynchronously once the capability delivers its list.
//!
//! Every issue and every clear bumps the link's generation. A completion
//! whose generation is no longer current is discarded, so a slow response
//! can never overwrite a newer population or a cascade clear.

use crate::capability::Capability;
use crate::chain::Chain;
use crate::config::TreeOptions;
use crate::control::Control;
use crate::types::{OptionEntry, OptionValue, PopulateRequest};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Result of one population or clear
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopulateOutcome {
    /// Options replaced with `entries` capability results (placeholder not counted)
    Applied {
        /// Number of entries delivered by the capability
        entries: usize,
    },
    /// A newer population or clear of the same link won
    Superseded,
    /// Options cleared without consulting a capability
    Cleared,
}

impl PopulateOutcome {
    /// Check if the capability's list was written
    #[inline]
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

#[derive(Debug, Default)]
struct Tracker {
    count: AtomicUsize,
    idle: Notify,
}

#[derive(Debug)]
struct InFlight {
    tracker: Arc<Tracker>,
}

impl InFlight {
    fn enter(tracker: &Arc<Tracker>) -> Self {
        tracker.count.fetch_add(1, Ordering::SeqCst);
        Self {
            tracker: Arc::clone(tracker),
        }
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if self.tracker.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.tracker.idle.notify_waiters();
        }
    }
}

/// An issued, not yet completed population
#[must_use = "a population does nothing until completed"]
pub struct Population {
    index: usize,
    generation: u64,
    control: Arc<dyn Control>,
    capability: Arc<dyn Capability>,
    request: PopulateRequest,
    _in_flight: InFlight,
}

impl Population {
    /// Link being populated
    #[inline]
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Generation claimed at issue time
    #[inline]
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Request passed to the capability
    #[inline]
    #[must_use]
    pub fn request(&self) -> &PopulateRequest {
        &self.request
    }
}

impl std::fmt::Debug for Population {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Population")
            .field("index", &self.index)
            .field("generation", &self.generation)
            .field("control", self.control.id())
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}

/// Drives capabilities and writes option lists for one chain
pub struct Populator {
    chain: Arc<Chain>,
    generations: Vec<Mutex<u64>>,
    placeholder_label: String,
    discard_stale: bool,
    tracker: Arc<Tracker>,
}

impl Populator {
    /// Create a populator for `chain`
    #[must_use]
    pub fn new(chain: Arc<Chain>, options: &TreeOptions) -> Self {
        let generations = (0..chain.len()).map(|_| Mutex::new(0)).collect();
        Self {
            chain,
            generations,
            placeholder_label: options.placeholder_label.clone(),
            discard_stale: options.discard_stale_completions,
            tracker: Arc::new(Tracker::default()),
        }
    }

    /// Chain being populated
    #[inline]
    #[must_use]
    pub fn chain(&self) -> &Arc<Chain> {
        &self.chain
    }

    /// Current generation of a link
    #[must_use]
    pub fn generation(&self, index: usize) -> u64 {
        self.generations.get(index).map_or(0, |g| *g.lock())
    }

    /// Number of issued populations not yet completed or dropped
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.tracker.count.load(Ordering::SeqCst)
    }

    /// Issue the root population
    pub fn issue_root(&self) -> Population {
        let root = self.chain.root();
        Population {
            index: 0,
            generation: self.bump(0),
            control: Arc::clone(root.control()),
            capability: Arc::clone(self.chain.root_capability()),
            request: PopulateRequest::Root,
            _in_flight: InFlight::enter(&self.tracker),
        }
    }

    /// Issue a population of link `index` from its parent's value
    ///
    /// Returns `None` for the root or an index outside the chain.
    pub fn issue_child(&self, index: usize, parent: OptionValue) -> Option<Population> {
        let link = self.chain.link(index)?;
        let edge = self.chain.parent(index)?.child()?;
        Some(Population {
            index,
            generation: self.bump(index),
            control: Arc::clone(link.control()),
            capability: Arc::clone(edge.capability()),
            request: PopulateRequest::Child { parent },
            _in_flight: InFlight::enter(&self.tracker),
        })
    }

    /// Run an issued population to completion and write its options
    pub async fn complete(&self, population: Population) -> PopulateOutcome {
        let Population {
            index,
            generation,
            control,
            capability,
            request,
            _in_flight,
        } = population;

        tracing::debug!(
            link = index,
            generation,
            "Populating `{}` with {:?}",
            control.id(),
            request
        );
        let entries = capability.fetch(request).await;

        let current = self.generations[index].lock();
        if self.discard_stale && *current != generation {
            tracing::debug!(
                link = index,
                generation,
                current = *current,
                "Discarding stale options for `{}`",
                control.id()
            );
            return PopulateOutcome::Superseded;
        }

        let count = entries.len();
        control.replace_options(self.render(entries));
        drop(current);

        tracing::debug!(link = index, "Populated `{}` with {} options", control.id(), count);
        PopulateOutcome::Applied { entries: count }
    }

    /// Populate the root
    pub async fn populate_root(&self) -> PopulateOutcome {
        let population = self.issue_root();
        self.complete(population).await
    }

    /// Populate link `index` from `parent`
    ///
    /// An out-of-range index or the root yields `Superseded` without effect.
    pub async fn populate_child(&self, index: usize, parent: OptionValue) -> PopulateOutcome {
        match self.issue_child(index, parent) {
            Some(population) => self.complete(population).await,
            None => {
                tracing::warn!("No child population available for link {}", index);
                PopulateOutcome::Superseded
            }
        }
    }

    /// Clear the options of link `index`
    ///
    /// Supersedes any population of that link still in flight.
    pub fn clear(&self, index: usize) -> PopulateOutcome {
        let Some(link) = self.chain.link(index) else {
            return PopulateOutcome::Superseded;
        };
        let mut current = self.generations[index].lock();
        *current += 1;
        link.control().replace_options(Vec::new());
        tracing::trace!(link = index, "Cleared `{}`", link.id());
        PopulateOutcome::Cleared
    }

    /// Render a capability result as a full option list
    ///
    /// Non-empty results get the placeholder prepended; empty results stay empty.
    #[must_use]
    pub fn render(&self, entries: Vec<OptionEntry>) -> Vec<OptionEntry> {
        if entries.is_empty() {
            return entries;
        }
        let mut options = Vec::with_capacity(entries.len() + 1);
        options.push(OptionEntry::placeholder(self.placeholder_label.clone()));
        options.extend(entries);
        options
    }

    /// Wait until no population is in flight
    ///
    /// Never returns while a capability that will not complete is pending.
    pub async fn settled(&self) {
        loop {
            let idle = self.tracker.idle.notified();
            if self.in_flight() == 0 {
                return;
            }
            idle.await;
        }
    }

    fn bump(&self, index: usize) -> u64 {
        let mut generation = self.generations[index].lock();
        *generation += 1;
        *generation
    }
}

impl std::fmt::Debug for Populator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Populator")
            .field("links", &self.chain.len())
            .field("placeholder_label", &self.placeholder_label)
            .field("discard_stale", &self.discard_stale)
            .field("in_flight", &self.in_flight())
            .finish()
    }
}
