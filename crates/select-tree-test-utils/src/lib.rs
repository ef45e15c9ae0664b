//! Testing utilities for the select-tree workspace
//!
//! Shared fixtures, capabilities with test-controlled timing, and helpers.

#![allow(missing_docs)]

use parking_lot::Mutex;
use select_tree::{
    CapabilityRegistry, Completion, Control, ControlId, ControlMetadata, ControlSet,
    MemoryControl, OptionEntry, OptionValue, PopulateRequest, SelectTree, TreeHandle,
    TreeOptions,
};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Upper bound for any single wait in tests
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Await `fut`, panicking if it takes longer than [`TEST_TIMEOUT`]
pub async fn within<F: Future>(fut: F) -> F::Output {
    tokio::time::timeout(TEST_TIMEOUT, fut)
        .await
        .expect("timed out waiting in test")
}

/// Controls plus a tree resolving them
#[derive(Debug)]
pub struct Fixture {
    pub tree: SelectTree,
    pub controls: Arc<ControlSet>,
    pub root: ControlId,
}

impl Fixture {
    pub fn new(
        metadata: HashMap<ControlId, ControlMetadata>,
        registry: CapabilityRegistry,
        root: &str,
    ) -> Self {
        let controls = Arc::new(ControlSet::with_ids(metadata.keys().cloned()));
        let tree = SelectTree::new(Arc::new(metadata), controls.clone(), registry);
        Self {
            tree,
            controls,
            root: ControlId::new(root),
        }
    }

    pub fn control(&self, id: &str) -> Arc<MemoryControl> {
        self.controls
            .get(&ControlId::new(id))
            .unwrap_or_else(|| panic!("no control `{id}` in fixture"))
    }

    pub fn attach(&self, options: TreeOptions) -> TreeHandle {
        self.tree.attach(&self.root, options).expect("attach fixture chain")
    }

    /// `(value, non-placeholder option values)` of a control
    pub fn state(&self, id: &str) -> (String, Vec<String>) {
        let control = self.control(id);
        (control.value().into_string(), option_values(&control))
    }
}

/// Values of a control's options, placeholder excluded
pub fn option_values(control: &MemoryControl) -> Vec<String> {
    control
        .options()
        .into_iter()
        .filter(|entry| !entry.is_placeholder())
        .map(|entry| entry.value.into_string())
        .collect()
}

pub fn authors() -> Vec<OptionEntry> {
    vec![
        OptionEntry::new("Hemmingway", "h"),
        OptionEntry::new("Cuelo", "c"),
    ]
}

pub fn books(author: &OptionValue) -> Vec<OptionEntry> {
    match author.as_str() {
        "h" => vec![
            OptionEntry::new("death in the afternoon", 1),
            OptionEntry::new("the sun also rises", 2),
        ],
        "c" => vec![
            OptionEntry::new("by the river piedra", 1),
            OptionEntry::new("the alchemist", 2),
        ],
        _ => Vec::new(),
    }
}

pub fn chapters() -> Vec<OptionEntry> {
    (0..10).map(|n| OptionEntry::new(n.to_string(), n)).collect()
}

pub fn library_metadata() -> HashMap<ControlId, ControlMetadata> {
    HashMap::from([
        (
            ControlId::new("authors"),
            ControlMetadata::new()
                .with_callback("populateAuthors")
                .with_child("books", "populateBooks"),
        ),
        (
            ControlId::new("books"),
            ControlMetadata::new().with_child("chapters", "populateChapters"),
        ),
        (ControlId::new("chapters"), ControlMetadata::new()),
    ])
}

/// Immediate capabilities for the authors/books/chapters chain
pub fn library_registry() -> CapabilityRegistry {
    let mut registry = CapabilityRegistry::new();
    registry.register_fn("populateAuthors", |_request| async { authors() });
    registry.register_callback("populateBooks", |request, done| {
        let parent = request.parent().cloned().unwrap_or_default();
        done.complete(books(&parent));
    });
    registry.register_fn("populateChapters", |_request| async { chapters() });
    registry
}

/// authors -> books -> chapters with immediate capabilities
pub fn library() -> Fixture {
    library_with(|_| {})
}

/// Library fixture with capabilities overridden by `customize`
pub fn library_with(customize: impl FnOnce(&mut CapabilityRegistry)) -> Fixture {
    let mut registry = library_registry();
    customize(&mut registry);
    Fixture::new(library_metadata(), registry, "authors")
}

/// Options offered at every link of a [`linear`] chain
pub const LINEAR_FANOUT: usize = 3;

/// Value of option `choice` under `parent` in a [`linear`] chain
pub fn linear_value(parent: &str, choice: usize) -> String {
    if parent.is_empty() {
        choice.to_string()
    } else {
        format!("{parent}.{choice}")
    }
}

/// Values selecting `choices` down a [`linear`] chain
pub fn linear_path(choices: &[usize]) -> Vec<String> {
    let mut parent = String::new();
    choices
        .iter()
        .map(|&choice| {
            parent = linear_value(&parent, choice);
            parent.clone()
        })
        .collect()
}

/// Chain `c0 -> c1 -> ... -> c{len-1}`; each link offers [`LINEAR_FANOUT`]
/// values derived from its parent's value
pub fn linear(len: usize) -> Fixture {
    assert!(len > 0, "linear chain needs at least one link");
    let mut metadata = HashMap::with_capacity(len);
    for i in 0..len {
        let mut meta = ControlMetadata::new();
        if i == 0 {
            meta = meta.with_callback("populate");
        }
        if i + 1 < len {
            meta = meta.with_child(format!("c{}", i + 1), "populate");
        }
        metadata.insert(ControlId::new(format!("c{i}")), meta);
    }

    let mut registry = CapabilityRegistry::new();
    registry.register_fn("populate", |request: PopulateRequest| async move {
        let parent = request.parent().map(|p| p.as_str().to_string()).unwrap_or_default();
        (0..LINEAR_FANOUT)
            .map(|choice| {
                let value = linear_value(&parent, choice);
                OptionEntry::new(format!("option {value}"), value)
            })
            .collect::<Vec<_>>()
    });

    Fixture::new(metadata, registry, "c0")
}

#[derive(Debug, Default)]
struct DeferredQueue {
    pending: Mutex<Vec<(PopulateRequest, Completion)>>,
    arrived: Notify,
}

/// Callback capability whose completions are released by the test
#[derive(Debug, Clone, Default)]
pub struct Deferred {
    queue: Arc<DeferredQueue>,
}

impl Deferred {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register under `name`, replacing any previous capability
    pub fn install(&self, registry: &mut CapabilityRegistry, name: &str) {
        let queue = Arc::clone(&self.queue);
        registry.register_callback(name, move |request, done| {
            queue.pending.lock().push((request, done));
            queue.arrived.notify_waiters();
        });
    }

    pub fn pending(&self) -> usize {
        self.queue.pending.lock().len()
    }

    /// Requests waiting for completion, oldest first
    pub fn requests(&self) -> Vec<PopulateRequest> {
        self.queue
            .pending
            .lock()
            .iter()
            .map(|(request, _)| request.clone())
            .collect()
    }

    /// Remove the request at `position` (0 = oldest)
    pub fn take(&self, position: usize) -> (PopulateRequest, Completion) {
        let mut pending = self.queue.pending.lock();
        assert!(position < pending.len(), "no deferred request at {position}");
        pending.remove(position)
    }

    /// Complete the request at `position` with `entries`
    pub fn complete(&self, position: usize, entries: Vec<OptionEntry>) {
        let (_, done) = self.take(position);
        done.complete(entries);
    }

    /// Wait until at least `count` requests are pending
    pub async fn wait_for(&self, count: usize) {
        within(async {
            loop {
                let arrived = self.queue.arrived.notified();
                if self.pending() >= count {
                    return;
                }
                arrived.await;
            }
        })
        .await;
    }
}
