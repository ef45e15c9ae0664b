//! Chain discovery
//!
//! Walks the child links declared in metadata, starting at the root, and
//! wires up a [`Chain`]. Discovery has no effect on any control.

use super::{Chain, ChildEdge, Link};
use crate::capability::{Capability, CapabilityRegistry};
use crate::control::ControlResolver;
use crate::error::ConfigError;
use crate::metadata::MetadataSource;
use crate::types::ControlId;
use std::collections::HashSet;
use std::sync::Arc;

/// Builds chains from metadata, controls and a capability registry
pub struct ChainDiscoverer<'a> {
    metadata: &'a dyn MetadataSource,
    controls: &'a dyn ControlResolver,
    registry: &'a CapabilityRegistry,
}

impl<'a> ChainDiscoverer<'a> {
    /// Create a discoverer over the given sources
    #[must_use]
    pub fn new(
        metadata: &'a dyn MetadataSource,
        controls: &'a dyn ControlResolver,
        registry: &'a CapabilityRegistry,
    ) -> Self {
        Self {
            metadata,
            controls,
            registry,
        }
    }

    /// Discover the chain rooted at `root`
    ///
    /// # Errors
    /// - `ConfigError::MissingRootCallback` if the root declares no callback
    /// - `ConfigError::MissingChildCallback` if a control has a child but no child callback
    /// - `ConfigError::UnknownCapability` if a callback is not registered
    /// - `ConfigError::UnknownControl` if a control id cannot be resolved
    /// - `ConfigError::Cycle` if a child link revisits a control
    pub fn discover(&self, root: &ControlId) -> Result<Chain, ConfigError> {
        let mut meta = self.metadata.metadata(root).unwrap_or_default();

        let root_capability_name =
            meta.callback
                .clone()
                .ok_or_else(|| ConfigError::MissingRootCallback {
                    control: root.clone(),
                })?;
        let root_capability = self.capability(root, &root_capability_name)?;

        let mut links = Vec::new();
        let mut seen = HashSet::from([root.clone()]);
        let mut current = root.clone();

        loop {
            let index = links.len();
            let control = self
                .controls
                .resolve(&current)
                .ok_or_else(|| ConfigError::UnknownControl(current.clone()))?;

            let child = match (&meta.child, &meta.child_callback) {
                (Some(child), Some(name)) => Some((
                    child.clone(),
                    ChildEdge {
                        index: index + 1,
                        capability: self.capability(&current, name)?,
                        capability_name: name.clone(),
                    },
                )),
                (Some(child), None) => {
                    return Err(ConfigError::MissingChildCallback {
                        control: current,
                        child: child.clone(),
                    });
                }
                (None, Some(name)) => {
                    tracing::debug!(
                        "Ignoring child callback `{}` on terminal control `{}`",
                        name,
                        current
                    );
                    None
                }
                (None, None) => None,
            };

            let (next, edge) = match child {
                Some((id, edge)) => (Some(id), Some(edge)),
                None => (None, None),
            };

            links.push(Link {
                index,
                control,
                child: edge,
            });

            let Some(next) = next else { break };
            if !seen.insert(next.clone()) {
                return Err(ConfigError::Cycle(next));
            }
            meta = self.metadata.metadata(&next).unwrap_or_default();
            current = next;
        }

        tracing::debug!(
            "Discovered chain of {} links from `{}`: {:?}",
            links.len(),
            root,
            links.iter().map(|l| l.id().as_str()).collect::<Vec<_>>()
        );

        Ok(Chain {
            links,
            root_capability,
            root_capability_name,
        })
    }

    fn capability(&self, control: &ControlId, name: &str) -> Result<Arc<dyn Capability>, ConfigError> {
        self.registry
            .get(name)
            .ok_or_else(|| ConfigError::UnknownCapability {
                control: control.clone(),
                name: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::StaticCapability;
    use crate::control::ControlSet;
    use crate::metadata::{ControlMetadata, MockMetadataSource};
    use crate::types::OptionEntry;
    use std::collections::HashMap;

    fn registry() -> CapabilityRegistry {
        let mut registry = CapabilityRegistry::new();
        registry.register_static(
            "populateAuthors",
            StaticCapability::new(vec![OptionEntry::new("Hemmingway", "h")]),
        );
        registry.register_static("populateBooks", StaticCapability::keyed());
        registry.register_static("populateChapters", StaticCapability::keyed());
        registry
    }

    fn library_metadata() -> HashMap<ControlId, ControlMetadata> {
        HashMap::from([
            (
                ControlId::new("author"),
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

    fn controls() -> ControlSet {
        ControlSet::with_ids(["author", "books", "chapters"])
    }

    #[test]
    fn discovers_linear_chain() {
        let (metadata, controls, registry) = (library_metadata(), controls(), registry());
        let chain = ChainDiscoverer::new(&metadata, &controls, &registry)
            .discover(&ControlId::new("author"))
            .unwrap();

        assert_eq!(chain.len(), 3);
        let ids: Vec<&str> = chain.ids().into_iter().map(ControlId::as_str).collect();
        assert_eq!(ids, vec!["author", "books", "chapters"]);
        assert_eq!(chain.root_capability_name(), "populateAuthors");

        let root = chain.root();
        assert_eq!(root.index(), 0);
        assert_eq!(root.child_index(), Some(1));
        assert_eq!(root.child().unwrap().capability_name(), "populateBooks");
        assert_eq!(
            chain.link(1).unwrap().child().unwrap().capability_name(),
            "populateChapters"
        );
        assert!(chain.link(2).unwrap().is_terminal());
    }

    #[test]
    fn single_control_chain() {
        let metadata = HashMap::from([(
            ControlId::new("author"),
            ControlMetadata::new().with_callback("populateAuthors"),
        )]);
        let (controls, registry) = (controls(), registry());
        let chain = ChainDiscoverer::new(&metadata, &controls, &registry)
            .discover(&ControlId::new("author"))
            .unwrap();

        assert_eq!(chain.len(), 1);
        assert!(chain.root().is_terminal());
    }

    #[test]
    fn beyond_walks_descendants() {
        let (metadata, controls, registry) = (library_metadata(), controls(), registry());
        let chain = ChainDiscoverer::new(&metadata, &controls, &registry)
            .discover(&ControlId::new("author"))
            .unwrap();

        let beyond: Vec<usize> = chain.beyond(0).map(Link::index).collect();
        assert_eq!(beyond, vec![1, 2]);
        assert_eq!(chain.beyond(2).count(), 0);
        assert_eq!(chain.parent(0).map(Link::index), None);
        assert_eq!(chain.parent(2).map(Link::index), Some(1));
    }

    #[test]
    fn rejects_missing_root_callback() {
        let mut metadata = library_metadata();
        metadata.insert(
            ControlId::new("author"),
            ControlMetadata::new().with_child("books", "populateBooks"),
        );
        let (controls, registry) = (controls(), registry());
        let err = ChainDiscoverer::new(&metadata, &controls, &registry)
            .discover(&ControlId::new("author"))
            .unwrap_err();

        assert_eq!(
            err,
            ConfigError::MissingRootCallback {
                control: ControlId::new("author")
            }
        );
    }

    #[test]
    fn rejects_missing_child_callback() {
        let mut metadata = library_metadata();
        metadata.insert(
            ControlId::new("books"),
            ControlMetadata {
                child: Some(ControlId::new("chapters")),
                ..ControlMetadata::default()
            },
        );
        let (controls, registry) = (controls(), registry());
        let err = ChainDiscoverer::new(&metadata, &controls, &registry)
            .discover(&ControlId::new("author"))
            .unwrap_err();

        assert_eq!(
            err,
            ConfigError::MissingChildCallback {
                control: ControlId::new("books"),
                child: ControlId::new("chapters"),
            }
        );
    }

    #[test]
    fn rejects_unknown_capability() {
        let metadata = library_metadata();
        let controls = controls();
        let mut registry = registry();
        registry.remove("populateChapters");

        let err = ChainDiscoverer::new(&metadata, &controls, &registry)
            .discover(&ControlId::new("author"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownCapability { ref name, .. } if name == "populateChapters"));
    }

    #[test]
    fn rejects_unknown_child_control() {
        let metadata = library_metadata();
        let controls = ControlSet::with_ids(["author", "books"]);
        let registry = registry();

        let err = ChainDiscoverer::new(&metadata, &controls, &registry)
            .discover(&ControlId::new("author"))
            .unwrap_err();
        assert_eq!(err, ConfigError::UnknownControl(ControlId::new("chapters")));
    }

    #[test]
    fn rejects_cycle() {
        let mut metadata = library_metadata();
        metadata.insert(
            ControlId::new("chapters"),
            ControlMetadata::new().with_child("author", "populateBooks"),
        );
        let (controls, registry) = (controls(), registry());

        let err = ChainDiscoverer::new(&metadata, &controls, &registry)
            .discover(&ControlId::new("author"))
            .unwrap_err();
        assert_eq!(err, ConfigError::Cycle(ControlId::new("author")));
    }

    #[test]
    fn terminal_child_callback_is_ignored() {
        let mut metadata = library_metadata();
        metadata.insert(
            ControlId::new("chapters"),
            ControlMetadata {
                child_callback: Some("populateChapters".into()),
                ..ControlMetadata::default()
            },
        );
        let (controls, registry) = (controls(), registry());
        let chain = ChainDiscoverer::new(&metadata, &controls, &registry)
            .discover(&ControlId::new("author"))
            .unwrap();
        assert!(chain.link(2).unwrap().is_terminal());
    }

    #[test]
    fn queries_metadata_once_per_control() {
        let mut metadata = MockMetadataSource::new();
        metadata
            .expect_metadata()
            .withf(|id| id.as_str() == "author")
            .times(1)
            .returning(|_| {
                Some(
                    ControlMetadata::new()
                        .with_callback("populateAuthors")
                        .with_child("books", "populateBooks"),
                )
            });
        metadata
            .expect_metadata()
            .withf(|id| id.as_str() == "books")
            .times(1)
            .returning(|_| None);

        let (controls, registry) = (controls(), registry());
        let chain = ChainDiscoverer::new(&metadata, &controls, &registry)
            .discover(&ControlId::new("author"))
            .unwrap();
        assert_eq!(chain.len(), 2);
    }
}
