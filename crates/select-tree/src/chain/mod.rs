//! Chain model
//!
//! A [`Chain`] is the ordered, immutable list of [`Link`]s produced by
//! [`ChainDiscoverer`]. Links reference their controls; they never own them.

mod discovery;

pub use discovery::ChainDiscoverer;

use crate::capability::Capability;
use crate::control::Control;
use crate::types::ControlId;
use std::sync::Arc;

/// Edge from a link to its child
///
/// A link with a child always carries the capability that populates it.
#[derive(Clone)]
pub struct ChildEdge {
    index: usize,
    capability: Arc<dyn Capability>,
    capability_name: String,
}

impl ChildEdge {
    /// Child link index
    #[inline]
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Capability producing the child's options from this link's value
    #[inline]
    #[must_use]
    pub fn capability(&self) -> &Arc<dyn Capability> {
        &self.capability
    }

    /// Registry name of the capability
    #[inline]
    #[must_use]
    pub fn capability_name(&self) -> &str {
        &self.capability_name
    }
}

/// One position in the chain
#[derive(Clone)]
pub struct Link {
    index: usize,
    control: Arc<dyn Control>,
    child: Option<ChildEdge>,
}

impl Link {
    /// Zero-based position, root = 0
    #[inline]
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Control at this position
    #[inline]
    #[must_use]
    pub fn control(&self) -> &Arc<dyn Control> {
        &self.control
    }

    /// Control identifier
    #[inline]
    #[must_use]
    pub fn id(&self) -> &ControlId {
        self.control.id()
    }

    /// Edge to the child, if any
    #[inline]
    #[must_use]
    pub fn child(&self) -> Option<&ChildEdge> {
        self.child.as_ref()
    }

    /// Child index, if any
    #[inline]
    #[must_use]
    pub fn child_index(&self) -> Option<usize> {
        self.child.as_ref().map(ChildEdge::index)
    }

    /// Check for the terminal link
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.child.is_none()
    }
}

impl std::fmt::Debug for Link {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Link")
            .field("index", &self.index)
            .field("control", self.control.id())
            .field("child", &self.child_index())
            .field(
                "populate_child",
                &self.child.as_ref().map(ChildEdge::capability_name),
            )
            .finish()
    }
}

/// Ordered sequence of links, root first
#[derive(Clone)]
pub struct Chain {
    links: Vec<Link>,
    root_capability: Arc<dyn Capability>,
    root_capability_name: String,
}

impl Chain {
    /// Number of links (always at least one)
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Always false; a chain has at least its root
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Root link
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Link {
        &self.links[0]
    }

    /// Capability populating the root
    #[inline]
    #[must_use]
    pub fn root_capability(&self) -> &Arc<dyn Capability> {
        &self.root_capability
    }

    /// Registry name of the root capability
    #[inline]
    #[must_use]
    pub fn root_capability_name(&self) -> &str {
        &self.root_capability_name
    }

    /// Link at `index`
    #[inline]
    #[must_use]
    pub fn link(&self, index: usize) -> Option<&Link> {
        self.links.get(index)
    }

    /// Parent of the link at `index`
    #[inline]
    #[must_use]
    pub fn parent(&self, index: usize) -> Option<&Link> {
        index.checked_sub(1).and_then(|i| self.links.get(i))
    }

    /// Iterate links root first
    pub fn iter(&self) -> impl Iterator<Item = &Link> {
        self.links.iter()
    }

    /// Links strictly after `index`, following child edges
    pub fn beyond(&self, index: usize) -> impl Iterator<Item = &Link> {
        let mut next = self.link(index).and_then(Link::child_index);
        std::iter::from_fn(move || {
            let link = self.link(next?)?;
            next = link.child_index();
            Some(link)
        })
    }

    /// Control identifiers, root first
    #[must_use]
    pub fn ids(&self) -> Vec<&ControlId> {
        self.links.iter().map(Link::id).collect()
    }

    /// Find a link by control id
    #[must_use]
    pub fn position(&self, id: &ControlId) -> Option<usize> {
        self.links.iter().position(|link| link.id() == id)
    }
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain")
            .field("root_capability", &self.root_capability_name)
            .field("links", &self.links)
            .finish()
    }
}
