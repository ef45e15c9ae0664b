//! Declarative chain metadata
//!
//! Each control may declare the capability that populates it (root only),
//! the capability that populates its child, and the id of that child.

use crate::types::ControlId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Metadata declared on one control
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlMetadata {
    /// Capability populating this control (root only)
    #[serde(default, alias = "data-callback")]
    pub callback: Option<String>,
    /// Child control
    #[serde(default, alias = "data-child")]
    pub child: Option<ControlId>,
    /// Capability populating the child from this control's value
    #[serde(default, alias = "data-child-callback", alias = "childCallback")]
    pub child_callback: Option<String>,
}

impl ControlMetadata {
    /// Empty metadata (a terminal, non-root control)
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With self-population capability
    #[inline]
    #[must_use]
    pub fn with_callback(mut self, name: impl Into<String>) -> Self {
        self.callback = Some(name.into());
        self
    }

    /// With child control and the capability that populates it
    #[inline]
    #[must_use]
    pub fn with_child(mut self, child: impl Into<ControlId>, callback: impl Into<String>) -> Self {
        self.child = Some(child.into());
        self.child_callback = Some(callback.into());
        self
    }
}

/// Lookup interface into the metadata source
#[cfg_attr(test, mockall::automock)]
pub trait MetadataSource: Send + Sync {
    /// Metadata declared on `id`, if any
    fn metadata(&self, id: &ControlId) -> Option<ControlMetadata>;
}

impl<S: std::hash::BuildHasher + Send + Sync> MetadataSource
    for HashMap<ControlId, ControlMetadata, S>
{
    fn metadata(&self, id: &ControlId) -> Option<ControlMetadata> {
        self.get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_fields() {
        let meta = ControlMetadata::new()
            .with_callback("populateAuthors")
            .with_child("books", "populateBooks");
        assert_eq!(meta.callback.as_deref(), Some("populateAuthors"));
        assert_eq!(meta.child, Some(ControlId::new("books")));
        assert_eq!(meta.child_callback.as_deref(), Some("populateBooks"));
    }

    #[test]
    fn accepts_attribute_spellings() {
        let meta: ControlMetadata = serde_json::from_str(
            r#"{"data-callback": "populateAuthors", "data-child": "books", "data-child-callback": "populateBooks"}"#,
        )
        .unwrap();
        assert_eq!(
            meta,
            ControlMetadata::new()
                .with_callback("populateAuthors")
                .with_child("books", "populateBooks")
        );
    }

    #[test]
    fn hashmap_source() {
        let mut source = HashMap::new();
        source.insert(ControlId::new("chapters"), ControlMetadata::new());
        assert!(source.metadata(&ControlId::new("chapters")).is_some());
        assert!(source.metadata(&ControlId::new("books")).is_none());
    }
}
