//! Chain manifests
//!
//! A manifest declares controls, their chain metadata, attach options and
//! static capabilities in one document, so a chain can be described outside
//! of code. TOML, JSON and YAML are accepted.
//!
//! ```toml
//! root = "authors"
//!
//! [options]
//! initial_values = ["h"]
//!
//! [[control]]
//! id = "authors"
//! callback = "populateAuthors"
//! child = "books"
//! child_callback = "populateBooks"
//!
//! [[control]]
//! id = "books"
//!
//! [capabilities.populateAuthors]
//! options = [["Hemmingway", "h"], ["Cuelo", "c"]]
//!
//! [capabilities.populateBooks.by_parent]
//! h = [["the sun also rises", 2]]
//! ```

use crate::capability::{CapabilityRegistry, StaticCapability};
use crate::config::TreeOptions;
use crate::control::{ControlResolver, ControlSet};
use crate::error::ManifestError;
use crate::metadata::{ControlMetadata, MetadataSource};
use crate::tree::SelectTree;
use crate::types::{ControlId, OptionEntry, OptionValue};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

/// Bundled authors/books/chapters manifest used by the `demo` command
pub const DEMO_MANIFEST: &str = include_str!("demo.toml");

/// Supported document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// `.toml`
    Toml,
    /// `.json`
    Json,
    /// `.yaml` / `.yml`
    Yaml,
}

impl Format {
    /// Detect the format from a file extension
    ///
    /// # Errors
    /// Returns `ManifestError::UnsupportedFormat` for any other extension
    pub fn from_path(path: &Path) -> Result<Self, ManifestError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "toml" => Ok(Self::Toml),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => Err(ManifestError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// One declared control
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlSpec {
    /// Control identifier
    pub id: ControlId,
    /// Chain metadata declared on the control
    #[serde(flatten)]
    pub metadata: ControlMetadata,
}

/// Fixed option lists served by a named capability
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapabilitySpec {
    /// Default list (root requests and unknown parents)
    pub options: Vec<OptionEntry>,
    /// Lists keyed by parent value
    #[serde(alias = "byParent")]
    pub by_parent: BTreeMap<OptionValue, Vec<OptionEntry>>,
}

impl CapabilitySpec {
    fn to_capability(&self) -> StaticCapability {
        self.by_parent
            .iter()
            .fold(StaticCapability::new(self.options.clone()), |cap, (parent, options)| {
                cap.with_parent(parent.clone(), options.clone())
            })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Document {
    root: Option<ControlId>,
    #[serde(alias = "controls")]
    control: Vec<ControlSpec>,
    options: TreeOptions,
    capabilities: BTreeMap<String, CapabilitySpec>,
}

/// Validated chain manifest
#[derive(Debug, Clone)]
pub struct ChainManifest {
    root: ControlId,
    controls: Vec<ControlSpec>,
    metadata: HashMap<ControlId, ControlMetadata>,
    options: TreeOptions,
    capabilities: BTreeMap<String, CapabilitySpec>,
}

impl ChainManifest {
    /// Parse a TOML manifest
    ///
    /// # Errors
    /// Returns `ManifestError` on malformed or inconsistent input
    pub fn from_toml_str(input: &str) -> Result<Self, ManifestError> {
        Self::from_document(toml::from_str(input)?)
    }

    /// Parse a JSON manifest
    ///
    /// # Errors
    /// Returns `ManifestError` on malformed or inconsistent input
    pub fn from_json_str(input: &str) -> Result<Self, ManifestError> {
        Self::from_document(serde_json::from_str(input)?)
    }

    /// Parse a YAML manifest
    ///
    /// # Errors
    /// Returns `ManifestError` on malformed or inconsistent input
    pub fn from_yaml_str(input: &str) -> Result<Self, ManifestError> {
        Self::from_document(serde_yaml::from_str(input)?)
    }

    /// Parse `input` in the given format
    ///
    /// # Errors
    /// Returns `ManifestError` on malformed or inconsistent input
    pub fn parse(input: &str, format: Format) -> Result<Self, ManifestError> {
        match format {
            Format::Toml => Self::from_toml_str(input),
            Format::Json => Self::from_json_str(input),
            Format::Yaml => Self::from_yaml_str(input),
        }
    }

    /// Load a manifest file, detecting the format from its extension
    ///
    /// # Errors
    /// Returns `ManifestError` if the file cannot be read or parsed
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let format = Format::from_path(path)?;
        let input = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("Loading {:?} manifest from {}", format, path.display());
        Self::parse(&input, format)
    }

    fn from_document(doc: Document) -> Result<Self, ManifestError> {
        let first = doc.control.first().ok_or(ManifestError::Empty)?;
        let root = doc.root.clone().unwrap_or_else(|| first.id.clone());

        let mut metadata = HashMap::with_capacity(doc.control.len());
        for spec in &doc.control {
            if metadata
                .insert(spec.id.clone(), spec.metadata.clone())
                .is_some()
            {
                return Err(ManifestError::DuplicateControl(spec.id.clone()));
            }
        }
        if !metadata.contains_key(&root) {
            return Err(ManifestError::UnknownRoot(root));
        }

        Ok(Self {
            root,
            controls: doc.control,
            metadata,
            options: doc.options,
            capabilities: doc.capabilities,
        })
    }

    /// Root control of the chain
    #[inline]
    #[must_use]
    pub fn root_id(&self) -> &ControlId {
        &self.root
    }

    /// Declared controls in document order
    #[inline]
    #[must_use]
    pub fn controls(&self) -> &[ControlSpec] {
        &self.controls
    }

    /// Attach options declared by the manifest
    #[inline]
    #[must_use]
    pub fn options(&self) -> &TreeOptions {
        &self.options
    }

    /// Declared capabilities by name
    #[inline]
    #[must_use]
    pub fn capabilities(&self) -> &BTreeMap<String, CapabilitySpec> {
        &self.capabilities
    }

    /// Fresh in-memory controls for every declared control
    #[must_use]
    pub fn control_set(&self) -> ControlSet {
        ControlSet::with_ids(self.controls.iter().map(|spec| spec.id.clone()))
    }

    /// Registry holding one static capability per declared capability
    #[must_use]
    pub fn registry(&self) -> CapabilityRegistry {
        let mut registry = CapabilityRegistry::new();
        for (name, spec) in &self.capabilities {
            registry.register_static(name.clone(), spec.to_capability());
        }
        registry
    }

    /// Build a [`SelectTree`] over fresh in-memory controls
    ///
    /// Returns the tree together with the controls it resolves.
    #[must_use]
    pub fn instantiate(&self) -> (SelectTree, Arc<ControlSet>) {
        let controls = Arc::new(self.control_set());
        let tree = SelectTree::new(
            Arc::new(self.metadata.clone()),
            Arc::clone(&controls) as Arc<dyn ControlResolver>,
            self.registry(),
        );
        (tree, controls)
    }
}

impl MetadataSource for ChainManifest {
    fn metadata(&self, id: &ControlId) -> Option<ControlMetadata> {
        self.metadata.get(id).cloned()
    }
}
