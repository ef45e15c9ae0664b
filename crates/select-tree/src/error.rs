//! Error types for select-tree
//!
//! Provides error handling for:
//! - Chain configuration failures (fatal at discovery)
//! - Initial-value input errors (reported, non-fatal)
//! - Manifest and options parsing failures

use crate::types::ControlId;
use std::path::PathBuf;

/// Main select-tree error type
#[derive(Debug, thiserror::Error)]
pub enum SelectTreeError {
    /// Chain metadata is incomplete or inconsistent
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Manifest or options document could not be loaded
    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// Attach was called outside a tokio runtime
    #[error("no tokio runtime available to drive population")]
    NoRuntime,
}

impl SelectTreeError {
    /// Check if error stems from chain configuration
    #[inline]
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Manifest(_))
    }
}

/// Chain discovery errors
///
/// Discovery fails as a whole; a partially wired chain is never produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Root control has no self-population capability
    #[error("root control `{control}` has no population callback")]
    MissingRootCallback {
        /// Root control
        control: ControlId,
    },

    /// Non-terminal control has no child-population capability
    #[error("control `{control}` links to child `{child}` but has no child population callback")]
    MissingChildCallback {
        /// Parent control
        control: ControlId,
        /// Declared child
        child: ControlId,
    },

    /// Capability identifier not present in the registry
    #[error("control `{control}` names unknown capability `{name}`")]
    UnknownCapability {
        /// Control whose metadata names the capability
        control: ControlId,
        /// Capability identifier
        name: String,
    },

    /// Control identifier resolves to no control
    #[error("control `{0}` could not be resolved")]
    UnknownControl(ControlId),

    /// Child link revisits a control already in the chain
    #[error("control `{0}` appears twice in the chain")]
    Cycle(ControlId),
}

impl ConfigError {
    /// Control the error is reported against
    #[must_use]
    pub fn control(&self) -> &ControlId {
        match self {
            Self::MissingRootCallback { control }
            | Self::MissingChildCallback { control, .. }
            | Self::UnknownCapability { control, .. } => control,
            Self::UnknownControl(control) | Self::Cycle(control) => control,
        }
    }
}

/// Seeding input errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeedError {
    /// More initial values than links
    #[error("invalid initial values: {supplied} supplied for a chain of {chain_len} links")]
    TooManyValues {
        /// Number of values supplied
        supplied: usize,
        /// Number of links in the chain
        chain_len: usize,
    },
}

/// Manifest and options loading errors
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// File could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// TOML parse failure
    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON parse failure
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parse failure
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// File extension not recognized
    #[error("unsupported manifest format: {0}")]
    UnsupportedFormat(String),

    /// Manifest declares no controls
    #[error("manifest declares no controls")]
    Empty,

    /// Same control id declared twice
    #[error("control `{0}` declared more than once")]
    DuplicateControl(ControlId),

    /// Root names a control not in the manifest
    #[error("root control `{0}` is not declared")]
    UnknownRoot(ControlId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_is_configuration() {
        let err: SelectTreeError = ConfigError::UnknownControl(ControlId::new("books")).into();
        assert!(err.is_configuration());
        assert!(!SelectTreeError::NoRuntime.is_configuration());
    }

    #[test]
    fn config_error_reports_control() {
        let err = ConfigError::MissingChildCallback {
            control: ControlId::new("author"),
            child: ControlId::new("books"),
        };
        assert_eq!(err.control().as_str(), "author");
        assert!(err.to_string().contains("books"));
    }

    #[test]
    fn seed_error_message() {
        let err = SeedError::TooManyValues {
            supplied: 4,
            chain_len: 3,
        };
        assert_eq!(
            err.to_string(),
            "invalid initial values: 4 supplied for a chain of 3 links"
        );
    }
}
