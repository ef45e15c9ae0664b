//! Attach-time options
//!
//! [`TreeOptions`] can be built in code or loaded from TOML/JSON/YAML.

use crate::error::ManifestError;
use crate::types::OptionValue;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default label of the synthesized placeholder option
pub const DEFAULT_PLACEHOLDER_LABEL: &str = "Select One";

/// Options recognized when attaching a chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeOptions {
    /// Values to pre-select, root first
    #[serde(alias = "initialValues")]
    pub initial_values: Vec<OptionValue>,
    /// Label of the empty-valued placeholder option
    #[serde(alias = "placeholderLabel")]
    pub placeholder_label: String,
    /// Discard completions superseded by a newer population or clear of the
    /// same link. `false` keeps last-writer-wins.
    #[serde(alias = "discardStaleCompletions")]
    pub discard_stale_completions: bool,
}

impl TreeOptions {
    /// Create default options
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With initial values
    #[must_use]
    pub fn with_initial_values<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<OptionValue>,
    {
        self.initial_values = values.into_iter().map(Into::into).collect();
        self
    }

    /// With placeholder label
    #[inline]
    #[must_use]
    pub fn with_placeholder_label(mut self, label: impl Into<String>) -> Self {
        self.placeholder_label = label.into();
        self
    }

    /// Keep last-writer-wins for overlapping populations of one link
    #[inline]
    #[must_use]
    pub fn with_last_writer_wins(mut self) -> Self {
        self.discard_stale_completions = false;
        self
    }

    /// Parse from TOML
    ///
    /// # Errors
    /// Returns `ManifestError::Toml` on malformed input
    pub fn from_toml_str(input: &str) -> Result<Self, ManifestError> {
        Ok(toml::from_str(input)?)
    }

    /// Parse from JSON
    ///
    /// # Errors
    /// Returns `ManifestError::Json` on malformed input
    pub fn from_json_str(input: &str) -> Result<Self, ManifestError> {
        Ok(serde_json::from_str(input)?)
    }

    /// Load from a `.toml`, `.json`, `.yaml` or `.yml` file
    ///
    /// # Errors
    /// Returns `ManifestError` if the file cannot be read or parsed
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        match crate::manifest::Format::from_path(path)? {
            crate::manifest::Format::Toml => Self::from_toml_str(&input),
            crate::manifest::Format::Json => Self::from_json_str(&input),
            crate::manifest::Format::Yaml => Ok(serde_yaml::from_str(&input)?),
        }
    }
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            initial_values: Vec::new(),
            placeholder_label: DEFAULT_PLACEHOLDER_LABEL.to_string(),
            discard_stale_completions: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = TreeOptions::new();
        assert!(options.initial_values.is_empty());
        assert_eq!(options.placeholder_label, "Select One");
        assert!(options.discard_stale_completions);
    }

    #[test]
    fn builder() {
        let options = TreeOptions::new()
            .with_initial_values(["h", "1"])
            .with_placeholder_label("Choose")
            .with_last_writer_wins();
        assert_eq!(options.initial_values, vec![OptionValue::from("h"), OptionValue::from(1)]);
        assert_eq!(options.placeholder_label, "Choose");
        assert!(!options.discard_stale_completions);
    }

    #[test]
    fn parses_legacy_json_spelling() {
        let options = TreeOptions::from_json_str(r#"{"initialValues": ["h", 1]}"#).unwrap();
        assert_eq!(options.initial_values, vec![OptionValue::from("h"), OptionValue::from(1)]);
        assert_eq!(options.placeholder_label, DEFAULT_PLACEHOLDER_LABEL);
    }

    #[test]
    fn parses_toml() {
        let options = TreeOptions::from_toml_str(
            "initial_values = [\"c\", 2]\nplaceholder_label = \"Pick\"\ndiscard_stale_completions = false\n",
        )
        .unwrap();
        assert_eq!(options.initial_values.len(), 2);
        assert_eq!(options.placeholder_label, "Pick");
        assert!(!options.discard_stale_completions);
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(matches!(
            TreeOptions::from_toml_str("initial_values = ["),
            Err(ManifestError::Toml(_))
        ));
    }
}
