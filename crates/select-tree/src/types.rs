//! Core types for select-tree
//!
//! Defines the values exchanged between capabilities and controls:
//! - Control identifiers
//! - Option values (raw, string-carried)
//! - Option entries (label/value pairs)
//! - Population requests

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Identifier of a selection control
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ControlId(String);

impl ControlId {
    /// Create a control identifier
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ControlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ControlId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ControlId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Raw value carried by an option or held by a control
///
/// The empty value is the "no selection" sentinel. Numeric values are
/// carried as their decimal text, so `1` and `"1"` name the same option.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct OptionValue(String);

impl OptionValue {
    /// The "no selection" sentinel
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self(String::new())
    }

    /// Create a value from text
    #[inline]
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Check for the "no selection" sentinel
    #[inline]
    #[must_use]
    pub fn is_none(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the underlying text
    #[inline]
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&String> for OptionValue {
    fn from(value: &String) -> Self {
        Self(value.clone())
    }
}

macro_rules! option_value_from_number {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for OptionValue {
                fn from(value: $ty) -> Self {
                    Self(value.to_string())
                }
            }
        )*
    };
}

option_value_from_number!(i32, i64, u32, u64, usize);

/// Wire representation accepted for option values
#[derive(Deserialize)]
#[serde(untagged)]
enum RawValue {
    Text(String),
    Signed(i64),
    Unsigned(u64),
    Float(f64),
    Flag(bool),
}

impl<'de> Deserialize<'de> for OptionValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawValue::deserialize(deserializer)?;
        Ok(match raw {
            RawValue::Text(s) => Self(s),
            RawValue::Signed(n) => Self(n.to_string()),
            RawValue::Unsigned(n) => Self(n.to_string()),
            RawValue::Float(n) => Self(n.to_string()),
            RawValue::Flag(b) => Self(b.to_string()),
        })
    }
}

/// One (label, value) option of a selection control
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "EntryRepr")]
pub struct OptionEntry {
    /// Text shown to the user
    pub label: String,
    /// Value submitted when selected
    pub value: OptionValue,
}

impl OptionEntry {
    /// Create an option entry
    #[inline]
    #[must_use]
    pub fn new(label: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }

    /// Create the empty-valued placeholder entry
    #[inline]
    #[must_use]
    pub fn placeholder(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: OptionValue::none(),
        }
    }

    /// Check whether this entry carries the "no selection" value
    #[inline]
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.value.is_none()
    }
}

/// Entries may be written as `["label", value]` pairs or as tables
#[derive(Deserialize)]
#[serde(untagged)]
enum EntryRepr {
    Pair(OptionValue, OptionValue),
    Table { label: OptionValue, value: OptionValue },
}

impl From<EntryRepr> for OptionEntry {
    fn from(repr: EntryRepr) -> Self {
        let (label, value) = match repr {
            EntryRepr::Pair(label, value) | EntryRepr::Table { label, value } => (label, value),
        };
        Self {
            label: label.into_string(),
            value,
        }
    }
}

/// What a population capability is asked to produce
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopulateRequest {
    /// Options for the root control (no parent value)
    Root,
    /// Options for a child control, given its parent's value
    Child {
        /// Current value of the parent control
        parent: OptionValue,
    },
}

impl PopulateRequest {
    /// Parent value, if this is a child request
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<&OptionValue> {
        match self {
            Self::Root => None,
            Self::Child { parent } => Some(parent),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_value_none_is_empty() {
        assert!(OptionValue::none().is_none());
        assert!(OptionValue::default().is_none());
        assert!(!OptionValue::from("h").is_none());
    }

    #[test]
    fn numeric_values_match_text() {
        assert_eq!(OptionValue::from(1), OptionValue::from("1"));
        assert_eq!(OptionValue::from(42u64).as_str(), "42");
    }

    #[test]
    fn option_value_deserializes_numbers() {
        let values: Vec<OptionValue> = serde_json::from_str(r#"["h", 1, 2.5, true]"#).unwrap();
        assert_eq!(values[0].as_str(), "h");
        assert_eq!(values[1].as_str(), "1");
        assert_eq!(values[2].as_str(), "2.5");
        assert_eq!(values[3].as_str(), "true");
    }

    #[test]
    fn entry_deserializes_from_pair_and_table() {
        let entries: Vec<OptionEntry> = serde_json::from_str(
            r#"[["Hemmingway", "h"], {"label": "Cuelo", "value": "c"}, [0, 0]]"#,
        )
        .unwrap();

        assert_eq!(entries[0], OptionEntry::new("Hemmingway", "h"));
        assert_eq!(entries[1], OptionEntry::new("Cuelo", "c"));
        assert_eq!(entries[2], OptionEntry::new("0", 0));
    }

    #[test]
    fn placeholder_carries_empty_value() {
        let entry = OptionEntry::placeholder("Select One");
        assert!(entry.is_placeholder());
        assert_eq!(entry.label, "Select One");
    }

    #[test]
    fn request_parent() {
        assert_eq!(PopulateRequest::Root.parent(), None);
        let request = PopulateRequest::Child {
            parent: OptionValue::from("h"),
        };
        assert_eq!(request.parent().map(OptionValue::as_str), Some("h"));
    }
}
