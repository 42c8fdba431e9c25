#![forbid(unsafe_code)]

//! Synchronization options.

use indexmap::IndexMap;

#[cfg(feature = "serde")]
use crate::error::Result;

/// How incoming data is merged into a model.
///
/// # Example
///
/// ```
/// use observify::SyncOptions;
///
/// let options = SyncOptions::new().with_array_key("people", "id");
/// assert!(options.deep);
/// assert_eq!(options.key_for("people"), Some("id"));
/// assert_eq!(options.key_for("tags"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SyncOptions {
    /// Recurse into nested composites. When off, nested objects and arrays
    /// are assigned by reference.
    pub deep: bool,
    /// Array-valued property name to the key field its items are matched by.
    /// Applies to that property only, not to arrays nested below it.
    pub array_keys: IndexMap<String, String>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            deep: true,
            array_keys: IndexMap::new(),
        }
    }
}

impl SyncOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Options that only reify top-level properties.
    #[must_use]
    pub fn shallow() -> Self {
        Self::default().with_deep(false)
    }

    #[must_use]
    pub fn with_deep(mut self, deep: bool) -> Self {
        self.deep = deep;
        self
    }

    /// Reconcile the array stored under `property` by the `key` field of its
    /// items instead of by position.
    #[must_use]
    pub fn with_array_key(mut self, property: impl Into<String>, key: impl Into<String>) -> Self {
        self.array_keys.insert(property.into(), key.into());
        self
    }

    #[must_use]
    pub fn key_for(&self, property: &str) -> Option<&str> {
        self.array_keys.get(property).map(String::as_str)
    }

    /// Parse options from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// [`SyncError::Options`](crate::SyncError::Options) if `json` is not a
    /// valid options document.
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_deep_without_keys() {
        let options = SyncOptions::default();
        assert!(options.deep);
        assert!(options.array_keys.is_empty());
        assert!(!SyncOptions::shallow().deep);
    }

    #[test]
    fn later_key_wins() {
        let options = SyncOptions::new()
            .with_array_key("items", "id")
            .with_array_key("items", "uuid");
        assert_eq!(options.key_for("items"), Some("uuid"));
        assert_eq!(options.array_keys.len(), 1);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn from_json_fills_defaults() {
        let options = SyncOptions::from_json(r#"{ "array_keys": { "people": "id" } }"#)
            .unwrap_or_default();
        assert!(options.deep);
        assert_eq!(options.key_for("people"), Some("id"));

        let err = SyncOptions::from_json("{ nope").unwrap_err();
        assert!(matches!(err, crate::SyncError::Options { .. }));
    }
}
