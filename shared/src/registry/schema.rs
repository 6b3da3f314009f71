//! Label schema of a metric family.
//!
//! A [`LabelSchema`] is the sorted list of label keys captured from a
//! family's first submission. Both series creation and series lookup go
//! through [`LabelSchema::project`], so label values are always laid out in
//! the same key order.

use super::RegistryError;
use crate::models::{Labels, MetricKind};
use std::sync::Arc;

/// Label name reserved for histogram bucket bounds.
pub(crate) const BUCKET_LABEL: &str = "le";

/// Immutable, lexicographically sorted label key list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSchema {
    keys: Arc<[String]>,
}

impl LabelSchema {
    /// Builds a schema from explicit keys.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidLabelName`] for a malformed, duplicate
    /// or reserved key.
    pub fn new<I, S>(keys: I, kind: MetricKind) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        keys.sort();

        for (i, key) in keys.iter().enumerate() {
            if !is_valid_label_name(key)
                || (kind == MetricKind::Histogram && key == BUCKET_LABEL)
                || (i > 0 && keys[i - 1] == *key)
            {
                return Err(RegistryError::InvalidLabelName(key.clone()));
            }
        }

        Ok(Self { keys: keys.into() })
    }

    /// Captures the schema of a first submission.
    ///
    /// # Errors
    ///
    /// Same as [`LabelSchema::new`].
    pub fn from_labels(labels: &Labels, kind: MetricKind) -> Result<Self, RegistryError> {
        Self::new(labels.keys().cloned(), kind)
    }

    /// The sorted keys.
    #[must_use]
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Returns the label values in schema order.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::SchemaMismatch`] unless `labels` has exactly
    /// the schema's key set.
    pub fn project(&self, family: &str, labels: &Labels) -> Result<Vec<String>, RegistryError> {
        if labels.len() == self.keys.len() {
            let values: Option<Vec<String>> =
                self.keys.iter().map(|key| labels.get(key).cloned()).collect();
            if let Some(values) = values {
                return Ok(values);
            }
        }

        Err(RegistryError::SchemaMismatch {
            name: family.to_string(),
            expected: self.keys.to_vec(),
            actual: labels.keys().cloned().collect(),
        })
    }
}

/// Checks `[a-zA-Z_:][a-zA-Z0-9_:]*`.
pub(crate) fn is_valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == ':')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

/// Checks `[a-zA-Z_][a-zA-Z0-9_]*`, excluding the reserved `__` prefix.
pub(crate) fn is_valid_label_name(name: &str) -> bool {
    let mut chars = name.chars();
    !name.starts_with("__")
        && chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
