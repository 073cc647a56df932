//! Per-field categorical encoders shipped inside a bundle.
//!
//! Codes are the index of the label in `classes`, which the training side
//! stores sorted (same contract as a fitted label encoder).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelEncoder {
    pub classes: Vec<String>,
}

impl LabelEncoder {
    pub fn new<S: Into<String>>(classes: impl IntoIterator<Item = S>) -> Self {
        Self {
            classes: classes.into_iter().map(Into::into).collect(),
        }
    }

    /// Exact match first, then a trimmed case-insensitive match.
    pub fn code(&self, label: &str) -> Option<usize> {
        if let Some(i) = self.classes.iter().position(|c| c == label) {
            return Some(i);
        }
        let wanted = label.trim();
        self.classes
            .iter()
            .position(|c| c.trim().eq_ignore_ascii_case(wanted))
    }

    pub fn knows(&self, label: &str) -> bool {
        self.code(label).is_some()
    }
}

/// Canonical field name → encoder.
pub type EncoderTable = BTreeMap<String, LabelEncoder>;
