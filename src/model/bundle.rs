//! `ModelBundle`: a fitted regressor plus the metadata needed to feed it.
//!
//! Bundles are JSON documents written by the offline training job:
//!
//! ```json
//! {
//!   "id": "geo-rf-2024-06",
//!   "dimension": "geological",
//!   "feature_names": ["Seismic_Zone", "Elevation", "SoilType_Main"],
//!   "scaler": { "mean": [3.0, 120.0, 1.0], "scale": [1.0, 60.0, 1.0] },
//!   "encoders": { "SoilType_Main": { "classes": ["Cambisols", "Vertisols"] } },
//!   "model": { "kind": "linear", "intercept": 50.0, "coefficients": [-4.0, 0.05, 6.0] }
//! }
//! ```

use super::encoder::EncoderTable;
use super::regressor::Regressor;
use super::{BundleError, PredictError};
use crate::combine::Dimension;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Per-column standardization fitted at training time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// `(x - mean) / scale` in place. A zero scale (constant training
    /// column) divides by 1, matching how the scaler was fitted.
    pub fn transform(&self, row: &mut [f64]) -> Result<(), PredictError> {
        if self.mean.len() != row.len() || self.scale.len() != row.len() {
            return Err(PredictError::ScalerMismatch {
                row: row.len(),
                scaler: self.mean.len().min(self.scale.len()),
            });
        }
        for ((x, m), s) in row.iter_mut().zip(&self.mean).zip(&self.scale) {
            let s = if *s == 0.0 { 1.0 } else { *s };
            *x = (*x - m) / s;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelBundle {
    pub id: String,
    pub dimension: Dimension,
    pub feature_names: Vec<String>,
    #[serde(default)]
    pub scaler: Option<StandardScaler>,
    #[serde(default)]
    pub encoders: EncoderTable,
    pub model: Regressor,
}

impl ModelBundle {
    /// Read, parse and validate a bundle file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading model bundle {}", path.display()))?;
        Self::from_json_str(&content)
            .with_context(|| format!("loading model bundle {}", path.display()))
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        let bundle: ModelBundle = serde_json::from_str(s).context("parsing bundle JSON")?;
        bundle.validate()?;
        Ok(bundle)
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    pub fn validate(&self) -> Result<(), BundleError> {
        let n = self.n_features();
        if n == 0 {
            return Err(BundleError::NoFeatures);
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.feature_names.iter().find(|f| !seen.insert(f.as_str())) {
            return Err(BundleError::DuplicateFeature(dup.clone()));
        }
        if let Some(s) = &self.scaler {
            if s.mean.len() != n || s.scale.len() != n {
                return Err(BundleError::ScalerLength {
                    expected: n,
                    mean: s.mean.len(),
                    scale: s.scale.len(),
                });
            }
            if s.mean.iter().chain(&s.scale).any(|v| !v.is_finite()) {
                return Err(BundleError::NonFiniteParameter);
            }
        }
        if let Some((field, _)) = self.encoders.iter().find(|(_, e)| e.classes.is_empty()) {
            return Err(BundleError::EmptyEncoder(field.clone()));
        }
        self.model.validate(n)
    }

    pub fn feature_names(&self) -> Vec<&str> {
        self.feature_names.iter().map(String::as_str).collect()
    }
}
