//! Read-only holder for at most one bundle per dimension.
//!
//! Built once at startup and passed into the engine; there is no write path
//! afterwards, so sharing it across threads needs no locking.

use super::bundle::ModelBundle;
use super::{BundleError, PredictError};
use crate::combine::Dimension;
use crate::config::ModelsConfig;
use crate::metrics::{ensure_metrics_described, BUNDLE_LOAD_FAILURES};
use metrics::counter;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    geological: Option<Arc<ModelBundle>>,
    climatic: Option<Arc<ModelBundle>>,
}

impl ModelRegistry {
    /// No bundles: every prediction falls back to the rule tables.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Place a bundle in the slot named by its own `dimension`.
    pub fn with_bundle(mut self, bundle: ModelBundle) -> Self {
        let dim = bundle.dimension;
        *self.slot_mut(dim) = Some(Arc::new(bundle));
        self
    }

    /// Load every configured bundle. Failures are logged, counted and leave
    /// the slot empty; they never abort startup.
    pub fn load(models: &ModelsConfig) -> Self {
        let mut reg = Self::empty();
        for dim in Dimension::ALL {
            if let Some(path) = models.path(dim) {
                *reg.slot_mut(dim) = load_one(dim, path).map(Arc::new);
            }
        }
        reg
    }

    pub fn get(&self, dim: Dimension) -> Option<&Arc<ModelBundle>> {
        match dim {
            Dimension::Geological => self.geological.as_ref(),
            Dimension::Climatic => self.climatic.as_ref(),
        }
    }

    pub fn require(&self, dim: Dimension) -> Result<&ModelBundle, PredictError> {
        self.get(dim)
            .map(Arc::as_ref)
            .ok_or(PredictError::Unavailable { dimension: dim })
    }

    pub fn is_loaded(&self, dim: Dimension) -> bool {
        self.get(dim).is_some()
    }

    fn slot_mut(&mut self, dim: Dimension) -> &mut Option<Arc<ModelBundle>> {
        match dim {
            Dimension::Geological => &mut self.geological,
            Dimension::Climatic => &mut self.climatic,
        }
    }
}

fn load_one(dim: Dimension, path: &Path) -> Option<ModelBundle> {
    ensure_metrics_described();
    let loaded = ModelBundle::load_from_file(path).and_then(|b| {
        if b.dimension == dim {
            Ok(b)
        } else {
            Err(BundleError::WrongDimension {
                expected: dim,
                found: b.dimension,
            }
            .into())
        }
    });
    match loaded {
        Ok(b) => {
            info!(
                id = %b.id,
                dimension = %dim,
                kind = b.model.kind(),
                features = b.n_features(),
                "model bundle loaded"
            );
            Some(b)
        }
        Err(e) => {
            warn!(
                dimension = %dim,
                path = %path.display(),
                error = ?e,
                "model bundle unusable, rule tables will be used"
            );
            counter!(BUNDLE_LOAD_FAILURES, "dimension" => dim.as_str()).increment(1);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::regressor::Regressor;

    fn bundle(dim: Dimension) -> ModelBundle {
        ModelBundle {
            id: format!("{dim}-test"),
            dimension: dim,
            feature_names: vec!["Elevation".into()],
            scaler: None,
            encoders: Default::default(),
            model: Regressor::Linear {
                intercept: 40.0,
                coefficients: vec![0.0],
            },
        }
    }

    #[test]
    fn bundles_land_in_their_own_slot() {
        let reg = ModelRegistry::empty().with_bundle(bundle(Dimension::Climatic));
        assert!(reg.is_loaded(Dimension::Climatic));
        assert!(!reg.is_loaded(Dimension::Geological));
        assert_eq!(
            reg.require(Dimension::Geological).unwrap_err(),
            PredictError::Unavailable {
                dimension: Dimension::Geological
            }
        );
    }

    #[test]
    fn missing_file_leaves_slot_empty() {
        let models = ModelsConfig {
            geological: Some("does/not/exist.json".into()),
            climatic: None,
        };
        let reg = ModelRegistry::load(&models);
        assert!(!reg.is_loaded(Dimension::Geological));
    }
}
