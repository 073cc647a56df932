//! # Scoring strategies
//! One capability, three implementations: the two rule-table revisions and
//! the model-backed predictor. The engine picks them from configuration.

use crate::combine::{Dimension, ScoreSource};
use crate::features::FeatureSet;
use crate::model::{predict, ModelRegistry, PredictError};
use crate::normalize::Normalizer;
use crate::rules::{
    climatic_breakdown_v1, climatic_breakdown_v2, geological_breakdown, RuleVersion,
};
use crate::stats::DEFAULT_MIN_CV_POINTS;
use std::sync::Arc;

pub trait ScoringStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn source(&self) -> ScoreSource;

    /// Score one dimension in `[0, 100]`.
    fn score(&self, dim: Dimension, features: &FeatureSet) -> Result<f64, PredictError>;
}

/// Historical tables: hazard-oriented climatic factors.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedV1;

impl ScoringStrategy for RuleBasedV1 {
    fn name(&self) -> &'static str {
        "rule_based_v1"
    }

    fn source(&self) -> ScoreSource {
        ScoreSource::RuleBasedV1
    }

    fn score(&self, dim: Dimension, features: &FeatureSet) -> Result<f64, PredictError> {
        Ok(match dim {
            Dimension::Geological => geological_breakdown(features).score(),
            Dimension::Climatic => climatic_breakdown_v1(features).score(),
        })
    }
}

/// Current tables: rainfall consistency and river access.
#[derive(Debug, Clone, Copy)]
pub struct RuleBasedV2 {
    pub min_cv_points: usize,
}

impl Default for RuleBasedV2 {
    fn default() -> Self {
        Self {
            min_cv_points: DEFAULT_MIN_CV_POINTS,
        }
    }
}

impl ScoringStrategy for RuleBasedV2 {
    fn name(&self) -> &'static str {
        "rule_based_v2"
    }

    fn source(&self) -> ScoreSource {
        ScoreSource::RuleBasedV2
    }

    fn score(&self, dim: Dimension, features: &FeatureSet) -> Result<f64, PredictError> {
        Ok(match dim {
            Dimension::Geological => geological_breakdown(features).score(),
            Dimension::Climatic => climatic_breakdown_v2(features, self.min_cv_points).score(),
        })
    }
}

/// Rule strategy for a configured revision.
pub fn rule_strategy(version: RuleVersion, min_cv_points: usize) -> Arc<dyn ScoringStrategy> {
    match version {
        RuleVersion::V1 => Arc::new(RuleBasedV1),
        RuleVersion::V2 => Arc::new(RuleBasedV2 { min_cv_points }),
    }
}

/// Bundle-backed scoring. Fails closed with `PredictError::Unavailable` when
/// the dimension has no bundle.
#[derive(Debug, Clone)]
pub struct ModelBacked {
    registry: ModelRegistry,
    normalizer: Normalizer,
}

impl ModelBacked {
    pub fn new(registry: ModelRegistry, normalizer: Normalizer) -> Self {
        Self {
            registry,
            normalizer,
        }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }
}

impl ScoringStrategy for ModelBacked {
    fn name(&self) -> &'static str {
        "model_backed"
    }

    fn source(&self) -> ScoreSource {
        ScoreSource::Model
    }

    fn score(&self, dim: Dimension, features: &FeatureSet) -> Result<f64, PredictError> {
        let bundle = self.registry.require(dim)?;
        let encoded = self.normalizer.encode(features, &bundle.encoders);
        predict(&encoded, bundle)
    }
}
