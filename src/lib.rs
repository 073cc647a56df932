// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod attributes;
pub mod category;
pub mod combine;
pub mod config;
pub mod engine;
pub mod features;
pub mod metrics;
pub mod model;
pub mod normalize;
pub mod rules;
pub mod stats;
pub mod strategy;

// ---- Re-exports for stable public API ----
pub use crate::attributes::{RawAttributes, RawValue};
pub use crate::category::{categorize, Category};
pub use crate::combine::{combine, Combined, Dimension, ScoreResult, ScoreSource, SiteAssessment};
pub use crate::config::{Mode, ScoringConfig};
pub use crate::engine::{top_n, BatchSummary, SuitabilityEngine};
pub use crate::features::{names, FeatureSet, Origin};
pub use crate::model::{ModelBundle, ModelRegistry, PredictError};
pub use crate::normalize::{FieldResolutionPolicy, Normalizer};
pub use crate::rules::{score_climatic, score_geological, RuleVersion};
pub use crate::stats::{coefficient_of_variation, derive_rainfall_stats, Deriver, SeriesStats};
pub use crate::strategy::{ModelBacked, RuleBasedV1, RuleBasedV2, ScoringStrategy};
