//! # Model-backed prediction
//! Bundles produced by the offline training job, the stateless predictor
//! that evaluates them, and the read-only registry holding one bundle per
//! dimension.

pub mod bundle;
pub mod encoder;
pub mod predictor;
pub mod regressor;
pub mod registry;

use crate::combine::Dimension;
use thiserror::Error;

pub use bundle::{ModelBundle, StandardScaler};
pub use encoder::{EncoderTable, LabelEncoder};
pub use predictor::{align, predict};
pub use regressor::{Node, Regressor, Tree};
pub use registry::ModelRegistry;

/// Why a model-backed score could not be produced. Every variant leads to a
/// rule-based fallback for that dimension.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictError {
    #[error("{dimension} model unavailable")]
    Unavailable { dimension: Dimension },
    #[error("bundle `{bundle}` shares no features with the input")]
    FeatureMismatch { bundle: String },
    #[error("scaler expects {scaler} columns, row has {row}")]
    ScalerMismatch { row: usize, scaler: usize },
    #[error("model produced a non-finite value")]
    NonFiniteOutput,
    #[error("model error: {0}")]
    Model(String),
}

/// Structural defects found while loading a bundle.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BundleError {
    #[error("bundle lists no features")]
    NoFeatures,
    #[error("feature `{0}` listed twice")]
    DuplicateFeature(String),
    #[error("scaler has {mean} means and {scale} scales for {expected} features")]
    ScalerLength {
        expected: usize,
        mean: usize,
        scale: usize,
    },
    #[error("linear model has {found} coefficients for {expected} features")]
    CoefficientCount { expected: usize, found: usize },
    #[error("encoder for `{0}` has no classes")]
    EmptyEncoder(String),
    #[error("random forest has no trees")]
    EmptyForest,
    #[error("tree {tree} has no nodes")]
    EmptyTree { tree: usize },
    #[error("tree {tree} node {node} splits on feature {feature}, bundle has {n_features}")]
    SplitFeatureOutOfRange {
        tree: usize,
        node: usize,
        feature: usize,
        n_features: usize,
    },
    #[error("tree {tree} node {node} has a child index that is not ahead of it")]
    BadChildIndex { tree: usize, node: usize },
    #[error("bundle contains a non-finite parameter")]
    NonFiniteParameter,
    #[error("bundle is for the {found} dimension, expected {expected}")]
    WrongDimension {
        expected: Dimension,
        found: Dimension,
    },
}
