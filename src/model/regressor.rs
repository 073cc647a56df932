//! Fitted regressors a bundle can carry.
//!
//! Trees are stored flat: node 0 is the root and every split points forward
//! to higher indices, so evaluation always terminates.

use super::BundleError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Regressor {
    Linear {
        intercept: f64,
        coefficients: Vec<f64>,
    },
    RandomForest {
        trees: Vec<Tree>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    /// `x[feature] <= threshold` goes left.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

impl Tree {
    fn validate(&self, n_features: usize, tree: usize) -> Result<(), BundleError> {
        if self.nodes.is_empty() {
            return Err(BundleError::EmptyTree { tree });
        }
        for (i, node) in self.nodes.iter().enumerate() {
            match *node {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if feature >= n_features {
                        return Err(BundleError::SplitFeatureOutOfRange {
                            tree,
                            node: i,
                            feature,
                            n_features,
                        });
                    }
                    let forward = |c: usize| c > i && c < self.nodes.len();
                    if !forward(left) || !forward(right) {
                        return Err(BundleError::BadChildIndex { tree, node: i });
                    }
                    if !threshold.is_finite() {
                        return Err(BundleError::NonFiniteParameter);
                    }
                }
                Node::Leaf { value } => {
                    if !value.is_finite() {
                        return Err(BundleError::NonFiniteParameter);
                    }
                }
            }
        }
        Ok(())
    }

    /// Walk from the root to a leaf. `None` if the tree is malformed.
    pub fn evaluate(&self, x: &[f64]) -> Option<f64> {
        let mut idx = 0;
        // A forward-only tree reaches a leaf in at most `len` steps.
        for _ in 0..self.nodes.len() {
            match *self.nodes.get(idx)? {
                Node::Leaf { value } => return Some(value),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if *x.get(feature)? <= threshold { left } else { right };
                }
            }
        }
        None
    }
}

impl Regressor {
    pub fn kind(&self) -> &'static str {
        match self {
            Regressor::Linear { .. } => "linear",
            Regressor::RandomForest { .. } => "random_forest",
        }
    }

    /// Structural checks against the bundle's feature count.
    pub fn validate(&self, n_features: usize) -> Result<(), BundleError> {
        match self {
            Regressor::Linear {
                intercept,
                coefficients,
            } => {
                if coefficients.len() != n_features {
                    return Err(BundleError::CoefficientCount {
                        expected: n_features,
                        found: coefficients.len(),
                    });
                }
                if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
                    return Err(BundleError::NonFiniteParameter);
                }
                Ok(())
            }
            Regressor::RandomForest { trees } => {
                if trees.is_empty() {
                    return Err(BundleError::EmptyForest);
                }
                trees
                    .iter()
                    .enumerate()
                    .try_for_each(|(i, t)| t.validate(n_features, i))
            }
        }
    }

    /// Raw model output for an aligned, scaled row.
    pub fn predict(&self, x: &[f64]) -> Option<f64> {
        match self {
            Regressor::Linear {
                intercept,
                coefficients,
            } => {
                if coefficients.len() != x.len() {
                    return None;
                }
                Some(intercept + coefficients.iter().zip(x).map(|(c, v)| c * v).sum::<f64>())
            }
            Regressor::RandomForest { trees } => {
                if trees.is_empty() {
                    return None;
                }
                let mut sum = 0.0;
                for t in trees {
                    sum += t.evaluate(x)?;
                }
                Some(sum / trees.len() as f64)
            }
        }
    }
}
