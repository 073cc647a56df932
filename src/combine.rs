//! # Suitability combiner
//! Weighted overall score plus the per-dimension result shapes returned to callers.

use crate::category::{categorize, Category};
use serde::{Deserialize, Serialize};

pub const GEOLOGICAL_WEIGHT: f64 = 0.6;
pub const CLIMATIC_WEIGHT: f64 = 0.4;

/// Which half of the assessment a score belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Geological,
    Climatic,
}

impl Dimension {
    pub const ALL: [Dimension; 2] = [Dimension::Geological, Dimension::Climatic];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Geological => "geological",
            Dimension::Climatic => "climatic",
        }
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a dimension's score came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreSource {
    RuleBasedV1,
    RuleBasedV2,
    Model,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub score: f64,
    pub category: Category,
}

impl ScoreResult {
    pub fn new(score: f64) -> Self {
        Self {
            score,
            category: categorize(score),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Categories {
    pub geological: Category,
    pub climatic: Category,
    pub overall: Category,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Combined {
    pub overall: f64,
    pub categories: Categories,
}

/// `round(0.6 * geo + 0.4 * clim, 1)` plus categories for all three scores.
pub fn combine(geo: f64, clim: f64) -> Combined {
    let overall = round1(GEOLOGICAL_WEIGHT * geo + CLIMATIC_WEIGHT * clim);
    Combined {
        overall,
        categories: Categories {
            geological: categorize(geo),
            climatic: categorize(clim),
            overall: categorize(overall),
        },
    }
}

/// Round half away from zero to one decimal.
pub fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// Display precision for per-dimension scores.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Full assessment of one site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteAssessment {
    pub geological: ScoreResult,
    pub climatic: ScoreResult,
    pub overall: ScoreResult,
    pub sources: ScoreSources,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreSources {
    pub geological: ScoreSource,
    pub climatic: ScoreSource,
}

impl SiteAssessment {
    /// Categories and the overall score come from the unrounded inputs;
    /// the reported dimension scores are rounded to two decimals.
    pub fn from_scores(
        geo: f64,
        clim: f64,
        sources: ScoreSources,
        warnings: Vec<String>,
    ) -> Self {
        let combined = combine(geo, clim);
        Self {
            geological: ScoreResult {
                score: round2(geo),
                category: combined.categories.geological,
            },
            climatic: ScoreResult {
                score: round2(clim),
                category: combined.categories.climatic,
            },
            overall: ScoreResult {
                score: combined.overall,
                category: combined.categories.overall,
            },
            sources,
            warnings,
        }
    }

    pub fn score(&self, dim: Dimension) -> &ScoreResult {
        match dim {
            Dimension::Geological => &self.geological,
            Dimension::Climatic => &self.climatic,
        }
    }
}
