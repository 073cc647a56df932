//! # Rule-based scoring engine
//! Each factor contributes an independent, bounded point value from a
//! piecewise bucket table; contributions are summed and clamped to 100.
//!
//! Factors whose inputs were not observed are skipped (0 points), so sparse
//! data lowers the score instead of failing.
//!
//! Two climatic formulations exist:
//! - `v2` (canonical): rainfall average, monsoon intensity, rainfall
//!   consistency (CV), NDVI, river flow rate, river distance.
//! - `v1` (historical): rainfall average, monsoon intensity, rainfall stddev,
//!   NDVI, temperature stability, heatwave days, flood risk, cyclone exposure.
//!
//! The geological table is shared by both.

pub mod climatic;
pub mod geological;

use serde::{Deserialize, Serialize};

pub use climatic::{climatic_breakdown_v1, climatic_breakdown_v2, score_climatic, score_climatic_v1};
pub use geological::{geological_breakdown, score_geological};

pub const MAX_SCORE: f64 = 100.0;

/// Rule table revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleVersion {
    V1,
    #[default]
    V2,
}

impl std::str::FromStr for RuleVersion {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v1" | "1" => Ok(RuleVersion::V1),
            "v2" | "2" => Ok(RuleVersion::V2),
            other => anyhow::bail!("unknown rule version: {other}"),
        }
    }
}

/// One interval of a bucket table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Band {
    /// `lo <= x <= hi`
    Within(f64, f64),
    /// `x <= hi`
    AtMost(f64),
    /// `x < hi`
    Below(f64),
    /// `x == v`
    Equals(f64),
}

impl Band {
    pub fn contains(&self, x: f64) -> bool {
        match *self {
            Band::Within(lo, hi) => lo <= x && x <= hi,
            Band::AtMost(hi) => x <= hi,
            Band::Below(hi) => x < hi,
            Band::Equals(v) => x == v,
        }
    }
}

/// Ordered bands, first match wins; `otherwise` when none match.
///
/// Because earlier bands win, an outer band like `Within(600, 1500)` listed
/// after `Within(800, 1200)` only scores the two flanks.
#[derive(Debug, Clone, Copy)]
pub struct BucketTable {
    pub factor: &'static str,
    pub bands: &'static [(Band, f64)],
    pub otherwise: f64,
}

impl BucketTable {
    pub fn points(&self, x: f64) -> f64 {
        self.bands
            .iter()
            .find(|(band, _)| band.contains(x))
            .map(|(_, p)| *p)
            .unwrap_or(self.otherwise)
    }

    /// Highest value this table can contribute.
    pub fn max_points(&self) -> f64 {
        self.bands
            .iter()
            .map(|(_, p)| *p)
            .fold(self.otherwise, f64::max)
    }

    /// Contribution for an optional input; `None` is skipped.
    fn contribute(&self, x: Option<f64>) -> Option<Contribution> {
        x.map(|v| Contribution {
            factor: self.factor,
            input: Some(v),
            points: self.points(v),
        })
    }
}

/// Points awarded by a single factor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contribution {
    pub factor: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<f64>,
    pub points: f64,
}

/// Per-factor explanation of a rule score.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Breakdown {
    pub contributions: Vec<Contribution>,
}

impl Breakdown {
    fn push(&mut self, c: Option<Contribution>) {
        if let Some(c) = c {
            self.contributions.push(c);
        }
    }

    pub fn raw_total(&self) -> f64 {
        self.contributions.iter().map(|c| c.points).sum()
    }

    /// Sum of contributions clamped to `[0, 100]`.
    pub fn score(&self) -> f64 {
        self.raw_total().clamp(0.0, MAX_SCORE)
    }

    pub fn points_for(&self, factor: &str) -> Option<f64> {
        self.contributions
            .iter()
            .find(|c| c.factor == factor)
            .map(|c| c.points)
    }
}
