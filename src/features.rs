//! Canonical feature vocabulary and the normalized `FeatureSet`.
//!
//! Canonical names follow the column headers of the Gujarat dam catalogue
//! (`Slope(%)`, `Max Height above Foundation (m)`, ...), since both the rule
//! tables and the trained bundles are keyed by them.

use serde::Serialize;
use std::collections::BTreeMap;

pub mod names {
    // Geological / site
    pub const SEISMIC_ZONE: &str = "Seismic_Zone";
    pub const ELEVATION: &str = "Elevation";
    pub const SLOPE: &str = "Slope(%)";
    pub const SOIL_MAIN: &str = "SoilType_Main";
    pub const SOIL_SECONDARY: &str = "SoilType_Secondary";
    pub const DAM_TYPE: &str = "Type";
    pub const LENGTH: &str = "Length (m)";
    pub const MAX_HEIGHT: &str = "Max Height above Foundation (m)";
    pub const LATITUDE: &str = "Latitude";
    pub const LONGITUDE: &str = "Longitude";
    pub const RIVER_DISTANCE: &str = "RiverDistance(km)";
    pub const RIVER_FLOW_RATE: &str = "RiverFlowRate(m/day)";

    // Rainfall
    pub const RAINFALL_YEARS: [&str; 5] = [
        "Rainfall_2020",
        "Rainfall_2021",
        "Rainfall_2022",
        "Rainfall_2023",
        "Rainfall_2024",
    ];
    pub const RAINFALL_5YR_AVG: &str = "Rainfall_5yr_Avg";
    pub const RAINFALL_STDDEV_5YR: &str = "Rainfall_StdDev_5yr";
    pub const MAX_ANNUAL_RAINFALL: &str = "Max_Annual_Rainfall";
    pub const MIN_ANNUAL_RAINFALL: &str = "Min_Annual_Rainfall";
    pub const MONSOON_INTENSITY: &str = "MonsoonIntensityAvg(mm/wet_day)";
    pub const EXTREME_RAINFALL_DAYS: &str = "Extreme_Rainfall_Days";

    // Climate
    pub const FLOOD_RISK_INDEX: &str = "Flood_Risk_Index";
    pub const CYCLONE_EXPOSURE: &str = "Cyclone_Exposure";
    pub const AVG_TEMPERATURE: &str = "Avg_Temperature_5yr";
    pub const MAX_TEMPERATURE: &str = "Max_Temperature_Last5yr";
    pub const TEMPERATURE_STDDEV: &str = "Temperature_StdDev_5yr";
    pub const HEATWAVE_DAYS: &str = "Heatwave_Days_PerYear";
    pub const ENSO_IMPACT: &str = "ENSO_Impact_Index";
    pub const CLIMATE_VULNERABILITY: &str = "Climate_Vulnerability_Index";
    pub const NDVI_CURRENT: &str = "NDVI_2025(avg)";
    pub const NDVI_AVG_5YR: &str = "Avg_NDVI_Last5Years";
    pub const NDVI_YEARS: [&str; 5] =
        ["NDVI_2020", "NDVI_2021", "NDVI_2022", "NDVI_2023", "NDVI_2024"];

    // Derived
    pub const RAINFALL_MEAN: &str = "Rainfall_Mean";
    pub const RAINFALL_STDDEV: &str = "Rainfall_StdDev";
    pub const RAINFALL_RANGE: &str = "Rainfall_Range";
    pub const RAINFALL_TREND: &str = "Rainfall_Trend";
    pub const RAINFALL_CV: &str = "Rainfall_CV";
    pub const NDVI_STDDEV_5YR: &str = "NDVI_StdDev_5yr";
    pub const NDVI_TREND_5YR: &str = "NDVI_Trend_5yr";
    pub const FLOW_RAINFALL_RATIO: &str = "Flow_Rainfall_Ratio";
    pub const RIVER_IMPACT_SCORE: &str = "River_Impact_Score";
    pub const TEMP_ANOMALY: &str = "Temp_Anomaly";
    pub const HEAT_STRESS_INDEX: &str = "Heat_Stress_Index";
    pub const FLOOD_RISK_ADJUSTED: &str = "Flood_Risk_Adjusted";
    pub const CLIMATE_RISK_SCORE: &str = "Climate_Risk_Score";
}

/// Why a feature holds the value it holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// Supplied by the caller and coerced cleanly.
    Observed,
    /// Computed from other features.
    Derived,
    /// Substituted by the resolution policy.
    Defaulted(DefaultReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultReason {
    Missing,
    /// The caller sent a placeholder such as "unknown" instead of a value.
    Placeholder,
    Invalid,
    UnknownCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct Entry {
    value: f64,
    origin: Origin,
}

/// Canonical feature name → finite numeric value.
///
/// Categorical fields additionally keep their (resolved) label so the rule
/// tables can do substring matching while the model path sees the code.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeatureSet {
    entries: BTreeMap<String, Entry>,
    labels: BTreeMap<String, (String, Origin)>,
}

impl FeatureSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience for tests and tools: every value is treated as observed.
    pub fn from_observed<'a>(pairs: impl IntoIterator<Item = (&'a str, f64)>) -> Self {
        let mut fs = Self::new();
        for (k, v) in pairs {
            fs.insert(k, v, Origin::Observed);
        }
        fs
    }

    /// Insert a value. Non-finite values are stored as 0.0 and marked invalid.
    pub fn insert(&mut self, name: impl Into<String>, value: f64, origin: Origin) {
        let entry = if value.is_finite() {
            Entry { value, origin }
        } else {
            Entry {
                value: 0.0,
                origin: Origin::Defaulted(DefaultReason::Invalid),
            }
        };
        self.entries.insert(name.into(), entry);
    }

    pub fn insert_derived(&mut self, name: impl Into<String>, value: f64) {
        self.insert(name, value, Origin::Derived);
    }

    pub fn set_label(&mut self, name: impl Into<String>, label: impl Into<String>, origin: Origin) {
        self.labels.insert(name.into(), (label.into(), origin));
    }

    /// Value regardless of origin.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries.get(name).map(|e| e.value)
    }

    /// Value or 0.0 when absent (model alignment semantics).
    pub fn value_or_zero(&self, name: &str) -> f64 {
        self.get(name).unwrap_or(0.0)
    }

    /// Value only if it came from the caller or was derived from caller data.
    /// Rule tables use this so defaulted fields are skipped, not scored.
    pub fn observed(&self, name: &str) -> Option<f64> {
        self.entries.get(name).and_then(|e| match e.origin {
            Origin::Observed | Origin::Derived => Some(e.value),
            Origin::Defaulted(_) => None,
        })
    }

    pub fn origin(&self, name: &str) -> Option<Origin> {
        self.entries.get(name).map(|e| e.origin)
    }

    /// Resolved label, including policy substitutions.
    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels.get(name).map(|(l, _)| l.as_str())
    }

    /// Label only if the caller supplied it.
    pub fn observed_label(&self, name: &str) -> Option<&str> {
        self.labels.get(name).and_then(|(l, origin)| match origin {
            Origin::Defaulted(_) => None,
            _ => Some(l.as_str()),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Observed values for `names` in order, skipping anything not observed.
    pub fn observed_series(&self, names: &[&str]) -> Vec<f64> {
        names.iter().filter_map(|n| self.observed(n)).collect()
    }
}
