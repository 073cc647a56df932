//! # Derived statistics
//! Summary features over multi-year series (rainfall, NDVI) and the
//! engineered climate features built on top of them.
//!
//! Degenerate inputs resolve to neutral values instead of errors:
//! too few points or a constant series give a 0.0 trend, and the coefficient
//! of variation is simply undefined (`None`) below its point threshold.
//! Engineered features whose inputs are missing or whose denominator is ~0
//! are `None` here; the caller substitutes 0.0 (single request) or the batch
//! column median.

use crate::features::{names, DefaultReason, FeatureSet, Origin};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Guard for divisions by features that may be zero.
pub const EPSILON: f64 = 1e-6;

pub const DEFAULT_MIN_TREND_POINTS: usize = 2;
pub const DEFAULT_MIN_CV_POINTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeriveSettings {
    #[serde(default = "default_min_trend_points")]
    pub min_trend_points: usize,
    #[serde(default = "default_min_cv_points")]
    pub min_cv_points: usize,
}

fn default_min_trend_points() -> usize {
    DEFAULT_MIN_TREND_POINTS
}
fn default_min_cv_points() -> usize {
    DEFAULT_MIN_CV_POINTS
}

impl Default for DeriveSettings {
    fn default() -> Self {
        Self {
            min_trend_points: DEFAULT_MIN_TREND_POINTS,
            min_cv_points: DEFAULT_MIN_CV_POINTS,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SeriesStats {
    pub mean: f64,
    /// Population standard deviation.
    pub stddev: f64,
    pub range: f64,
    /// OLS slope of value vs. position.
    pub trend: f64,
    /// Number of finite points used.
    pub points: usize,
}

/// Mean, spread and trend of `series`.
///
/// Non-finite entries are gaps: they are skipped but keep their position, so
/// a missing middle year does not shift later years onto earlier x values.
pub fn derive_series_stats(series: &[f64], min_points: usize) -> SeriesStats {
    let points: Vec<(f64, f64)> = series
        .iter()
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .map(|(i, v)| (i as f64, *v))
        .collect();

    if points.is_empty() {
        return SeriesStats::default();
    }

    let values: Vec<f64> = points.iter().map(|(_, v)| *v).collect();
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });

    let trend = if points.len() < min_points.max(2) {
        0.0
    } else {
        ols_slope(&points)
    };

    SeriesStats {
        mean: mean(&values),
        stddev: population_stddev(&values),
        range: max - min,
        trend,
        points: points.len(),
    }
}

/// Rainfall variant with the default trend threshold.
pub fn derive_rainfall_stats(series: &[f64]) -> SeriesStats {
    derive_series_stats(series, DEFAULT_MIN_TREND_POINTS)
}

/// stddev / mean, defined only with at least `min_points` finite values and
/// a strictly positive mean.
pub fn coefficient_of_variation(series: &[f64], min_points: usize) -> Option<f64> {
    let values: Vec<f64> = series.iter().copied().filter(|v| v.is_finite()).collect();
    if values.len() < min_points {
        return None;
    }
    let m = mean(&values);
    if m <= 0.0 {
        return None;
    }
    Some(population_stddev(&values) / m)
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn population_stddev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// Median of the finite values, `None` when there are none.
pub fn median(values: &[f64]) -> Option<f64> {
    let mut v: Vec<f64> = values.iter().copied().filter(|x| x.is_finite()).collect();
    if v.is_empty() {
        return None;
    }
    v.sort_by(|a, b| a.total_cmp(b));
    let mid = v.len() / 2;
    Some(if v.len() % 2 == 0 {
        (v[mid - 1] + v[mid]) / 2.0
    } else {
        v[mid]
    })
}

fn ols_slope(points: &[(f64, f64)]) -> f64 {
    let first = points[0].1;
    if points.iter().all(|(_, y)| *y == first) {
        return 0.0;
    }
    let n = points.len() as f64;
    let mx = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let my = points.iter().map(|(_, y)| y).sum::<f64>() / n;
    let (mut sxy, mut sxx) = (0.0, 0.0);
    for (x, y) in points {
        sxy += (x - mx) * (y - my);
        sxx += (x - mx).powi(2);
    }
    if sxx.abs() < f64::EPSILON {
        return 0.0;
    }
    let slope = sxy / sxx;
    if slope.is_finite() {
        slope
    } else {
        0.0
    }
}

fn guarded_div(num: f64, den: f64) -> Option<f64> {
    if den.abs() < EPSILON {
        None
    } else {
        Some(num / den)
    }
}

/// Series in vocabulary order with gaps (NaN) for anything not observed.
fn series_with_gaps(fs: &FeatureSet, columns: &[&str]) -> Vec<f64> {
    columns
        .iter()
        .map(|c| fs.observed(c).unwrap_or(f64::NAN))
        .collect()
}

/// Engineered feature names, in the order they are computed.
pub const ENGINEERED: [&str; 6] = [
    names::FLOW_RAINFALL_RATIO,
    names::RIVER_IMPACT_SCORE,
    names::TEMP_ANOMALY,
    names::HEAT_STRESS_INDEX,
    names::FLOOD_RISK_ADJUSTED,
    names::CLIMATE_RISK_SCORE,
];

/// Engineered values for one row; `None` means undefined for this row.
pub type EngineeredRow = BTreeMap<&'static str, Option<f64>>;

/// Augments a normalized feature set with series-derived features.
#[derive(Debug, Clone, Copy, Default)]
pub struct Deriver {
    settings: DeriveSettings,
}

impl Deriver {
    pub fn new(settings: DeriveSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> DeriveSettings {
        self.settings
    }

    /// Rainfall / NDVI summaries. Caller-supplied aggregates are never
    /// overwritten; missing ones are filled from the per-year series.
    pub fn augment_series(&self, fs: &mut FeatureSet) {
        let rainfall = series_with_gaps(fs, &names::RAINFALL_YEARS);
        let stats = derive_series_stats(&rainfall, self.settings.min_trend_points);
        if stats.points > 0 {
            fs.insert_derived(names::RAINFALL_MEAN, stats.mean);
            fs.insert_derived(names::RAINFALL_STDDEV, stats.stddev);
            fs.insert_derived(names::RAINFALL_RANGE, stats.range);
            fs.insert_derived(names::RAINFALL_TREND, stats.trend);

            let (lo, hi) = rainfall
                .iter()
                .filter(|v| v.is_finite())
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                    (lo.min(v), hi.max(v))
                });
            fill_if_unobserved(fs, names::RAINFALL_5YR_AVG, stats.mean);
            fill_if_unobserved(fs, names::RAINFALL_STDDEV_5YR, stats.stddev);
            fill_if_unobserved(fs, names::MAX_ANNUAL_RAINFALL, hi);
            fill_if_unobserved(fs, names::MIN_ANNUAL_RAINFALL, lo);
        }
        if let Some(cv) = coefficient_of_variation(&rainfall, self.settings.min_cv_points) {
            fs.insert_derived(names::RAINFALL_CV, cv);
        }

        let ndvi = series_with_gaps(fs, &names::NDVI_YEARS);
        let ndvi_stats = derive_series_stats(&ndvi, self.settings.min_trend_points);
        if ndvi_stats.points > 0 {
            fs.insert_derived(names::NDVI_STDDEV_5YR, ndvi_stats.stddev);
            fs.insert_derived(names::NDVI_TREND_5YR, ndvi_stats.trend);
            fill_if_unobserved(fs, names::NDVI_AVG_5YR, ndvi_stats.mean);
        }
    }

    /// Compute engineered features without touching `fs`.
    pub fn engineered(&self, fs: &FeatureSet) -> EngineeredRow {
        let get = |n: &str| fs.observed(n);
        let rainfall_mean = get(names::RAINFALL_MEAN).or_else(|| get(names::RAINFALL_5YR_AVG));

        let flow_ratio = match (get(names::RIVER_FLOW_RATE), rainfall_mean) {
            (Some(flow), Some(rain)) => guarded_div(flow, rain),
            _ => None,
        };
        let river_impact = match (get(names::RIVER_FLOW_RATE), get(names::RIVER_DISTANCE)) {
            (Some(flow), Some(dist)) => guarded_div(flow, dist + 1.0),
            _ => None,
        };
        let temp_anomaly = match (get(names::MAX_TEMPERATURE), get(names::AVG_TEMPERATURE)) {
            (Some(max), Some(avg)) => Some(max - avg),
            _ => None,
        };
        let heat_stress = match (
            get(names::HEATWAVE_DAYS),
            get(names::MAX_TEMPERATURE),
            get(names::AVG_TEMPERATURE),
        ) {
            (Some(days), Some(max), Some(avg)) => guarded_div(max, avg).map(|r| days / 365.0 * r),
            _ => None,
        };
        let flood_adjusted = match (
            get(names::FLOOD_RISK_INDEX),
            get(names::MAX_ANNUAL_RAINFALL),
            rainfall_mean,
        ) {
            (Some(risk), Some(peak), Some(rain)) => guarded_div(peak, rain).map(|r| risk * r),
            _ => None,
        };
        let climate_risk = match (
            get(names::CLIMATE_VULNERABILITY),
            flood_adjusted,
            heat_stress,
            get(names::ENSO_IMPACT),
        ) {
            (Some(vuln), Some(flood), Some(heat), Some(enso)) => {
                Some(0.4 * vuln + 0.3 * flood + 0.2 * heat + 0.1 * enso.abs())
            }
            _ => None,
        };

        let mut row = EngineeredRow::new();
        row.insert(names::FLOW_RAINFALL_RATIO, flow_ratio);
        row.insert(names::RIVER_IMPACT_SCORE, river_impact);
        row.insert(names::TEMP_ANOMALY, temp_anomaly);
        row.insert(names::HEAT_STRESS_INDEX, heat_stress);
        row.insert(names::FLOOD_RISK_ADJUSTED, flood_adjusted);
        row.insert(names::CLIMATE_RISK_SCORE, climate_risk);
        row
    }

    /// Write engineered values into `fs`, replacing undefined ones via `fallback`.
    pub fn apply_engineered(
        &self,
        fs: &mut FeatureSet,
        row: &EngineeredRow,
        fallback: impl Fn(&str) -> f64,
    ) {
        for (&name, value) in row {
            match value {
                Some(v) => fs.insert_derived(name, *v),
                None => fs.insert(name, fallback(name), Origin::Defaulted(DefaultReason::Missing)),
            }
        }
    }

    /// Single-request path: series summaries + engineered features, 0.0 fallback.
    pub fn augment(&self, fs: &mut FeatureSet) {
        self.augment_series(fs);
        let row = self.engineered(fs);
        self.apply_engineered(fs, &row, |_| 0.0);
    }
}

fn fill_if_unobserved(fs: &mut FeatureSet, name: &str, value: f64) {
    if fs.observed(name).is_none() && value.is_finite() {
        fs.insert_derived(name, value);
    }
}

/// Column medians of engineered features across a batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchMedians {
    medians: BTreeMap<String, f64>,
}

impl BatchMedians {
    pub fn from_rows(rows: &[EngineeredRow]) -> Self {
        let mut medians = BTreeMap::new();
        for name in ENGINEERED {
            let column: Vec<f64> = rows
                .iter()
                .filter_map(|r| r.get(name).copied().flatten())
                .collect();
            if let Some(m) = median(&column) {
                medians.insert(name.to_string(), m);
            }
        }
        Self { medians }
    }

    /// Median for `name`, or 0.0 when no row had a defined value.
    pub fn get(&self, name: &str) -> f64 {
        self.medians.get(name).copied().unwrap_or(0.0)
    }
}
