//! # Suitability Engine
//! Raw attributes → normalized features → derived features → per-dimension
//! scores → combined assessment.
//!
//! Two entry points per site:
//! - `score_site`: rule tables only.
//! - `predict_site`: model bundle per dimension, falling back to the rule
//!   tables for any dimension whose bundle is absent or fails. Each fallback
//!   adds a warning; one dimension failing never blocks the other.
//!
//! Batch variants treat rows independently except for engineered features,
//! where undefined values take the batch column median.

use crate::attributes::RawAttributes;
use crate::category::Category;
use crate::combine::{round1, Dimension, ScoreSource, ScoreSources, SiteAssessment};
use crate::config::{Mode, ScoringConfig};
use crate::features::FeatureSet;
use crate::metrics::{
    ensure_metrics_described, BATCH_ROW_MS, MODEL_PREDICTIONS, PREDICTION_FALLBACKS, SITES_SCORED,
};
use crate::model::{ModelRegistry, PredictError};
use crate::normalize::Normalizer;
use crate::stats::{BatchMedians, Deriver};
use crate::strategy::{rule_strategy, ModelBacked, ScoringStrategy};
use metrics::{counter, histogram};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

pub struct SuitabilityEngine {
    normalizer: Normalizer,
    deriver: Deriver,
    rules: Arc<dyn ScoringStrategy>,
    model: ModelBacked,
}

impl SuitabilityEngine {
    /// Engine over an already-loaded registry.
    pub fn new(config: &ScoringConfig, registry: ModelRegistry) -> Self {
        ensure_metrics_described();
        let normalizer = Normalizer::new(config.policy());
        Self {
            deriver: Deriver::new(config.derive),
            rules: rule_strategy(config.scoring.rules, config.derive.min_cv_points),
            model: ModelBacked::new(registry, normalizer.clone()),
            normalizer,
        }
    }

    /// Load the configured bundles, then build the engine.
    pub fn from_config(config: &ScoringConfig) -> Self {
        Self::new(config, ModelRegistry::load(&config.models))
    }

    pub fn rule_strategy(&self) -> &dyn ScoringStrategy {
        self.rules.as_ref()
    }

    pub fn registry(&self) -> &ModelRegistry {
        self.model.registry()
    }

    /// Normalize and derive features for a single request (0.0 fallback for
    /// undefined engineered features).
    pub fn prepare(&self, raw: &RawAttributes) -> FeatureSet {
        let mut fs = self.normalizer.normalize_all(raw);
        self.deriver.augment(&mut fs);
        fs
    }

    /// Normalize and derive features for a batch. Undefined engineered values
    /// take the column median over rows where they are defined.
    pub fn prepare_batch(&self, rows: &[RawAttributes]) -> Vec<FeatureSet> {
        let mut sets: Vec<FeatureSet> = rows
            .iter()
            .map(|raw| {
                let mut fs = self.normalizer.normalize_all(raw);
                self.deriver.augment_series(&mut fs);
                fs
            })
            .collect();
        let engineered: Vec<_> = sets.iter().map(|fs| self.deriver.engineered(fs)).collect();
        let medians = BatchMedians::from_rows(&engineered);
        for (fs, row) in sets.iter_mut().zip(&engineered) {
            self.deriver.apply_engineered(fs, row, |name| medians.get(name));
        }
        sets
    }

    pub fn score_site(&self, raw: &RawAttributes) -> SiteAssessment {
        self.score_features(&self.prepare(raw))
    }

    pub fn predict_site(&self, raw: &RawAttributes) -> SiteAssessment {
        self.predict_features(&self.prepare(raw))
    }

    /// Rule-table assessment of prepared features.
    pub fn score_features(&self, fs: &FeatureSet) -> SiteAssessment {
        counter!(SITES_SCORED, "mode" => Mode::Rules.as_str()).increment(1);
        let geo = self.rule_score(Dimension::Geological, fs);
        let clim = self.rule_score(Dimension::Climatic, fs);
        let source = self.rules.source();
        SiteAssessment::from_scores(
            geo,
            clim,
            ScoreSources {
                geological: source,
                climatic: source,
            },
            Vec::new(),
        )
    }

    /// Model-first assessment of prepared features.
    pub fn predict_features(&self, fs: &FeatureSet) -> SiteAssessment {
        counter!(SITES_SCORED, "mode" => Mode::Predict.as_str()).increment(1);
        let mut warnings = Vec::new();
        let (geo, geo_src) = self.predict_dimension(Dimension::Geological, fs, &mut warnings);
        let (clim, clim_src) = self.predict_dimension(Dimension::Climatic, fs, &mut warnings);
        SiteAssessment::from_scores(
            geo,
            clim,
            ScoreSources {
                geological: geo_src,
                climatic: clim_src,
            },
            warnings,
        )
    }

    pub fn score_batch(&self, rows: &[RawAttributes]) -> Vec<SiteAssessment> {
        self.run_batch(Mode::Rules, rows)
    }

    pub fn predict_batch(&self, rows: &[RawAttributes]) -> Vec<SiteAssessment> {
        self.run_batch(Mode::Predict, rows)
    }

    pub fn run(&self, mode: Mode, raw: &RawAttributes) -> SiteAssessment {
        match mode {
            Mode::Rules => self.score_site(raw),
            Mode::Predict => self.predict_site(raw),
        }
    }

    pub fn run_batch(&self, mode: Mode, rows: &[RawAttributes]) -> Vec<SiteAssessment> {
        self.prepare_batch(rows)
            .iter()
            .map(|fs| {
                let t0 = Instant::now();
                let out = match mode {
                    Mode::Rules => self.score_features(fs),
                    Mode::Predict => self.predict_features(fs),
                };
                histogram!(BATCH_ROW_MS).record(t0.elapsed().as_secs_f64() * 1000.0);
                out
            })
            .collect()
    }

    fn rule_score(&self, dim: Dimension, fs: &FeatureSet) -> f64 {
        match self.rules.score(dim, fs) {
            Ok(score) => score,
            Err(e) => {
                warn!(
                    dimension = %dim,
                    strategy = self.rules.name(),
                    error = %e,
                    "rule strategy failed, scoring 0"
                );
                0.0
            }
        }
    }

    fn predict_dimension(
        &self,
        dim: Dimension,
        fs: &FeatureSet,
        warnings: &mut Vec<String>,
    ) -> (f64, ScoreSource) {
        match self.model.score(dim, fs) {
            Ok(score) => {
                counter!(MODEL_PREDICTIONS, "dimension" => dim.as_str()).increment(1);
                (score, ScoreSource::Model)
            }
            Err(e) => {
                counter!(PREDICTION_FALLBACKS, "dimension" => dim.as_str()).increment(1);
                let msg = fallback_warning(dim, &e, self.rules.name());
                warn!(dimension = %dim, error = %e, "falling back to rule tables");
                warnings.push(msg);
                (self.rule_score(dim, fs), self.rules.source())
            }
        }
    }
}

fn fallback_warning(dim: Dimension, err: &PredictError, rules: &str) -> String {
    match err {
        PredictError::Unavailable { .. } => {
            format!("{dim} model unavailable; used {rules} scoring")
        }
        other => format!("{dim} model failed ({other}); used {rules} scoring"),
    }
}

/// Aggregate view over one dimension of a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionSummary {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub categories: BTreeMap<Category, usize>,
}

impl DimensionSummary {
    fn from_scores(scores: impl Iterator<Item = (f64, Category)>) -> Option<Self> {
        let mut n = 0usize;
        let (mut sum, mut min, mut max) = (0.0, f64::INFINITY, f64::NEG_INFINITY);
        let mut categories = BTreeMap::new();
        for (s, c) in scores {
            n += 1;
            sum += s;
            min = min.min(s);
            max = max.max(s);
            *categories.entry(c).or_insert(0) += 1;
        }
        (n > 0).then(|| Self {
            mean: round1(sum / n as f64),
            min,
            max,
            categories,
        })
    }
}

/// Catalogue-level statistics after a batch run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub sites: usize,
    pub fallbacks: usize,
    pub geological: Option<DimensionSummary>,
    pub climatic: Option<DimensionSummary>,
    pub overall: Option<DimensionSummary>,
}

impl BatchSummary {
    pub fn from_assessments(items: &[SiteAssessment]) -> Self {
        let pick = |dim: Option<Dimension>| {
            DimensionSummary::from_scores(items.iter().map(move |a| {
                let r = match dim {
                    Some(d) => a.score(d),
                    None => &a.overall,
                };
                (r.score, r.category)
            }))
        };
        Self {
            sites: items.len(),
            fallbacks: items.iter().map(|a| a.warnings.len()).sum(),
            geological: pick(Some(Dimension::Geological)),
            climatic: pick(Some(Dimension::Climatic)),
            overall: pick(None),
        }
    }
}

/// Indices of the `n` best sites by overall score, best first. Ties keep
/// input order.
pub fn top_n(items: &[SiteAssessment], n: usize) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..items.len()).collect();
    idx.sort_by(|&a, &b| items[b].overall.score.total_cmp(&items[a].overall.score));
    idx.truncate(n);
    idx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::names;

    fn engine() -> SuitabilityEngine {
        SuitabilityEngine::new(&ScoringConfig::default(), ModelRegistry::empty())
    }

    fn documented_site() -> RawAttributes {
        RawAttributes::new()
            .with("seismic_zone", 2.0)
            .with("main_soil_type", "Vertisols")
            .with("elevation", 120.0)
            .with("slope", 1.5)
            .with("max_height", 20.0)
    }

    struct Broken;

    impl ScoringStrategy for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn source(&self) -> ScoreSource {
            ScoreSource::RuleBasedV2
        }

        fn score(&self, _: Dimension, _: &FeatureSet) -> Result<f64, PredictError> {
            Err(PredictError::NonFiniteOutput)
        }
    }

    #[test]
    fn failing_rule_strategy_scores_zero_without_aborting() {
        let mut e = engine();
        e.rules = Arc::new(Broken);
        let a = e.score_site(&documented_site());
        assert_eq!(a.geological.score, 0.0);
        assert_eq!(a.climatic.score, 0.0);
        assert_eq!(a.overall.category, Category::Poor);

        let p = e.predict_site(&documented_site());
        assert_eq!(p.geological.score, 0.0);
        assert_eq!(p.warnings.len(), 2);
        assert!(p.warnings[0].ends_with("used broken scoring"));
    }

    #[test]
    fn score_site_uses_rule_tables() {
        let a = engine().score_site(&documented_site());
        assert_eq!(a.geological.score, 80.0);
        assert_eq!(a.geological.category, Category::Excellent);
        assert_eq!(a.sources.geological, ScoreSource::RuleBasedV2);
        assert!(a.warnings.is_empty());
    }

    #[test]
    fn predict_without_bundles_warns_per_dimension() {
        let a = engine().predict_site(&documented_site());
        assert_eq!(a.geological.score, 80.0);
        assert_eq!(a.warnings.len(), 2);
        assert!(a.warnings[0].starts_with("geological model unavailable"));
        assert!(a.warnings[1].starts_with("climatic model unavailable"));
    }

    #[test]
    fn prepare_fills_engineered_features() {
        let fs = engine().prepare(&RawAttributes::new());
        assert_eq!(fs.get(names::CLIMATE_RISK_SCORE), Some(0.0));
        assert_eq!(fs.observed(names::CLIMATE_RISK_SCORE), None);
    }

    #[test]
    fn top_n_orders_by_overall() {
        let mk = |g: f64| {
            SiteAssessment::from_scores(
                g,
                g,
                ScoreSources {
                    geological: ScoreSource::Model,
                    climatic: ScoreSource::Model,
                },
                Vec::new(),
            )
        };
        let items = vec![mk(40.0), mk(90.0), mk(65.0), mk(90.0)];
        assert_eq!(top_n(&items, 3), vec![1, 3, 2]);
        let s = BatchSummary::from_assessments(&items);
        let overall = s.overall.unwrap();
        assert_eq!(overall.max, 90.0);
        assert_eq!(overall.categories[&Category::Excellent], 2);
        assert_eq!(s.sites, 4);
    }
}
