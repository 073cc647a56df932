// tests/predict_fallback.rs
use approx::assert_abs_diff_eq;
use dam_suitability::model::{predict, Regressor, StandardScaler};
use dam_suitability::{
    names, Category, Dimension, FeatureSet, ModelBundle, ModelRegistry, PredictError,
    RawAttributes, ScoreSource, ScoringConfig, SuitabilityEngine,
};
use std::path::Path;

fn geo_bundle() -> ModelBundle {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("models/geological.json");
    ModelBundle::load_from_file(&path).unwrap()
}

fn documented_site() -> RawAttributes {
    RawAttributes::new()
        .with("seismic_zone", 2)
        .with("main_soil_type", "Vertisols")
        .with("elevation", 120)
        .with("slope", 1.5)
        .with("max_height", 20)
}

fn engine(registry: ModelRegistry) -> SuitabilityEngine {
    SuitabilityEngine::new(&ScoringConfig::default(), registry)
}

#[test]
fn no_bundles_means_full_rule_result_with_warnings() {
    let a = engine(ModelRegistry::empty()).predict_site(&documented_site());
    assert_eq!(a.geological.score, 80.0);
    assert_eq!(a.sources.geological, ScoreSource::RuleBasedV2);
    assert_eq!(a.sources.climatic, ScoreSource::RuleBasedV2);
    assert!(a.warnings.iter().any(|w| w.contains("geological")));
    assert!(a.warnings.iter().any(|w| w.contains("climatic")));
}

#[test]
fn geological_model_is_used_and_climate_falls_back() {
    let e = engine(ModelRegistry::empty().with_bundle(geo_bundle()));
    let a = e.predict_site(&documented_site());

    // tree 1: zone 2 → left, slope 1.5 → left → 78; tree 2: elevation,
    // height both left → 74. Mean 76.
    assert_eq!(a.geological.score, 76.0);
    assert_eq!(a.geological.category, Category::Good);
    assert_eq!(a.sources.geological, ScoreSource::Model);
    assert_eq!(a.sources.climatic, ScoreSource::RuleBasedV2);
    assert_eq!(a.warnings.len(), 1);
    assert!(a.warnings[0].starts_with("climatic model unavailable"));
    // 0.6 * 76 + 0.4 * 0
    assert_eq!(a.overall.score, 45.6);
}

#[test]
fn failing_bundle_falls_back_without_blocking_the_other_dimension() {
    let foreign = ModelBundle {
        id: "clim-foreign".into(),
        dimension: Dimension::Climatic,
        feature_names: vec!["Some_Other_Column".into()],
        scaler: None,
        encoders: Default::default(),
        model: Regressor::Linear {
            intercept: 0.0,
            coefficients: vec![1.0],
        },
    };
    let reg = ModelRegistry::empty()
        .with_bundle(geo_bundle())
        .with_bundle(foreign);
    let raw = documented_site().with("rainfall5YearAvg", 1000);
    let a = engine(reg).predict_site(&raw);

    assert_eq!(a.sources.geological, ScoreSource::Model);
    assert_eq!(a.sources.climatic, ScoreSource::RuleBasedV2);
    assert_eq!(a.climatic.score, 25.0);
    assert_eq!(a.warnings.len(), 1);
    assert!(a.warnings[0].starts_with("climatic model failed"));
}

#[test]
fn predictor_scales_with_fitted_parameters_and_clamps() {
    let bundle = ModelBundle {
        id: "lin".into(),
        dimension: Dimension::Climatic,
        feature_names: vec![names::RAINFALL_5YR_AVG.into(), names::MONSOON_INTENSITY.into()],
        scaler: Some(StandardScaler {
            mean: vec![1000.0, 15.0],
            scale: vec![200.0, 5.0],
        }),
        encoders: Default::default(),
        model: Regressor::Linear {
            intercept: 60.0,
            coefficients: vec![10.0, -4.0],
        },
    };
    bundle.validate().unwrap();

    let fs = FeatureSet::from_observed([
        (names::RAINFALL_5YR_AVG, 1100.0),
        (names::MONSOON_INTENSITY, 25.0),
        ("Unrelated", 5.0),
    ]);
    // 60 + 10*0.5 - 4*2
    assert_abs_diff_eq!(predict(&fs, &bundle).unwrap(), 57.0, epsilon = 1e-9);

    let wet = FeatureSet::from_observed([(names::RAINFALL_5YR_AVG, 9000.0)]);
    assert_eq!(predict(&wet, &bundle).unwrap(), 100.0);
}

#[test]
fn scaler_mismatch_is_reported() {
    let mut bundle = geo_bundle();
    if let Some(s) = bundle.scaler.as_mut() {
        s.mean.pop();
    }
    let fs = FeatureSet::from_observed([(names::ELEVATION, 100.0)]);
    let err = predict(&fs, &bundle).unwrap_err();
    assert!(matches!(err, PredictError::ScalerMismatch { row: 7, scaler: 6 }));
    assert_eq!(err.to_string(), "scaler expects 6 columns, row has 7");
}

#[test]
fn unseen_soil_does_not_break_prediction() {
    let e = engine(ModelRegistry::empty().with_bundle(geo_bundle()));
    let a = e.predict_site(&documented_site().with("main_soil_type", "Podzols"));
    let b = e.predict_site(&documented_site().with("main_soil_type", "Podzols"));
    assert_eq!(a.sources.geological, ScoreSource::Model);
    assert_eq!(a, b);
}

#[test]
fn model_category_follows_the_unrounded_score() {
    let bundle = ModelBundle {
        id: "geo-edge".into(),
        dimension: Dimension::Geological,
        feature_names: vec![names::ELEVATION.into()],
        scaler: None,
        encoders: Default::default(),
        model: Regressor::Linear {
            intercept: 79.996,
            coefficients: vec![0.0],
        },
    };
    let a = engine(ModelRegistry::empty().with_bundle(bundle))
        .predict_site(&RawAttributes::new().with("elevation", 100));

    assert_eq!(a.sources.geological, ScoreSource::Model);
    // displayed at two decimals, categorized before rounding
    assert_eq!(a.geological.score, 80.0);
    assert_eq!(a.geological.category, Category::Good);
}
